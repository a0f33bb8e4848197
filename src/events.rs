use rendering::scene::{
    AttackState, AvatarClothGroup, CharacterId, Direction, HoverTarget, InteractionHandler,
    QuestMarkerKind, TileId,
};
use rendering::{Color, MapLocation};

// === World Updates ===

/// Change of the visible world, sent from the network thread to the game loop.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldUpdate {
    /// Drops everything on the map, e.g. when changing maps.
    ClearMap,
    Tile {
        location: MapLocation,
        tile: TileId,
    },
    RemoveTile(MapLocation),
    Light {
        location: MapLocation,
        color: Color,
    },
    AmbientLight(Color),
    Obstruction {
        location: MapLocation,
        obstructed: bool,
    },
    Fog(f32),

    PushItem {
        location: MapLocation,
        item: u32,
        count: u32,
    },
    InsertItem {
        location: MapLocation,
        index: usize,
        item: u32,
        count: u32,
    },
    RemoveItem {
        location: MapLocation,
        index: usize,
    },
    ClearItems(MapLocation),

    ShowCharacter {
        character: CharacterId,
        appearance: u32,
        direction: Direction,
        location: MapLocation,
        name: Option<String>,
    },
    RemoveCharacter(CharacterId),
    Walk {
        character: CharacterId,
        location: MapLocation,
    },
    Turn {
        character: CharacterId,
        direction: Direction,
    },
    /// Plays the body animation once, e.g. a swing.
    Animate {
        character: CharacterId,
        duration: u32,
    },
    Cloth {
        character: CharacterId,
        group: AvatarClothGroup,
        item: Option<u32>,
    },
    ClothColor {
        character: CharacterId,
        group: AvatarClothGroup,
        color: Option<Color>,
    },
    Attack {
        character: CharacterId,
        state: AttackState,
    },

    Effect {
        location: MapLocation,
        effect: u32,
    },
    QuestMarker {
        location: MapLocation,
        kind: Option<QuestMarkerKind>,
    },

    /// The character controlled by this client.
    Player(CharacterId),
    HitPoints(u32),
}

// === Client Actions ===

/// Request produced by map interaction, to be sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAction {
    Walk(MapLocation),
    UseTile(MapLocation),
    LookAtTile(MapLocation),
    LookAtItem { location: MapLocation, index: usize },
    UseItem { location: MapLocation, index: usize },
    DragItem { location: MapLocation, index: usize },
    LookAtCharacter(CharacterId),
    Attack(CharacterId),
    Hover(HoverTarget),
}

/// Collects the actions triggered while handling one input event.
#[derive(Debug, Default)]
pub struct ActionQueue(pub Vec<ClientAction>);

impl InteractionHandler for ActionQueue {
    fn walk_to(&mut self, location: MapLocation) {
        self.0.push(ClientAction::Walk(location));
    }

    fn use_tile(&mut self, location: MapLocation) {
        self.0.push(ClientAction::UseTile(location));
    }

    fn look_at_tile(&mut self, location: MapLocation) {
        self.0.push(ClientAction::LookAtTile(location));
    }

    fn look_at_item(&mut self, location: MapLocation, index: usize) {
        self.0.push(ClientAction::LookAtItem { location, index });
    }

    fn use_item(&mut self, location: MapLocation, index: usize) {
        self.0.push(ClientAction::UseItem { location, index });
    }

    fn drag_item(&mut self, location: MapLocation, index: usize) {
        self.0.push(ClientAction::DragItem { location, index });
    }

    fn look_at_character(&mut self, character: CharacterId) {
        self.0.push(ClientAction::LookAtCharacter(character));
    }

    fn attack_character(&mut self, character: CharacterId) {
        self.0.push(ClientAction::Attack(character));
    }

    fn point_at(&mut self, target: HoverTarget) {
        self.0.push(ClientAction::Hover(target));
    }
}
