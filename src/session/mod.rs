mod world;

pub use world::SessionWorld;

use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError};
use rendering::animation::FrameMode;
use rendering::scene::{CharacterId, MapEvent, TemplateProvider};
use rendering::{DisplaySettings, MapDisplayManager, RenderBatch, WorldView};
use tracing::{debug, info};

use crate::events::{ActionQueue, ClientAction, WorldUpdate};
use crate::settings::Settings;

/// Channel end the game loop reads world updates from.
pub type WorldUpdateRx = Receiver<WorldUpdate>;

/// A connected client: the map display fed by a stream of world updates.
pub struct Session {
    display: MapDisplayManager,
    world: SessionWorld,
    updates: WorldUpdateRx,
    connected: bool,
    player: Option<CharacterId>,
    walk_duration: u32,
    actions: Vec<ClientAction>,
    frames: u64,
    applied: u64,
}

impl Session {
    pub fn new(
        settings: &Settings,
        templates: Arc<dyn TemplateProvider + Send + Sync>,
        updates: WorldUpdateRx,
    ) -> Self {
        Self {
            display: MapDisplayManager::new(DisplaySettings::from(&settings.graphics), templates),
            world: SessionWorld::default(),
            updates,
            connected: true,
            player: None,
            walk_duration: settings.session.walk_duration_ms,
            actions: Vec::new(),
            frames: 0,
            applied: 0,
        }
    }

    pub fn display(&self) -> &MapDisplayManager {
        &self.display
    }

    pub fn world(&self) -> &SessionWorld {
        &self.world
    }

    pub fn player(&self) -> Option<CharacterId> {
        self.player
    }

    /// Whether the sending side of the update channel is still alive.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Updates applied since the session started.
    pub fn applied_updates(&self) -> u64 {
        self.applied
    }

    /// Drains pending world updates, then advances the display by `delta`
    /// milliseconds. Returns the number of updates applied.
    pub fn frame(&mut self, delta: u32) -> usize {
        let mut applied = 0;
        loop {
            match self.updates.try_recv() {
                Ok(update) => {
                    if self.apply(update) {
                        applied += 1;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.connected {
                        info!("World update channel closed");
                        self.connected = false;
                    }
                    break;
                }
            }
        }
        self.display.update(delta, &self.world);
        self.frames += 1;
        self.applied += applied as u64;
        applied
    }

    pub fn render(&self) -> RenderBatch {
        self.display.render()
    }

    /// Offers a pointer event to the map. Actions it triggers are kept until
    /// [`Session::take_actions`]; walking onto obstructed tiles is dropped.
    pub fn handle_input(&mut self, event: MapEvent, delta: u32) -> bool {
        let mut queue = ActionQueue::default();
        let handled = self.display.handle_event(event, delta, &mut queue);
        let world = &self.world;
        queue.0.retain(|action| match action {
            ClientAction::Walk(location) => !world.is_obstructed(*location),
            _ => true,
        });
        self.actions.append(&mut queue.0);
        handled
    }

    pub fn take_actions(&mut self) -> Vec<ClientAction> {
        std::mem::take(&mut self.actions)
    }

    /// Applies one update right away. Returns whether it changed anything.
    pub fn apply(&mut self, update: WorldUpdate) -> bool {
        let display = &mut self.display;
        let applied = match &update {
            WorldUpdate::ClearMap => {
                display.clear();
                self.world.clear_map();
                true
            }
            WorldUpdate::Tile { location, tile } => display.set_tile(*location, *tile),
            WorldUpdate::RemoveTile(location) => display.remove_tile(*location),
            WorldUpdate::Light { location, color } => {
                self.world.set_light(*location, *color);
                true
            }
            WorldUpdate::AmbientLight(color) => {
                self.world.set_ambient_light(*color);
                true
            }
            WorldUpdate::Obstruction {
                location,
                obstructed,
            } => {
                self.world.set_obstructed(*location, *obstructed);
                true
            }
            WorldUpdate::Fog(fog) => {
                self.world.set_fog(*fog);
                true
            }
            WorldUpdate::PushItem {
                location,
                item,
                count,
            } => display.push_item(*location, *item, *count).is_some(),
            WorldUpdate::InsertItem {
                location,
                index,
                item,
                count,
            } => display.insert_item(*location, *index, *item, *count),
            WorldUpdate::RemoveItem { location, index } => {
                display.remove_item(*location, *index).is_some()
            }
            WorldUpdate::ClearItems(location) => display.clear_items(*location) > 0,
            WorldUpdate::ShowCharacter {
                character,
                appearance,
                direction,
                location,
                name,
            } => {
                let shown = display.add_avatar(*character, *appearance, *direction, *location);
                if shown && name.is_some() {
                    display.set_avatar_name(*character, name.clone());
                }
                if shown && self.player == Some(*character) {
                    self.world.set_player_location(Some(*location));
                }
                shown
            }
            WorldUpdate::RemoveCharacter(character) => display.remove_avatar(*character),
            WorldUpdate::Walk {
                character,
                location,
            } => {
                let moved = display.move_avatar(*character, *location, self.walk_duration);
                if moved && self.player == Some(*character) {
                    self.world.set_player_location(Some(*location));
                }
                moved
            }
            WorldUpdate::Turn {
                character,
                direction,
            } => display.turn_avatar(*character, *direction),
            WorldUpdate::Animate {
                character,
                duration,
            } => display.animate_avatar(*character, *duration, FrameMode::ONCE),
            WorldUpdate::Cloth {
                character,
                group,
                item,
            } => display.set_avatar_cloth(*character, *group, *item),
            WorldUpdate::ClothColor {
                character,
                group,
                color,
            } => display.set_avatar_cloth_color(*character, *group, *color),
            WorldUpdate::Attack { character, state } => {
                display.set_attack_marker(*character, *state)
            }
            WorldUpdate::Effect { location, effect } => {
                display.show_effect(*location, *effect).is_some()
            }
            WorldUpdate::QuestMarker { location, kind } => {
                display.set_quest_marker(*location, *kind)
            }
            WorldUpdate::Player(character) => {
                self.player = Some(*character);
                display.set_player(Some(*character));
                let location = display.avatar(*character).map(|avatar| avatar.location());
                self.world.set_player_location(location);
                true
            }
            WorldUpdate::HitPoints(hit_points) => {
                self.world.set_hit_points(*hit_points);
                true
            }
        };
        if !applied {
            debug!(?update, "World update had no effect");
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use rendering::MapLocation;
    use rendering::scene::{Direction, TileId};

    fn session() -> (Session, crossbeam_channel::Sender<WorldUpdate>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let templates = Arc::new(demo::demo_templates().unwrap());
        (Session::new(&Settings::default(), templates, rx), tx)
    }

    #[test]
    fn frame_drains_pending_updates() {
        let (mut session, tx) = session();
        let location = MapLocation::new(2, 3, 0);
        tx.send(WorldUpdate::Tile {
            location,
            tile: TileId::compose(demo::GRASS, 0, 0),
        })
        .unwrap();
        tx.send(WorldUpdate::RemoveTile(MapLocation::new(9, 9, 0)))
            .unwrap();

        assert_eq!(session.frame(16), 1);
        assert!(session.display().tile_at(location).is_some());
        assert_eq!(session.frame(16), 0);
        assert_eq!(session.frame_count(), 2);
        assert_eq!(session.applied_updates(), 1);
        assert!(session.is_connected());

        drop(tx);
        session.frame(16);
        assert!(!session.is_connected());
    }

    #[test]
    fn player_location_follows_walks() {
        let (mut session, _tx) = session();
        let hero = CharacterId(1);
        session.apply(WorldUpdate::ShowCharacter {
            character: hero,
            appearance: demo::HUMAN,
            direction: Direction::South,
            location: MapLocation::new(4, 4, 0),
            name: Some("Hero".into()),
        });
        assert!(session.apply(WorldUpdate::Player(hero)));
        assert_eq!(
            rendering::WorldView::player_location(session.world()),
            Some(MapLocation::new(4, 4, 0))
        );

        assert!(session.apply(WorldUpdate::Walk {
            character: hero,
            location: MapLocation::new(5, 4, 0),
        }));
        assert_eq!(
            rendering::WorldView::player_location(session.world()),
            Some(MapLocation::new(5, 4, 0))
        );
        assert_eq!(
            session.display().avatar(hero).map(|avatar| avatar.direction()),
            Some(Direction::East)
        );
    }

    #[test]
    fn unknown_characters_are_ignored() {
        let (mut session, _tx) = session();
        assert!(!session.apply(WorldUpdate::Turn {
            character: CharacterId(42),
            direction: Direction::North,
        }));
        assert!(session.take_actions().is_empty());
    }
}
