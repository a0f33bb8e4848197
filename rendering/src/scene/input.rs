use super::players::types::CharacterId;
use crate::geometry::MapLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer input on the map. Positions are in screen pixels when handed to the
/// display manager and in display coordinates once offered to entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEvent {
    Click { x: i32, y: i32, button: MouseButton },
    DoubleClick { x: i32, y: i32, button: MouseButton },
    PointAt { x: i32, y: i32 },
    DragStart { x: i32, y: i32, button: MouseButton },
}

impl MapEvent {
    pub fn position(&self) -> (i32, i32) {
        match *self {
            MapEvent::Click { x, y, .. }
            | MapEvent::DoubleClick { x, y, .. }
            | MapEvent::PointAt { x, y }
            | MapEvent::DragStart { x, y, .. } => (x, y),
        }
    }

    pub fn with_position(self, x: i32, y: i32) -> Self {
        match self {
            MapEvent::Click { button, .. } => MapEvent::Click { x, y, button },
            MapEvent::DoubleClick { button, .. } => MapEvent::DoubleClick { x, y, button },
            MapEvent::PointAt { .. } => MapEvent::PointAt { x, y },
            MapEvent::DragStart { button, .. } => MapEvent::DragStart { x, y, button },
        }
    }
}

/// What the pointer currently rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTarget {
    Tile(MapLocation),
    Item { location: MapLocation, index: usize },
    Character(CharacterId),
}

/// Game actions triggered by interacting with the map. Every action defaults
/// to doing nothing.
pub trait InteractionHandler {
    fn walk_to(&mut self, _location: MapLocation) {}
    fn use_tile(&mut self, _location: MapLocation) {}
    fn look_at_tile(&mut self, _location: MapLocation) {}
    fn look_at_item(&mut self, _location: MapLocation, _index: usize) {}
    fn use_item(&mut self, _location: MapLocation, _index: usize) {}
    fn drag_item(&mut self, _location: MapLocation, _index: usize) {}
    fn look_at_character(&mut self, _character: CharacterId) {}
    fn attack_character(&mut self, _character: CharacterId) {}
    fn point_at(&mut self, _target: HoverTarget) {}
}
