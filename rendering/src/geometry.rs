use crate::scene::constants::{
    LAYER_LEVEL_DISTANCE, LAYER_ROW_DISTANCE, LEVEL_HEIGHT, TILE_HEIGHT_HALF, TILE_WIDTH_HALF,
};

/// Tile position on the game map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct MapLocation {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl MapLocation {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z)
    }

    /// Base layer of the row this location sits on, before any per-kind offset.
    pub const fn layer(&self) -> i32 {
        -((self.x + self.y) * LAYER_ROW_DISTANCE + self.z * LAYER_LEVEL_DISTANCE)
    }

    pub const fn display_coordinate(&self) -> DisplayCoordinate {
        DisplayCoordinate {
            x: (self.x - self.y) * TILE_WIDTH_HALF,
            y: (self.x + self.y) * TILE_HEIGHT_HALF - self.z * LEVEL_HEIGHT,
            layer: self.layer(),
        }
    }

    /// Display coordinate of this location with `offset` added to the row layer.
    pub const fn display_coordinate_on_layer(&self, offset: i32) -> DisplayCoordinate {
        let base = self.display_coordinate();
        DisplayCoordinate {
            layer: base.layer + offset,
            ..base
        }
    }
}

/// Position in display space. `layer` orders drawing; lower values are nearer
/// to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DisplayCoordinate {
    pub x: i32,
    pub y: i32,
    pub layer: i32,
}

impl DisplayCoordinate {
    pub const fn new(x: i32, y: i32, layer: i32) -> Self {
        Self { x, y, layer }
    }

    pub const fn translated(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.layer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub const EMPTY: Rectangle = Rectangle::new(0, 0, 0, 0);

    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        !self.is_empty() && x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn intersects(&self, other: &Rectangle) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Smallest rectangle covering both. Empty rectangles do not contribute.
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rectangle::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    /// Moves every edge `amount` pixels inwards. Never produces a negative size.
    pub fn shrink(&self, amount: i32) -> Rectangle {
        Rectangle::new(
            self.x + amount,
            self.y + amount,
            (self.width - 2 * amount).max(0),
            (self.height - 2 * amount).max(0),
        )
    }

    pub const fn translate(&self, dx: i32, dy: i32) -> Rectangle {
        Rectangle::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}
