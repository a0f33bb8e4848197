mod overlay;
mod tile;

pub use overlay::Overlay;
pub use tile::Tile;

use crate::color::Color;
use crate::geometry::MapLocation;

/// Packed tile description as sent by the server.
///
/// Bits 0-9 hold the base tile, bits 10-19 the overlay and bits 20-25 the
/// overlay shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileId(pub u32);

impl TileId {
    const BASE_MASK: u32 = 0x3ff;
    const OVERLAY_SHIFT: u32 = 10;
    const SHAPE_SHIFT: u32 = 20;
    const SHAPE_MASK: u32 = 0x3f;

    pub fn compose(base: u32, overlay: u32, shape: u32) -> Self {
        TileId(
            (base & Self::BASE_MASK)
                | ((overlay & Self::BASE_MASK) << Self::OVERLAY_SHIFT)
                | ((shape & Self::SHAPE_MASK) << Self::SHAPE_SHIFT),
        )
    }

    pub fn base(self) -> u32 {
        self.0 & Self::BASE_MASK
    }

    pub fn overlay(self) -> u32 {
        (self.0 >> Self::OVERLAY_SHIFT) & Self::BASE_MASK
    }

    pub fn shape(self) -> u32 {
        (self.0 >> Self::SHAPE_SHIFT) & Self::SHAPE_MASK
    }

    pub fn has_overlay(self) -> bool {
        self.overlay() != 0 && self.shape() != 0
    }
}

/// Tiles sharing each corner of a tile: top, right, bottom, left.
const CORNER_NEIGHBOURS: [[(i32, i32); 4]; 4] = [
    [(0, 0), (-1, 0), (0, -1), (-1, -1)],
    [(0, 0), (1, 0), (0, -1), (1, -1)],
    [(0, 0), (1, 0), (0, 1), (1, 1)],
    [(0, 0), (-1, 0), (0, 1), (-1, 1)],
];

/// Light of each tile corner, averaged over the tiles touching it.
pub fn corner_lights(location: MapLocation, light_at: impl Fn(MapLocation) -> Color) -> [Color; 4] {
    CORNER_NEIGHBOURS.map(|offsets| {
        let samples = offsets.map(|(dx, dy)| light_at(location.offset(dx, dy)));
        Color::average(&samples)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_id_fields() {
        let id = TileId::compose(35, 7, 12);
        assert_eq!(id.base(), 35);
        assert_eq!(id.overlay(), 7);
        assert_eq!(id.shape(), 12);
        assert!(id.has_overlay());
        assert!(!TileId(35).has_overlay());
    }

    #[test]
    fn server_value_decodes() {
        let id = TileId((3 << 20) | (2 << 10) | 1);
        assert_eq!((id.base(), id.overlay(), id.shape()), (1, 2, 3));
    }

    #[test]
    fn corners_mix_neighbour_light() {
        let lit = MapLocation::new(1, 0, 0);
        let corners = corner_lights(MapLocation::new(0, 0, 0), |at| {
            if at == lit { Color::WHITE } else { Color::BLACK }
        });
        let quarter = Color::new(0.25, 0.25, 0.25, 1.0);
        assert_eq!(corners[0], Color::BLACK);
        assert_eq!(corners[1], quarter);
        assert_eq!(corners[2], quarter);
        assert_eq!(corners[3], Color::BLACK);
    }
}
