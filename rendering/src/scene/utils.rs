use super::constants::{LEVEL_HEIGHT, TILE_HEIGHT_HALF, TILE_WIDTH_HALF};
use crate::geometry::MapLocation;
use glam::Vec2;

pub fn get_isometric_coordinate(x: f32, y: f32) -> Vec2 {
    let iso_x = (x * (TILE_WIDTH_HALF as f32)) - (y * TILE_WIDTH_HALF as f32);
    let iso_y = (x * (TILE_HEIGHT_HALF as f32)) + (y * TILE_HEIGHT_HALF as f32);
    Vec2::new(iso_x, iso_y)
}

/// Inverse of [`get_isometric_coordinate`] for the given map level, rounded to
/// the tile under the display position.
pub fn display_to_map_location(display: Vec2, z: i32) -> MapLocation {
    let lifted = Vec2::new(display.x, display.y + (z * LEVEL_HEIGHT) as f32);
    let a = lifted.x / TILE_WIDTH_HALF as f32;
    let b = lifted.y / TILE_HEIGHT_HALF as f32;
    MapLocation::new(
        ((a + b) * 0.5).round() as i32,
        ((b - a) * 0.5).round() as i32,
        z,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_origin() {
        assert_eq!(get_isometric_coordinate(0., 0.), Vec2::ZERO);
    }

    #[test]
    fn diagonal_steps_move_vertically() {
        let p = get_isometric_coordinate(1., 1.);
        assert_eq!(p, Vec2::new(0., (TILE_HEIGHT_HALF * 2) as f32));
    }

    #[test]
    fn display_position_maps_back_to_tile() {
        for (x, y, z) in [(0, 0, 0), (3, 7, 0), (12, 4, 1), (-2, 5, 2)] {
            let location = MapLocation::new(x, y, z);
            let display = location.display_coordinate();
            let back = display_to_map_location(Vec2::new(display.x as f32, display.y as f32), z);
            assert_eq!(back, location, "round trip for ({x}, {y}, {z})");
        }
    }
}
