use crate::color::Color;
use crate::geometry::MapLocation;

/// Read-only view of the game world, queried once per frame.
pub trait WorldView {
    /// Location of the player character, `None` before the player is placed.
    fn player_location(&self) -> Option<MapLocation>;

    /// Light on a tile. Unknown tiles are dark.
    fn light_at(&self, location: MapLocation) -> Color;

    /// Whether something blocks the view or the way on a tile.
    fn is_obstructed(&self, location: MapLocation) -> bool;

    /// Weather fog from `0.0` (clear) to `1.0`.
    fn fog(&self) -> f32;

    fn player_hit_points(&self) -> u32;

    fn is_player_dead(&self) -> bool {
        self.player_hit_points() == 0
    }
}
