use std::collections::{HashMap, HashSet};

use rendering::{Color, MapLocation, WorldView};

const DEFAULT_HIT_POINTS: u32 = 100;

/// World state reported by the server that the display reads every frame.
#[derive(Debug, Clone)]
pub struct SessionWorld {
    lights: HashMap<MapLocation, Color>,
    ambient: Color,
    obstructed: HashSet<MapLocation>,
    fog: f32,
    player_location: Option<MapLocation>,
    hit_points: u32,
}

impl Default for SessionWorld {
    fn default() -> Self {
        Self {
            lights: HashMap::new(),
            ambient: Color::WHITE,
            obstructed: HashSet::new(),
            fog: 0.0,
            player_location: None,
            hit_points: DEFAULT_HIT_POINTS,
        }
    }
}

impl SessionWorld {
    /// Light of a single tile, overriding the ambient light.
    pub fn set_light(&mut self, location: MapLocation, color: Color) {
        self.lights.insert(location, color);
    }

    pub fn set_ambient_light(&mut self, color: Color) {
        self.ambient = color;
    }

    pub fn set_obstructed(&mut self, location: MapLocation, obstructed: bool) {
        if obstructed {
            self.obstructed.insert(location);
        } else {
            self.obstructed.remove(&location);
        }
    }

    pub fn set_fog(&mut self, fog: f32) {
        self.fog = fog.clamp(0.0, 1.0);
    }

    pub fn set_player_location(&mut self, location: Option<MapLocation>) {
        self.player_location = location;
    }

    pub fn set_hit_points(&mut self, hit_points: u32) {
        self.hit_points = hit_points;
    }

    /// Forgets per-tile state. Ambient light and player stats stay.
    pub fn clear_map(&mut self) {
        self.lights.clear();
        self.obstructed.clear();
        self.player_location = None;
    }
}

impl WorldView for SessionWorld {
    fn player_location(&self) -> Option<MapLocation> {
        self.player_location
    }

    fn light_at(&self, location: MapLocation) -> Color {
        self.lights.get(&location).copied().unwrap_or(self.ambient)
    }

    fn is_obstructed(&self, location: MapLocation) -> bool {
        self.obstructed.contains(&location)
    }

    fn fog(&self) -> f32 {
        self.fog
    }

    fn player_hit_points(&self) -> u32 {
        self.hit_points
    }
}
