#![allow(dead_code)]

use crossbeam_channel::Sender;
use isoclient::demo;
use isoclient::{Session, Settings, WorldUpdate};
use rendering::scene::TileId;
use rendering::{Color, MapDisplayManager, MapLocation, WorldView};
use std::sync::Arc;

/// A session fed through its update channel, like the client loop does.
pub struct TestScene {
    session: Session,
    tx: Sender<WorldUpdate>,
}

impl TestScene {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let templates = Arc::new(demo::demo_templates().expect("demo templates"));
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            session: Session::new(&settings, templates, rx),
            tx,
        }
    }

    pub fn send(&self, update: WorldUpdate) {
        self.tx.send(update).expect("session is gone");
    }

    pub fn send_all(&self, updates: impl IntoIterator<Item = WorldUpdate>) {
        for update in updates {
            self.send(update);
        }
    }

    /// Runs frames of `step` milliseconds until `total` milliseconds passed.
    pub fn advance(&mut self, total: u32, step: u32) {
        let mut elapsed = 0;
        while elapsed < total {
            let delta = step.min(total - elapsed);
            self.session.frame(delta);
            elapsed += delta;
        }
    }

    pub fn frame(&mut self, delta: u32) -> usize {
        self.session.frame(delta)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn display(&self) -> &MapDisplayManager {
        self.session.display()
    }

    /// One line per listed entity, back to front: kind, location and layer.
    pub fn scene_summary(&self) -> String {
        summarize(self.display())
    }
}

pub fn summarize(display: &MapDisplayManager) -> String {
    display
        .display_list()
        .iter()
        .filter_map(|id| {
            let entity = display.entity(id)?;
            let MapLocation { x, y, z } = entity.location();
            let layer = display.display_list().layer_of(id)?;
            Some(format!("{} ({x},{y},{z}) @{layer}", entity.kind()))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn grass() -> TileId {
    TileId::compose(demo::GRASS, 0, 0)
}

pub fn rocks(shape: u32) -> TileId {
    TileId::compose(demo::GRASS, demo::ROCKS, shape)
}

/// Evenly lit world driven directly by a test.
pub struct StaticWorld {
    pub player: Option<MapLocation>,
    pub light: Color,
    pub hit_points: u32,
}

impl Default for StaticWorld {
    fn default() -> Self {
        Self {
            player: None,
            light: Color::WHITE,
            hit_points: 10,
        }
    }
}

impl WorldView for StaticWorld {
    fn player_location(&self) -> Option<MapLocation> {
        self.player
    }

    fn light_at(&self, _location: MapLocation) -> Color {
        self.light
    }

    fn is_obstructed(&self, _location: MapLocation) -> bool {
        false
    }

    fn fog(&self) -> f32 {
        0.0
    }

    fn player_hit_points(&self) -> u32 {
        self.hit_points
    }
}
