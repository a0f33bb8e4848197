use serde::{Deserialize, Serialize};

pub use game_types::{GraphicsSettings, HexColor, XRaySize};

/// Pacing of the headless client loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Milliseconds simulated per frame.
    pub frame_time_ms: u32,
    /// Frames run before the client exits.
    pub frames: u32,
    /// Milliseconds a character needs for one step.
    pub walk_duration_ms: u32,
    /// Seed of the simulated server, random when absent.
    pub seed: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            frame_time_ms: 16,
            frames: 600,
            walk_duration_ms: 400,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub graphics: GraphicsSettings,
    pub session: SessionSettings,
}
