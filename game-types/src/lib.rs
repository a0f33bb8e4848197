mod settings;

pub use settings::{GraphicsSettings, HexColor, XRaySize};
