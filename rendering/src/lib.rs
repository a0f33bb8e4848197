pub mod animation;
pub mod camera;
pub mod color;
pub mod display;
pub mod geometry;
pub mod instance;
pub mod scene;
pub mod world;

pub use camera::{Camera, CameraUniform};
pub use color::Color;
pub use display::{DisplaySettings, MapDisplayManager, MapEntity};
pub use geometry::{DisplayCoordinate, MapLocation, Rectangle};
pub use instance::{Instance, InstanceFlag, InstanceRaw, RenderBatch, TextLabel};
pub use world::WorldView;
