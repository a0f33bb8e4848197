pub mod demo;
pub mod events;
pub mod session;
pub mod settings;
pub mod settings_types;

pub use events::{ClientAction, WorldUpdate};
pub use session::{Session, SessionWorld};
pub use settings::Settings;

pub fn storage_dir() -> std::path::PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    path.push("Isoclient");
    let _ = std::fs::create_dir_all(&path);
    path
}
