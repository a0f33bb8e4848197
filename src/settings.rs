use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{error, info};

pub use crate::settings_types::*;

const SETTINGS_FILE: &str = "settings.toml";

impl Settings {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("malformed settings")
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("failed to serialize settings")
    }

    /// Loads the settings from the storage directory, writing the defaults
    /// when no file exists yet.
    pub fn load() -> Self {
        Self::load_from(&settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("Settings file not found, creating default: {:?}", path);
            let settings = Self::default();
            if let Err(e) = settings.save_to(path) {
                error!("Failed to write default settings: {e:#}");
            }
            return settings;
        }

        match fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))
            .and_then(|content| Self::from_toml_str(&content))
        {
            Ok(settings) => {
                info!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                error!("Failed to load settings, using defaults: {e:#}");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        let path = settings_path();
        match self.save_to(&path) {
            Ok(()) => info!("Settings saved to {:?}", path),
            Err(e) => error!("Failed to save settings: {e:#}"),
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_toml_string()?)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

fn settings_path() -> PathBuf {
    crate::storage_dir().join(SETTINGS_FILE)
}
