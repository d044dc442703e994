//! Game settings and preferences
//!
//! Read from a JSON file next to the level list. Missing fields take their
//! defaults, so a settings file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::sim::builder::BuildParams;
use crate::sim::health::HealthModel;

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Gameplay ===
    /// Hazards never drain health
    pub god_mode: bool,
    /// Start each level as soon as it is ready instead of waiting for docking
    pub start_automatically: bool,
    /// Health drain/refill rates
    pub health: HealthModel,

    // === Level generation ===
    /// Run seed; each level derives its own from this unless it fixes one
    pub seed: u64,
    /// Hazard field compiler constants
    pub build: BuildParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            god_mode: false,
            start_automatically: false,
            health: HealthModel::default(),
            seed: 0x5EED,
            build: BuildParams::default(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from `path`, falling back to defaults if the file is
    /// missing or malformed
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let loaded = std::fs::read_to_string(path)
            .map_err(crate::LevelError::from)
            .and_then(|json| Self::from_json(&json));

        match loaded {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write settings to `path` as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{"god_mode": true, "build": {"release_seconds": 1.0}}"#).unwrap();
        assert!(settings.god_mode);
        assert!(!settings.start_automatically);
        assert_eq!(settings.build.release_seconds, 1.0);
        assert_eq!(settings.build.buckets, crate::consts::FIELD_BUCKETS);
        assert_eq!(settings.health, HealthModel::default());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = Settings::load("/nonexistent/tunnel-transfer/settings.json");
        assert!(!settings.god_mode);
        assert_eq!(settings.seed, Settings::default().seed);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(Settings::from_json("[1, 2").is_err());
    }
}
