use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::movement::authority::AuthorityRole;
use crate::movement::settings::MovementSettings;

/// Movement tunables, loaded from movement_tuning.ron.
#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    /// Fixed step in seconds.
    pub dt: f32,
    pub role: AuthorityRole,
    /// Defaults for actors spawned without their own settings.
    pub settings: MovementSettings,
    /// Speed table file, relative to the data dir.
    pub speed_table: Option<String>,
    /// Animation table file, relative to the data dir.
    pub animation_table: Option<String>,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            role: AuthorityRole::Standalone,
            settings: MovementSettings::default(),
            speed_table: Some("speed_table.json".into()),
            animation_table: Some("animation_table.json".into()),
        }
    }
}

impl MovementTuning {
    /// Get the data directory for tuning and table files.
    pub fn data_dir() -> PathBuf {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("advanced_movement")
    }

    /// Path to the tuning file.
    pub fn file_path() -> PathBuf {
        Self::data_dir().join("movement_tuning.ron")
    }

    /// Resolve a table file name against the data dir.
    pub fn table_path(name: &str) -> PathBuf {
        Self::data_dir().join(name)
    }

    /// Load from file, or create default if not found.
    pub fn load_or_default() -> Self {
        let path = Self::file_path();
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match Self::from_ron(&contents) {
                    Ok(tuning) => return tuning,
                    Err(e) => {
                        warn!("Failed to parse movement_tuning.ron: {e}, using defaults");
                    }
                },
                Err(e) => {
                    warn!("Failed to read movement_tuning.ron: {e}, using defaults");
                }
            }
        }
        let tuning = Self::default();
        tuning.save();
        tuning
    }

    pub fn from_ron(contents: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(contents)
    }

    /// Save current tuning to file.
    pub fn save(&self) {
        let path = Self::file_path();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let pretty = ron::ser::PrettyConfig::default();
        match ron::ser::to_string_pretty(self, pretty) {
            Ok(s) => {
                if let Err(e) = std::fs::write(&path, s) {
                    warn!("Failed to write movement_tuning.ron: {e}");
                }
            }
            Err(e) => {
                warn!("Failed to serialize movement tuning: {e}");
            }
        }
    }

    /// Reload from file (on `ReloadTuning`).
    pub fn reload(&mut self) {
        *self = Self::load_or_default();
        info!("Movement tuning reloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::types::{MovementMode, TimeBudget};

    #[test]
    fn partial_file_keeps_defaults() {
        let tuning = MovementTuning::from_ron("(dt: 0.02, role: Server)").unwrap();
        assert_eq!(tuning.dt, 0.02);
        assert_eq!(tuning.role, AuthorityRole::Server);
        assert_eq!(tuning.settings, MovementSettings::default());
    }

    #[test]
    fn nested_settings_override() {
        let src = "(settings: (default_mode: Sprint, max_dash_time: (0.5), allowed_double_jumps: 2))";
        let tuning = MovementTuning::from_ron(src).unwrap();
        assert_eq!(tuning.settings.default_mode, MovementMode::Sprint);
        assert_eq!(tuning.settings.max_dash_time, TimeBudget(0.5));
        assert_eq!(tuning.settings.allowed_double_jumps, 2);
        assert_eq!(tuning.settings.climb_launch_scalar, 600.0);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(MovementTuning::from_ron("(dt: \"fast\")").is_err());
    }
}
