//! Speed and animation tables, stored as JSON row files in the data dir.

use std::collections::HashMap;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::movement::animation::MovementAnimations;
use crate::movement::speed::SpeedEntry;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read table: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse table: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Ordered speed rows shared by every actor.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedTable {
    pub rows: Vec<SpeedEntry>,
}

/// Animation sets keyed by row name.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationTable {
    pub rows: HashMap<String, MovementAnimations>,
}

impl AnimationTable {
    pub fn row(&self, name: &str) -> Option<&MovementAnimations> {
        self.rows.get(name)
    }
}

/// Read a JSON table. A missing file is `Ok(None)`: the table is optional.
fn read_table<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, TableError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&contents)?))
}

/// Load a table, degrading to "no table" with a warning on any error.
pub fn load_table<T: for<'de> Deserialize<'de>>(path: &Path) -> Option<T> {
    match read_table(path) {
        Ok(table) => table,
        Err(e) => {
            warn!("Ignoring table {}: {e}", path.display());
            None
        }
    }
}

impl SpeedTable {
    pub fn from_json(contents: &str) -> Result<Self, TableError> {
        Ok(serde_json::from_str(contents)?)
    }
}

impl AnimationTable {
    pub fn from_json(contents: &str) -> Result<Self, TableError> {
        Ok(serde_json::from_str(contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_rows_keep_file_order() {
        let table = SpeedTable::from_json(
            r#"{"rows": [
                {"name": "walk", "mode": "Walk", "speed": 600.0},
                {"name": "sprint", "mode": "Sprint", "speed": 1200.0},
                {"name": "walk_slow", "mode": "Walk", "speed": 300.0}
            ]}"#,
        )
        .unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[2].name, "walk_slow");
    }

    #[test]
    fn animation_rows_by_name() {
        let table = AnimationTable::from_json(
            r#"{"rows": {"default": {
                "prone": {"name": "prone", "clip": "prone_in", "clip_length": 0.8,
                          "play_rate": 1.0, "start_position": 0.0, "stop_competing": true},
                "slide": {"name": "slide", "clip": null, "clip_length": 0.0,
                          "play_rate": 1.0, "start_position": 0.0, "stop_competing": true},
                "double_jump": {"name": "flip", "clip": "flip_01", "clip_length": 1.2,
                          "play_rate": 1.5, "start_position": 0.1, "stop_competing": false},
                "parachute": {"name": "chute", "clip": "chute_open", "clip_length": 2.0,
                          "play_rate": 1.0, "start_position": 0.0, "stop_competing": true}
            }}}"#,
        )
        .unwrap();
        let row = table.row("default").unwrap();
        assert_eq!(row.double_jump.clip.as_deref(), Some("flip_01"));
        assert!(row.slide.clip.is_none());
        assert!(table.row("missing").is_none());
    }

    #[test]
    fn bad_mode_is_a_parse_error() {
        let err = SpeedTable::from_json(r#"{"rows": [{"name": "x", "mode": "Teleport", "speed": 1.0}]}"#)
            .unwrap_err();
        assert!(matches!(err, TableError::Parse(_)));
    }

    #[test]
    fn missing_file_means_no_table() {
        let path = std::env::temp_dir().join("advanced_movement_no_such_table.json");
        assert!(load_table::<SpeedTable>(&path).is_none());
    }
}
