use serde::{Deserialize, Serialize};

use super::types::{MovementMode, SlopeDegrees};

/// One row of a speed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedEntry {
    pub name: String,
    pub mode: MovementMode,
    pub speed: f32,
}

impl SpeedEntry {
    pub fn new(name: impl Into<String>, mode: MovementMode, speed: f32) -> Self {
        Self {
            name: name.into(),
            mode,
            speed,
        }
    }
}

/// Ordered (mode, speed) rows. The first row for a mode wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedProfile {
    pub entries: Vec<SpeedEntry>,
}

impl SpeedProfile {
    pub fn new(entries: Vec<SpeedEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn speed_for(&self, mode: MovementMode) -> Option<f32> {
        self.entries.iter().find(|e| e.mode == mode).map(|e| e.speed)
    }
}

/// Piecewise-linear curve mapping slope angle (degrees) to a speed scalar.
/// Keys are kept sorted by angle; values outside the key range clamp to the ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlopeCurve {
    keys: Vec<(f32, f32)>,
}

impl SlopeCurve {
    pub fn new(mut keys: Vec<(f32, f32)>) -> Self {
        keys.retain(|(a, v)| a.is_finite() && v.is_finite());
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    pub fn sample(&self, angle: SlopeDegrees) -> f32 {
        let x = angle.0;
        let Some(&(first_a, first_v)) = self.keys.first() else {
            return 1.0;
        };
        if x <= first_a {
            return first_v;
        }
        for pair in self.keys.windows(2) {
            let (a0, v0) = pair[0];
            let (a1, v1) = pair[1];
            if x <= a1 {
                let span = a1 - a0;
                if span <= f32::EPSILON {
                    return v1;
                }
                let t = (x - a0) / span;
                return v0 + (v1 - v0) * t;
            }
        }
        self.keys.last().map(|k| k.1).unwrap_or(1.0)
    }
}

/// Maps {mode, slope scalar} to a target speed.
pub struct SpeedResolver<'a> {
    pub profile: &'a SpeedProfile,
}

impl<'a> SpeedResolver<'a> {
    pub fn new(profile: &'a SpeedProfile) -> Self {
        Self { profile }
    }

    /// `None` when no row applies to `mode`.
    pub fn resolve(&self, mode: MovementMode, slope_scalar: f32) -> Option<f32> {
        self.profile.speed_for(mode).map(|s| s * slope_scalar)
    }
}
