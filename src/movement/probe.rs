use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::types::SlopeDegrees;

/// A blocking floor found by a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorHit {
    pub normal: Vec3,
    pub distance: f32,
}

/// Stateless spatial query surface. Implemented by the host's collision world.
pub trait EnvironmentProbe: Send + Sync {
    /// Sphere sweep from `from` to `to`; true on any blocking hit.
    fn sweep_obstruction(&self, from: Vec3, to: Vec3, radius: f32) -> bool;

    /// Sweep from `from` along `direction` up to `max_distance`.
    fn sweep_floor(&self, from: Vec3, direction: Vec3, max_distance: f32) -> Option<FloorHit>;
}

/// Used when no probe is configured: every query misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl EnvironmentProbe for NullProbe {
    fn sweep_obstruction(&self, _from: Vec3, _to: Vec3, _radius: f32) -> bool {
        false
    }

    fn sweep_floor(&self, _from: Vec3, _direction: Vec3, _max_distance: f32) -> Option<FloorHit> {
        None
    }
}

/// Angle between a surface normal and `up`, in degrees.
pub fn slope_from_normal(normal: Vec3, up: Vec3) -> SlopeDegrees {
    let n = normal.normalize_or_zero();
    let u = up.normalize_or_zero();
    if n == Vec3::ZERO || u == Vec3::ZERO {
        return SlopeDegrees(0.0);
    }
    SlopeDegrees(n.dot(u).clamp(-1.0, 1.0).acos().to_degrees())
}

/// Probe installed as a world resource. Absent resource => `NullProbe`.
#[derive(Resource)]
pub struct SpatialProbe(pub Box<dyn EnvironmentProbe>);

impl SpatialProbe {
    pub fn new(probe: impl EnvironmentProbe + 'static) -> Self {
        Self(Box::new(probe))
    }
}

static NULL_PROBE: NullProbe = NullProbe;

/// The installed probe, or one that always misses.
pub fn probe_or_null(probe: Option<&SpatialProbe>) -> &dyn EnvironmentProbe {
    match probe {
        Some(p) => p.0.as_ref(),
        None => &NULL_PROBE,
    }
}

// ── Reference probe ─────────────────────────────────────────────────

/// Infinite plane: points with `(p - point) . normal < 0` are solid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Plane {
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: normal.normalize_or_zero(),
        }
    }

    fn signed_distance(&self, p: Vec3) -> f32 {
        (p - self.point).dot(self.normal)
    }
}

/// A world made of half-space planes (one floor, any number of walls).
/// Good enough for the demo binary and tests; hosts plug in their own probe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaneWorld {
    pub floor: Option<Plane>,
    pub walls: Vec<Plane>,
}

impl PlaneWorld {
    pub fn flat(height: f32) -> Self {
        Self {
            floor: Some(Plane::new(Vec3::new(0.0, height, 0.0), Vec3::Y)),
            walls: Vec::new(),
        }
    }

    pub fn with_wall(mut self, wall: Plane) -> Self {
        self.walls.push(wall);
        self
    }

    fn planes(&self) -> impl Iterator<Item = &Plane> {
        self.floor.iter().chain(self.walls.iter())
    }
}

impl EnvironmentProbe for PlaneWorld {
    fn sweep_obstruction(&self, from: Vec3, to: Vec3, radius: f32) -> bool {
        // The sphere touches a plane if either end comes within `radius`.
        self.planes()
            .any(|p| p.signed_distance(from).min(p.signed_distance(to)) < radius)
    }

    fn sweep_floor(&self, from: Vec3, direction: Vec3, max_distance: f32) -> Option<FloorHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        self.planes()
            .filter_map(|p| {
                let approach = dir.dot(p.normal);
                if approach >= 0.0 {
                    return None;
                }
                let distance = p.signed_distance(from) / -approach;
                (0.0..=max_distance)
                    .contains(&distance)
                    .then_some(FloorHit {
                        normal: p.normal,
                        distance,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
