use serde::{Deserialize, Serialize};

// ── Newtypes ────────────────────────────────────────────────────────

/// Elapsed duration in seconds. Always >= 0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Seconds(pub f32);

impl Seconds {
    pub const ZERO: Self = Self(0.0);

    pub fn new(v: f32) -> Self {
        debug_assert!(v.is_finite(), "Seconds must be finite");
        Self(v.max(0.0))
    }

    /// Accumulate dt, clamped at 0 from below.
    pub fn inc(self, dt: f32) -> Self {
        Self::new(self.0 + dt)
    }

    pub fn is_zero(self) -> bool {
        self.0 <= 0.0
    }
}

/// Configured maximum for a time-bounded ability. `<= 0` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TimeBudget(pub f32);

impl TimeBudget {
    pub const UNBOUNDED: Self = Self(0.0);

    pub fn is_unbounded(self) -> bool {
        self.0 <= 0.0
    }

    /// `elapsed < max`, or unbounded.
    pub fn allows(self, elapsed: Seconds) -> bool {
        self.is_unbounded() || elapsed.0 < self.0
    }

    /// `elapsed <= max`, or unbounded. Used by the momentary burst abilities.
    pub fn allows_inclusive(self, elapsed: Seconds) -> bool {
        self.is_unbounded() || elapsed.0 <= self.0
    }
}

impl Default for TimeBudget {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Angle in degrees between a surface normal and the actor's up axis.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct SlopeDegrees(pub f32);

// ── Enums ───────────────────────────────────────────────────────────

/// The single advanced movement mode an actor is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementMode {
    #[default]
    None,
    Fly,
    Crouch,
    Walk,
    Sprint,
    Prone,
    Swim,
    Climb,
    Slide,
    Jump,
    Parachute,
    /// Free fall before a parachute deploy (e.g. dropping from a plane).
    SuperFall,
    Dash,
    Blink,
    Roll,
    Hover,
    ZeroG,
    Jetpack,
}

/// Animation hint published alongside the mode for the animation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementAnimTag {
    #[default]
    None,
    ClimbUp,
    ClimbFront,
    ClimbLeft,
    ClimbRight,
    ClimbDown,
    Sliding,
}

impl MovementAnimTag {
    pub fn is_climb(self) -> bool {
        matches!(
            self,
            Self::ClimbUp | Self::ClimbFront | Self::ClimbLeft | Self::ClimbRight | Self::ClimbDown
        )
    }
}

/// Locomotion state of the external solver (walking / falling / flying).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LocomotionMode {
    None,
    #[default]
    Walking,
    Falling,
    Flying,
}

/// Which of the three wall probes a climb check uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallSide {
    Front,
    Left,
    Right,
}

impl WallSide {
    pub const ALL: [WallSide; 3] = [WallSide::Front, WallSide::Left, WallSide::Right];

    pub fn anim_tag(self) -> MovementAnimTag {
        match self {
            Self::Front => MovementAnimTag::ClimbFront,
            Self::Left => MovementAnimTag::ClimbLeft,
            Self::Right => MovementAnimTag::ClimbRight,
        }
    }

    /// Anchor name looked up on the owning actor during initialization.
    pub fn anchor_name(self) -> &'static str {
        match self {
            Self::Front => "FrontWallCheck",
            Self::Left => "LeftWallCheck",
            Self::Right => "RightWallCheck",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_zero_or_negative_is_unbounded() {
        assert!(TimeBudget(0.0).allows(Seconds(1e6)));
        assert!(TimeBudget(-1.0).allows_inclusive(Seconds(1e6)));
    }

    #[test]
    fn budget_strict_vs_inclusive() {
        let budget = TimeBudget(3.0);
        assert!(!budget.allows(Seconds(3.0)));
        assert!(budget.allows_inclusive(Seconds(3.0)));
        assert!(!budget.allows_inclusive(Seconds(3.01)));
    }

    #[test]
    fn seconds_never_negative() {
        assert_eq!(Seconds::new(-2.0), Seconds::ZERO);
        assert_eq!(Seconds(0.5).inc(-1.0), Seconds::ZERO);
    }
}
