use bevy::log::warn;
use serde::{Deserialize, Serialize};

/// Jetpack fuel. The level is always clamped to [0, max].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuelState {
    level: f32,
    pub max: f32,
    /// Drained per fixed step while thrusting.
    pub drain_rate: f32,
    /// Refilled per fixed step while inactive.
    pub refill_rate: f32,
    /// Minimum level required to produce thrust.
    pub min_required: f32,
    pub refill_when_inactive: bool,
}

impl Default for FuelState {
    fn default() -> Self {
        Self {
            level: 100.0,
            max: 100.0,
            drain_rate: 1.0,
            refill_rate: 0.5,
            min_required: 0.1,
            refill_when_inactive: true,
        }
    }
}

/// What a fuel step did, so the caller knows whether to notify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuelStep {
    Thrust { drained: bool },
    Refilled,
    Idle,
}

impl FuelState {
    /// Full tank with the given parameters.
    pub fn full(max: f32, drain_rate: f32, refill_rate: f32, min_required: f32) -> Self {
        let max = max.max(0.0);
        Self {
            level: max,
            max,
            drain_rate,
            refill_rate,
            min_required,
            refill_when_inactive: true,
        }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Set the level, clamped to [0, max]. Non-finite values are ignored.
    pub fn set_level(&mut self, value: f32) {
        if !value.is_finite() {
            warn!("Ignoring non-finite fuel level {value}");
            return;
        }
        self.level = value.clamp(0.0, self.max.max(0.0));
    }

    pub fn can_thrust(&self) -> bool {
        self.level >= self.min_required
    }

    pub fn is_full(&self) -> bool {
        self.level >= self.max
    }

    /// One fixed step of the jetpack fuel model.
    pub fn step(&mut self, jetpack_active: bool) -> FuelStep {
        if jetpack_active && self.can_thrust() {
            // No churn at exactly zero.
            if self.level != 0.0 {
                self.set_level(self.level - self.drain_rate);
                return FuelStep::Thrust { drained: true };
            }
            return FuelStep::Thrust { drained: false };
        }
        if !jetpack_active && self.refill_when_inactive && !self.is_full() {
            self.set_level(self.level + self.refill_rate);
            return FuelStep::Refilled;
        }
        FuelStep::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_level_is_ignored() {
        let mut fuel = FuelState::full(10.0, 1.0, 1.0, 0.0);
        fuel.set_level(4.0);
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            fuel.set_level(bad);
            assert_eq!(fuel.level(), 4.0);
        }
    }

    #[test]
    fn level_stays_in_range_over_mixed_sequences() {
        let mut fuel = FuelState::full(5.0, 2.0, 3.0, 0.1);
        let pattern = [true, true, true, true, false, false, true, false, false, false, false];
        for active in pattern.iter().cycle().take(200) {
            fuel.step(*active);
            assert!(fuel.level() >= 0.0 && fuel.level() <= fuel.max);
        }
    }

    #[test]
    fn below_minimum_no_thrust_and_no_refill_while_held() {
        let mut fuel = FuelState::full(1.0, 1.0, 0.5, 0.5);
        assert_eq!(fuel.step(true), FuelStep::Thrust { drained: true });
        assert_eq!(fuel.level(), 0.0);
        assert_eq!(fuel.step(true), FuelStep::Idle);
        assert_eq!(fuel.level(), 0.0);
    }

    #[test]
    fn zero_minimum_at_empty_thrusts_without_draining() {
        let mut fuel = FuelState::full(1.0, 1.0, 0.5, 0.0);
        fuel.set_level(0.0);
        assert_eq!(fuel.step(true), FuelStep::Thrust { drained: false });
    }

    #[test]
    fn refill_respects_flag_and_cap() {
        let mut fuel = FuelState::full(1.0, 1.0, 0.75, 0.1);
        fuel.set_level(0.5);
        assert_eq!(fuel.step(false), FuelStep::Refilled);
        assert_eq!(fuel.level(), 1.0);
        assert_eq!(fuel.step(false), FuelStep::Idle);

        fuel.refill_when_inactive = false;
        fuel.set_level(0.2);
        assert_eq!(fuel.step(false), FuelStep::Idle);
        assert_eq!(fuel.level(), 0.2);
    }
}
