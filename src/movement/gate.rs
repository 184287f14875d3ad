//! Side-effect-free eligibility predicates.
//!
//! Callers check a gate before asking the mode controller for a transition;
//! the controller itself never refuses a request.

use bevy::prelude::*;

use super::ability::{Ability, AbilityState};
use super::probe::{FloorHit, slope_from_normal};
use super::settings::MovementSettings;
use super::timers::TimerSet;

/// What the slide gate needs to know about the ground this step.
#[derive(Debug, Clone, Copy)]
pub struct GroundContact {
    pub speed: f32,
    pub airborne: bool,
    pub floor: Option<FloorHit>,
    pub up: Vec3,
}

pub struct AbilityGate<'a> {
    pub abilities: &'a AbilityState,
    pub timers: &'a TimerSet,
    pub settings: &'a MovementSettings,
}

impl<'a> AbilityGate<'a> {
    pub fn new(abilities: &'a AbilityState, timers: &'a TimerSet, settings: &'a MovementSettings) -> Self {
        Self {
            abilities,
            timers,
            settings,
        }
    }

    /// False while a locomotion override (slide, dash, roll, hover) runs.
    pub fn can_move(&self) -> bool {
        !self.abilities.overrides_locomotion()
    }

    pub fn can_slide(&self, ground: GroundContact) -> bool {
        let s = self.settings;
        if !s.can_slide && !self.abilities.is_active(Ability::Prone) {
            return false;
        }
        if !s.max_slide_time.allows(self.timers.slide) {
            return false;
        }
        if ground.speed < s.required_slide_speed {
            return false;
        }
        if s.ignore_slide_angle {
            return true;
        }
        if ground.airborne {
            return false;
        }
        ground
            .floor
            .is_some_and(|f| slope_from_normal(f.normal, ground.up).0 >= s.required_slide_angle)
    }

    pub fn can_dash(&self) -> bool {
        !self.abilities.other_burst_active(Ability::Dash)
            && self.settings.max_dash_time.allows_inclusive(self.timers.dash)
    }

    pub fn can_roll(&self) -> bool {
        !self.abilities.other_burst_active(Ability::Roll)
            && self.settings.max_roll_time.allows_inclusive(self.timers.roll)
    }

    pub fn can_blink(&self) -> bool {
        !self.abilities.other_burst_active(Ability::Blink)
            && self.settings.max_blink_time.allows_inclusive(self.timers.blink)
    }

    pub fn can_hover(&self) -> bool {
        self.settings.enable_hover && self.settings.max_hover_time.allows(self.timers.hover)
    }

    /// A jump already happened and one more keeps the counter within the allowance.
    pub fn can_double_jump(&self) -> bool {
        self.abilities.jumped && self.abilities.double_jumps < self.settings.allowed_double_jumps
    }

    /// No floor within the check distance, or the floor is far enough away.
    pub fn can_deploy_parachute(&self, floor: Option<FloorHit>) -> bool {
        match floor {
            None => true,
            Some(hit) => hit.distance > self.settings.required_deploy_distance,
        }
    }
}
