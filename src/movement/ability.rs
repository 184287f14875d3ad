use bevy::prelude::*;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Active flags for every toggleable ability on one actor.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct AbilityFlags: u16 {
        const SLIDING     = 1 << 0;
        const CROUCHING   = 1 << 1;
        const DASHING     = 1 << 2;
        const BLINKING    = 1 << 3;
        const ROLLING     = 1 << 4;
        const HOVERING    = 1 << 5;
        const PRONE       = 1 << 6;
        const SPRINTING   = 1 << 7;
        const JETPACK     = 1 << 8;
        const ZERO_G      = 1 << 9;
        const PARACHUTING = 1 << 10;
        const AUTO_RUN    = 1 << 11;

        /// Abilities that take over locomotion input while active.
        const LOCOMOTION_OVERRIDES = Self::SLIDING.bits()
            | Self::DASHING.bits()
            | Self::ROLLING.bits()
            | Self::HOVERING.bits();
        /// Momentary bursts that exclude each other.
        const BURSTS = Self::DASHING.bits() | Self::BLINKING.bits() | Self::ROLLING.bits();
    }
}

/// One named ability, used to tag notifications and toggle flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Slide,
    Crouch,
    Dash,
    Blink,
    Roll,
    Hover,
    Prone,
    Sprint,
    Jetpack,
    ZeroG,
    Parachute,
    AutoRun,
}

impl Ability {
    pub fn flag(self) -> AbilityFlags {
        match self {
            Self::Slide => AbilityFlags::SLIDING,
            Self::Crouch => AbilityFlags::CROUCHING,
            Self::Dash => AbilityFlags::DASHING,
            Self::Blink => AbilityFlags::BLINKING,
            Self::Roll => AbilityFlags::ROLLING,
            Self::Hover => AbilityFlags::HOVERING,
            Self::Prone => AbilityFlags::PRONE,
            Self::Sprint => AbilityFlags::SPRINTING,
            Self::Jetpack => AbilityFlags::JETPACK,
            Self::ZeroG => AbilityFlags::ZERO_G,
            Self::Parachute => AbilityFlags::PARACHUTING,
            Self::AutoRun => AbilityFlags::AUTO_RUN,
        }
    }
}

/// Per-actor mutable ability record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityState {
    pub flags: AbilityFlags,
    pub dash_direction: Vec3,
    pub blink_direction: Vec3,
    pub roll_direction: Vec3,
    pub jumped: bool,
    pub double_jumps: u32,
}

impl AbilityState {
    pub fn is_active(&self, ability: Ability) -> bool {
        self.flags.contains(ability.flag())
    }

    pub fn set_active(&mut self, ability: Ability, active: bool) {
        self.flags.set(ability.flag(), active);
    }

    /// Flip the flag and return the new value.
    pub fn toggle(&mut self, ability: Ability) -> bool {
        self.flags.toggle(ability.flag());
        self.is_active(ability)
    }

    /// True while any locomotion override (slide, dash, roll, hover) runs.
    pub fn overrides_locomotion(&self) -> bool {
        self.flags.intersects(AbilityFlags::LOCOMOTION_OVERRIDES)
    }

    /// True if a burst other than `ability` is running.
    pub fn other_burst_active(&self, ability: Ability) -> bool {
        let others = AbilityFlags::BURSTS - ability.flag();
        self.flags.intersects(others)
    }

    /// Clear jump bookkeeping on ground contact.
    pub fn land(&mut self) {
        self.jumped = false;
        self.double_jumps = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_only_its_flag() {
        let mut state = AbilityState::default();
        state.set_active(Ability::Sprint, true);
        assert!(state.toggle(Ability::Dash));
        assert!(state.is_active(Ability::Sprint));
        assert!(!state.toggle(Ability::Dash));
        assert!(state.is_active(Ability::Sprint));
    }

    #[test]
    fn bursts_exclude_each_other_but_not_themselves() {
        let mut state = AbilityState::default();
        state.set_active(Ability::Dash, true);
        assert!(!state.other_burst_active(Ability::Dash));
        assert!(state.other_burst_active(Ability::Roll));
        assert!(state.other_burst_active(Ability::Blink));
    }

    #[test]
    fn blink_is_not_a_locomotion_override() {
        let mut state = AbilityState::default();
        state.set_active(Ability::Blink, true);
        assert!(!state.overrides_locomotion());
        state.set_active(Ability::Hover, true);
        assert!(state.overrides_locomotion());
    }
}
