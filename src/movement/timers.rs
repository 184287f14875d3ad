use serde::{Deserialize, Serialize};

use super::types::Seconds;

/// Abilities whose duration is bounded by a configured budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimedAbility {
    Climb,
    Slide,
    Dash,
    Blink,
    Roll,
    Hover,
}

/// Per-ability elapsed time accumulators. Advanced and reset by the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerSet {
    pub climb: Seconds,
    pub slide: Seconds,
    pub dash: Seconds,
    pub blink: Seconds,
    pub roll: Seconds,
    pub hover: Seconds,
}

impl TimerSet {
    pub fn get(&self, timer: TimedAbility) -> Seconds {
        match timer {
            TimedAbility::Climb => self.climb,
            TimedAbility::Slide => self.slide,
            TimedAbility::Dash => self.dash,
            TimedAbility::Blink => self.blink,
            TimedAbility::Roll => self.roll,
            TimedAbility::Hover => self.hover,
        }
    }

    fn slot(&mut self, timer: TimedAbility) -> &mut Seconds {
        match timer {
            TimedAbility::Climb => &mut self.climb,
            TimedAbility::Slide => &mut self.slide,
            TimedAbility::Dash => &mut self.dash,
            TimedAbility::Blink => &mut self.blink,
            TimedAbility::Roll => &mut self.roll,
            TimedAbility::Hover => &mut self.hover,
        }
    }

    pub fn advance(&mut self, timer: TimedAbility, dt: f32) {
        let slot = self.slot(timer);
        *slot = slot.inc(dt);
    }

    pub fn reset(&mut self, timer: TimedAbility) {
        *self.slot(timer) = Seconds::ZERO;
    }
}
