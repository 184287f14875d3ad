use serde::{Deserialize, Serialize};

use super::types::MovementMode;

/// How much mode history the controller keeps for restoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HistoryMode {
    /// One previous mode. Nested overrides collapse to a single level.
    #[default]
    SingleLevel,
    /// Every request pushes; every restore pops.
    Stack,
}

/// Mode arbitration: exactly one current mode, plus restoration history.
///
/// Legality is the caller's job (see `gate`); `request` always commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeController {
    current: MovementMode,
    previous: MovementMode,
    history: HistoryMode,
    stack: Vec<MovementMode>,
    /// Mode restored to when a stack-mode history runs dry.
    fallback: MovementMode,
}

/// Result of one commit: what changed, for the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeCommit {
    pub current: MovementMode,
    pub previous: MovementMode,
}

impl ModeController {
    pub fn new(initial: MovementMode, history: HistoryMode) -> Self {
        Self {
            current: initial,
            previous: initial,
            history,
            stack: Vec::new(),
            fallback: initial,
        }
    }

    pub fn current(&self) -> MovementMode {
        self.current
    }

    pub fn previous(&self) -> MovementMode {
        self.previous
    }

    pub fn history_mode(&self) -> HistoryMode {
        self.history
    }

    /// previous <- current, current <- mode. Commits even when `mode == current`.
    pub fn request(&mut self, mode: MovementMode) -> ModeCommit {
        if self.history == HistoryMode::Stack {
            self.stack.push(self.current);
        }
        self.previous = self.current;
        self.current = mode;
        self.commit()
    }

    /// current <- previous. The mode being left is not recorded as the new previous.
    pub fn restore_previous(&mut self) -> ModeCommit {
        match self.history {
            HistoryMode::SingleLevel => {
                self.current = self.previous;
            }
            HistoryMode::Stack => {
                self.current = self.stack.pop().unwrap_or(self.fallback);
                self.previous = self.stack.last().copied().unwrap_or(self.fallback);
            }
        }
        self.commit()
    }

    fn commit(&self) -> ModeCommit {
        ModeCommit {
            current: self.current,
            previous: self.previous,
        }
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new(MovementMode::Walk, HistoryMode::SingleLevel)
    }
}
