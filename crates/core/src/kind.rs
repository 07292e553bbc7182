//! Timer classification
//!
//! Every timer-like value carries a [`TimerKind`] tag fixed at construction.

use serde::{Deserialize, Serialize};

/// What kind of timer an instance is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerKind {
    /// Runs a callback repeatedly at an interval
    Repeat,
    /// Runs a callback once after a delay
    Wait,
    /// Polls a condition and settles a completion
    When,
}

impl TimerKind {
    /// Lowercase name for display/logging
    pub fn name(self) -> &'static str {
        match self {
            Self::Repeat => "repeat",
            Self::Wait => "wait",
            Self::When => "when",
        }
    }

    /// Whether the kind runs more than once by default
    pub fn is_repeating(self) -> bool {
        match self {
            Self::Repeat | Self::When => true,
            Self::Wait => false,
        }
    }
}

impl std::fmt::Display for TimerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Values that carry a [`TimerKind`] tag
pub trait Tagged {
    /// The tag assigned at construction
    fn kind(&self) -> TimerKind;
}

/// Is the value a repeating or waiting timer?
pub fn is_timer<T: Tagged + ?Sized>(value: &T) -> bool {
    match value.kind() {
        TimerKind::Repeat | TimerKind::Wait => true,
        TimerKind::When => false,
    }
}

/// Is the value a repeating timer?
pub fn is_repeated<T: Tagged + ?Sized>(value: &T) -> bool {
    matches!(value.kind(), TimerKind::Repeat)
}

/// Is the value a waiting timer?
pub fn is_waited<T: Tagged + ?Sized>(value: &T) -> bool {
    matches!(value.kind(), TimerKind::Wait)
}

/// Is the value a conditional timer?
pub fn is_when<T: Tagged + ?Sized>(value: &T) -> bool {
    matches!(value.kind(), TimerKind::When)
}
