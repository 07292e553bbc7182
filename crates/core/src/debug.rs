//! Debug introspection of running timers
//!
//! Everything here is read-only. With debugging disabled the queries return
//! nothing, and timers do not expose where they were created.

use serde::Serialize;

use crate::context::{global, TimerContext};
use crate::kind::{Tagged, TimerKind};
use crate::timers::{RunFlags, Timer};

/// Point-in-time view of one timer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerSnapshot {
    pub kind: TimerKind,
    pub active: bool,
    pub paused: bool,
    pub destroyed: bool,
    pub elapsed_ms: f64,
    pub index: usize,
    pub count: Option<usize>,
    pub interval_ms: f64,
    /// `None` when unbounded
    pub timeout_ms: Option<f64>,
    /// Creation site as `file:line:column`
    pub trace: Option<String>,
}

impl Timer {
    pub fn snapshot(&self) -> TimerSnapshot {
        let flags = self.flags();
        let options = self.options();

        TimerSnapshot {
            kind: self.kind(),
            active: flags.contains(RunFlags::ACTIVE),
            paused: flags.contains(RunFlags::PAUSED),
            destroyed: flags.contains(RunFlags::DESTROYED),
            elapsed_ms: self.elapsed(),
            index: self.index(),
            count: options.count,
            interval_ms: options.interval_ms,
            timeout_ms: options.timeout_ms.is_finite().then_some(options.timeout_ms),
            trace: self.trace().map(|location| location.to_string()),
        }
    }
}

impl TimerContext {
    /// Running timers, or none while debugging is disabled
    pub fn active_timers(&self) -> Vec<Timer> {
        if !self.is_debug() {
            return Vec::new();
        }
        self.active_set().snapshot()
    }

    /// Snapshots of [`active_timers`](Self::active_timers)
    pub fn snapshot(&self) -> Vec<TimerSnapshot> {
        self.active_timers().iter().map(Timer::snapshot).collect()
    }

    /// [`snapshot`](Self::snapshot) rendered as pretty JSON
    pub fn snapshot_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

/// Enable or disable debugging on the process-wide context
pub fn set_debug(enabled: bool) {
    global().set_debug(enabled);
}

pub fn is_debug() -> bool {
    global().is_debug()
}

/// Running timers of the process-wide context, while debugging
pub fn active_timers() -> Vec<Timer> {
    global().active_timers()
}

pub fn snapshot() -> Vec<TimerSnapshot> {
    global().snapshot()
}
