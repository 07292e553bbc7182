//! Active-set registry - timers that currently have a tick scheduled
//!
//! Timers insert themselves when they activate and remove themselves when they
//! deactivate. Nothing else mutates the set; visibility handling and debug
//! introspection only read snapshots of it.

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::timers::Timer;

new_key_type! {
    /// Membership token of an active timer
    pub struct ActiveKey;
}

/// Collection of running timers
#[derive(Default)]
pub struct ActiveSet {
    timers: Mutex<SlotMap<ActiveKey, Timer>>,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, timer: Timer) -> ActiveKey {
        self.timers.lock().insert(timer)
    }

    pub(crate) fn remove(&self, key: ActiveKey) -> bool {
        self.timers.lock().remove(key).is_some()
    }

    /// Number of running timers
    pub fn len(&self) -> usize {
        self.timers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.lock().is_empty()
    }

    /// Handles to every running timer
    ///
    /// The lock is released before returning, so callers may operate on the
    /// timers freely.
    pub fn snapshot(&self) -> Vec<Timer> {
        self.timers.lock().values().cloned().collect()
    }
}
