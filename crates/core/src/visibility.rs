//! Host visibility integration
//!
//! While the host is hidden every timer that was running is paused; when it
//! becomes visible again exactly those timers are resumed. Timers started
//! while hidden are left alone. The hidden set only holds weak handles, so
//! timers dropped or destroyed while hidden are not kept alive.

use crate::context::TimerContext;
use crate::timers::{Timer, WeakTimer};

impl TimerContext {
    /// Report a host visibility change
    ///
    /// Returns the number of timers paused (when hiding) or resumed (when
    /// showing). Repeated reports of the same state do nothing.
    pub fn set_hidden(&self, hidden: bool) -> usize {
        if hidden {
            let mut held = self.hidden().lock();
            if held.is_some() {
                return 0;
            }

            let timers = self.active_set().snapshot();
            for timer in &timers {
                timer.pause();
            }
            tracing::debug!("Host hidden, paused {} timers", timers.len());

            let count = timers.len();
            *held = Some(timers.iter().map(Timer::downgrade).collect());
            count
        } else {
            let Some(held) = self.hidden().lock().take() else {
                return 0;
            };

            let mut resumed = 0;
            for timer in held.iter().filter_map(WeakTimer::upgrade) {
                if timer.destroyed() {
                    continue;
                }
                timer.resume();
                resumed += 1;
            }
            tracing::debug!("Host visible, resumed {} timers", resumed);
            resumed
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden().lock().is_some()
    }
}
