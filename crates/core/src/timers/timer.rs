//! Timer state, run flags and callback slots

use std::panic::Location;

use bitflags::bitflags;
use parking_lot::Mutex;

use frametick_clock::TickHandle;

use crate::registry::ActiveKey;

bitflags! {
    /// Run state of a timer
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct RunFlags: u8 {
        /// A tick loop is scheduled
        const ACTIVE = 0x01;
        /// Paused with progress preserved
        const PAUSED = 0x02;
        /// Torn down for good
        const DESTROYED = 0x04;
    }
}

/// Mutable state of one timer, only touched by the state machine
#[derive(Debug, Default)]
pub(crate) struct TimerState {
    pub flags: RunFlags,
    /// Active time since the last full reset (ms)
    pub elapsed: f64,
    /// Progress inside the current interval (ms)
    pub partial: f64,
    /// Completed runs since the last full reset
    pub index: usize,
    /// Currently requested tick
    pub tick: Option<TickHandle>,
    /// Generation of the live tick loop; bumped on every (re)activation and teardown
    pub run: u64,
    /// Membership in the active set
    pub active_key: Option<ActiveKey>,
    /// Constructor call site
    pub trace: Option<&'static Location<'static>>,
}

impl TimerState {
    pub fn new(trace: &'static Location<'static>) -> Self {
        Self {
            trace: Some(trace),
            ..Self::default()
        }
    }

    /// A run is in progress, either ticking or paused
    pub fn in_progress(&self) -> bool {
        self.flags.intersects(RunFlags::ACTIVE | RunFlags::PAUSED)
    }

    /// Forget all progress
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.partial = 0.0;
        self.index = 0;
    }
}

/// A user callback that can be invoked reentrantly and released
///
/// The callback is moved out of the slot while it runs, so no lock is held
/// during the call. A nested invocation of the same slot is skipped.
pub(crate) struct CallbackSlot<F: ?Sized> {
    inner: Mutex<SlotInner<F>>,
}

struct SlotInner<F: ?Sized> {
    callback: Option<Box<F>>,
    released: bool,
}

impl<F: ?Sized> CallbackSlot<F> {
    pub fn new(callback: Option<Box<F>>) -> Self {
        Self {
            inner: Mutex::new(SlotInner {
                callback,
                released: false,
            }),
        }
    }

    /// Run `f` with the callback, if it is present and not already running
    ///
    /// The callback goes back into the slot afterwards, even if it panicked.
    pub fn call<R>(&self, f: impl FnOnce(&mut F) -> R) -> Option<R> {
        let callback = self.inner.lock().callback.take()?;
        let mut restore = Restore {
            inner: &self.inner,
            callback: Some(callback),
        };
        let callback = restore.callback.as_mut()?;
        Some(f(&mut **callback))
    }

    /// Drop the callback for good
    pub fn release(&self) {
        let mut inner = self.inner.lock();
        inner.released = true;
        inner.callback = None;
    }
}

struct Restore<'a, F: ?Sized> {
    inner: &'a Mutex<SlotInner<F>>,
    callback: Option<Box<F>>,
}

impl<F: ?Sized> Drop for Restore<'_, F> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        if !inner.released && inner.callback.is_none() {
            inner.callback = self.callback.take();
        }
    }
}
