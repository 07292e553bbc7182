//! Deterministic clock harness and callback recorders for unit tests

use std::sync::Arc;

use parking_lot::Mutex;

use frametick_clock::{Clock, FrameClock, TickCallback, TickHandle};

use crate::config::TimerConfig;
use crate::context::TimerContext;

/// Frame step used by [`Harness::run_until`]
pub const STEP_MS: f64 = 16.0;

/// A private context pumped by hand
pub struct Harness {
    pub clock: Arc<FrameClock>,
    pub context: TimerContext,
    now: Mutex<f64>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(TimerConfig::default())
    }

    pub fn with_config(config: TimerConfig) -> Self {
        let clock = Arc::new(FrameClock::new());
        let context = TimerContext::with_config(clock.clone(), config);
        Self {
            clock,
            context,
            now: Mutex::new(0.0),
        }
    }

    /// Harness whose clock ignores cancellation, as if every tick were already in flight
    pub fn uncancellable() -> Self {
        let clock = Arc::new(FrameClock::new());
        let context = TimerContext::new(Arc::new(UncancellableClock {
            inner: clock.clone(),
        }));
        Self {
            clock,
            context,
            now: Mutex::new(0.0),
        }
    }

    /// Run one frame at `timestamp`
    pub fn tick(&self, timestamp: f64) {
        *self.now.lock() = timestamp;
        self.clock.tick(timestamp);
    }

    /// Run frames every [`STEP_MS`] up to and including `end`
    pub fn run_until(&self, end: f64) {
        loop {
            let next = *self.now.lock() + STEP_MS;
            if next > end {
                break;
            }
            self.tick(next);
        }
    }
}

struct UncancellableClock {
    inner: Arc<FrameClock>,
}

impl Clock for UncancellableClock {
    fn request_tick(&self, callback: TickCallback) -> TickHandle {
        self.inner.request_tick(callback)
    }

    fn cancel_tick(&self, _handle: TickHandle) {}

    fn frame_duration(&self) -> f64 {
        self.inner.frame_duration()
    }
}

/// Collects what callbacks were called with
#[derive(Clone, Default)]
pub struct Recorder {
    values: Arc<Mutex<Vec<usize>>>,
    flags: Arc<Mutex<Vec<bool>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indexed(&self) -> impl FnMut(usize) + Send + 'static {
        let values = self.values.clone();
        move |index| values.lock().push(index)
    }

    pub fn plain(&self) -> impl FnMut() + Send + 'static {
        let values = self.values.clone();
        move || {
            let mut values = values.lock();
            let next = values.len();
            values.push(next);
        }
    }

    pub fn flag(&self) -> impl FnMut(bool) + Send + 'static {
        let flags = self.flags.clone();
        move |flag| flags.lock().push(flag)
    }

    pub fn values(&self) -> Vec<usize> {
        self.values.lock().clone()
    }

    pub fn flags(&self) -> Vec<bool> {
        self.flags.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }
}
