//! Pausable timers driven by frame ticks
//!
//! Timers are advanced by a [`Clock`](frametick_clock::Clock) and can be
//! configured to:
//! - Fire once after a delay
//! - Repeat at an interval, a fixed number of times or forever
//! - Give up after a timeout of active time
//!
//! Every operation is idempotent and silently ignored when it does not apply,
//! e.g. pausing a timer that is not running.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use frametick_core::{repeat, TimerOptions};
//!
//! let timer = repeat(
//!     |index| println!("Tick {}", index),
//!     TimerOptions::new().count(5).interval(Duration::from_millis(50)),
//! );
//!
//! timer.pause();
//! timer.resume();
//! timer.stop();
//! ```

mod run;
mod timer;

use std::panic::Location;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

pub use timer::RunFlags;
pub(crate) use timer::{CallbackSlot, TimerState};

use crate::context::TimerContext;
use crate::kind::{Tagged, TimerKind};
use crate::options::{ResolvedOptions, TimerOptions};
use run::RunLoop;

/// Work function of a timer, called with the run index
pub type TimerCallback = Box<dyn FnMut(usize) + Send + 'static>;

/// Operations accepted by a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Work {
    /// Begin a fresh run, unless already running
    Start,
    /// Continue a paused run
    Continue,
    /// Suspend a running run, keeping its progress
    Pause,
    /// Stop then start
    Restart,
    /// End the run and report it as unfinished
    Stop,
    /// Stop and release everything for good
    Destroy,
}

/// Handle to a timer
///
/// Handles are cheap to clone and compare equal when they refer to the same
/// timer. A running timer stays alive while ticks are scheduled, even if every
/// handle is dropped.
#[derive(Clone)]
pub struct Timer {
    inner: Arc<TimerInner>,
}

/// Non-owning timer handle
#[derive(Clone)]
pub struct WeakTimer {
    inner: Weak<TimerInner>,
}

struct TimerInner {
    kind: TimerKind,
    options: ResolvedOptions,
    minimum: f64,
    context: TimerContext,
    state: Mutex<TimerState>,
    callback: CallbackSlot<dyn FnMut(usize) + Send>,
    after: CallbackSlot<dyn FnMut(bool) + Send>,
    error: CallbackSlot<dyn FnMut() + Send>,
}

impl Timer {
    pub(crate) fn new(
        context: TimerContext,
        kind: TimerKind,
        callback: TimerCallback,
        mut options: TimerOptions,
        trace: &'static Location<'static>,
    ) -> Self {
        let frame = context.frame_duration();
        let resolved = options.resolve(kind, frame, context.config().one_shot_timeout_ms);
        let (after, error) = options.take_callbacks();

        Self {
            inner: Arc::new(TimerInner {
                kind,
                options: resolved,
                minimum: resolved.minimum(frame),
                context,
                state: Mutex::new(TimerState::new(trace)),
                callback: CallbackSlot::new(Some(callback)),
                after: CallbackSlot::new(after),
                error: CallbackSlot::new(error),
            }),
        }
    }

    /// Start a fresh run _(if not running)_
    pub fn start(&self) -> &Self {
        self.work(Work::Start)
    }

    /// Continue the run _(if paused)_
    pub fn resume(&self) -> &Self {
        self.work(Work::Continue)
    }

    /// Pause the run _(if running)_
    pub fn pause(&self) -> &Self {
        self.work(Work::Pause)
    }

    /// Stop, then start a fresh run
    pub fn restart(&self) -> &Self {
        self.work(Work::Restart)
    }

    /// Stop the run _(if running or paused)_
    pub fn stop(&self) -> &Self {
        self.work(Work::Stop)
    }

    /// Stop the run and release every callback; the timer is unusable afterwards
    pub fn destroy(&self) -> &Self {
        self.work(Work::Destroy)
    }

    /// Apply one operation to the state machine
    pub fn work(&self, work: Work) -> &Self {
        match work {
            Work::Start => self.begin(false),
            Work::Continue => self.begin(true),
            Work::Pause => self.halt(),
            Work::Stop => self.end(),
            Work::Restart => {
                if !self.destroyed() {
                    self.end();
                    self.begin(false);
                }
            }
            Work::Destroy => self.teardown(),
        }
        self
    }

    fn begin(&self, resume: bool) {
        let inner = &*self.inner;
        let mut state = inner.state.lock();

        if state.flags.intersects(RunFlags::DESTROYED | RunFlags::ACTIVE) {
            return;
        }
        if resume && !state.flags.contains(RunFlags::PAUSED) {
            return;
        }
        if !resume {
            state.reset();
        }

        state.flags.remove(RunFlags::PAUSED);
        state.flags.insert(RunFlags::ACTIVE);
        state.run += 1;

        let run = RunLoop::new(self.clone(), &state);
        state.active_key = Some(inner.context.active_set().insert(self.clone()));
        state.tick = Some(run.schedule());

        tracing::debug!(
            "{} {} timer (index {}, {:.1}ms elapsed)",
            if resume { "Resumed" } else { "Started" },
            inner.kind,
            state.index,
            state.elapsed
        );
    }

    fn halt(&self) {
        let mut state = self.inner.state.lock();

        if !state.flags.contains(RunFlags::ACTIVE) {
            return;
        }

        self.inner.deactivate(&mut state);
        state.flags.insert(RunFlags::PAUSED);

        tracing::debug!(
            "Paused {} timer (index {}, {:.1}ms elapsed)",
            self.inner.kind,
            state.index,
            state.elapsed
        );
    }

    fn end(&self) {
        {
            let mut state = self.inner.state.lock();

            if !state.in_progress() {
                return;
            }

            self.inner.deactivate(&mut state);
            state.reset();
        }

        tracing::debug!("Stopped {} timer", self.inner.kind);
        self.inner.after.call(|after| after(false));
    }

    fn teardown(&self) {
        let in_progress = {
            let mut state = self.inner.state.lock();

            if state.flags.contains(RunFlags::DESTROYED) {
                return;
            }

            let in_progress = state.in_progress();
            self.inner.deactivate(&mut state);
            state.reset();
            state.flags = RunFlags::DESTROYED;
            state.trace = None;
            in_progress
        };

        self.inner.callback.release();
        if in_progress {
            self.inner.after.call(|after| after(false));
        }
        self.inner.after.release();
        self.inner.error.release();

        tracing::debug!("Destroyed {} timer", self.inner.kind);
    }

    /// Is a tick loop scheduled?
    pub fn active(&self) -> bool {
        self.inner.state.lock().flags.contains(RunFlags::ACTIVE)
    }

    /// Is the timer paused with its progress kept?
    pub fn paused(&self) -> bool {
        self.inner.state.lock().flags.contains(RunFlags::PAUSED)
    }

    /// Has the timer been destroyed?
    pub fn destroyed(&self) -> bool {
        self.inner.state.lock().flags.contains(RunFlags::DESTROYED)
    }

    /// Current run flags
    pub fn flags(&self) -> RunFlags {
        self.inner.state.lock().flags
    }

    /// Active milliseconds since the last start
    pub fn elapsed(&self) -> f64 {
        self.inner.state.lock().elapsed
    }

    /// Completed runs since the last start
    pub fn index(&self) -> usize {
        self.inner.state.lock().index
    }

    /// Resolved options of this timer
    pub fn options(&self) -> &ResolvedOptions {
        &self.inner.options
    }

    /// Where the timer was created, while debugging is enabled
    pub fn trace(&self) -> Option<&'static Location<'static>> {
        if !self.inner.context.is_debug() {
            return None;
        }
        self.inner.state.lock().trace
    }

    /// Context the timer belongs to
    pub fn context(&self) -> &TimerContext {
        &self.inner.context
    }

    pub fn downgrade(&self) -> WeakTimer {
        WeakTimer {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl TimerInner {
    /// Cancel the scheduled tick and leave the active set
    ///
    /// Clears `ACTIVE` and `PAUSED` and invalidates any tick already in flight.
    fn deactivate(&self, state: &mut TimerState) {
        if let Some(tick) = state.tick.take() {
            self.context.clock().cancel_tick(tick);
        }
        if let Some(key) = state.active_key.take() {
            self.context.active_set().remove(key);
        }
        state.flags.remove(RunFlags::ACTIVE | RunFlags::PAUSED);
        state.run += 1;
    }
}

impl WeakTimer {
    pub fn upgrade(&self) -> Option<Timer> {
        self.inner.upgrade().map(|inner| Timer { inner })
    }
}

impl Tagged for Timer {
    fn kind(&self) -> TimerKind {
        self.inner.kind
    }
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Timer {}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Timer")
            .field("kind", &self.inner.kind)
            .field("flags", &state.flags)
            .field("index", &state.index)
            .field("elapsed", &state.elapsed)
            .field("options", &self.inner.options)
            .finish()
    }
}
