//! Timer context - clock, active set, debug flag and configuration
//!
//! Every timer belongs to exactly one context. Contexts are independent: each
//! has its own clock and its own registry of running timers. Most programs
//! only need the process-wide context behind [`global()`], pumped with
//! [`on_frame`] once per frame.

use std::fmt::Display;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use parking_lot::Mutex;

use frametick_clock::{Clock, FrameClock};

use crate::config::TimerConfig;
use crate::error::TimerResult;
use crate::kind::TimerKind;
use crate::options::{TimerOptions, WhenOptions};
use crate::registry::ActiveSet;
use crate::settle::Completion;
use crate::timers::{Timer, WeakTimer};
use crate::when::When;

/// Shared handle to a timer context
#[derive(Clone)]
pub struct TimerContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    clock: Arc<dyn Clock>,
    config: TimerConfig,
    active: ActiveSet,
    debug: AtomicBool,
    hidden: Mutex<Option<Vec<WeakTimer>>>,
}

impl TimerContext {
    /// Create a context driven by `clock` with default configuration
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_config(clock, TimerConfig::default())
    }

    /// Create a context driven by `clock`
    ///
    /// The debug flag starts out as `config.debug`.
    pub fn with_config(clock: Arc<dyn Clock>, config: TimerConfig) -> Self {
        let debug = config.debug;
        Self {
            inner: Arc::new(ContextInner {
                clock,
                config,
                active: ActiveSet::new(),
                debug: AtomicBool::new(debug),
                hidden: Mutex::new(None),
            }),
        }
    }

    /// Clock driving this context's timers
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    /// Nominal frame duration of the clock in milliseconds
    pub fn frame_duration(&self) -> f64 {
        self.inner.clock.frame_duration()
    }

    pub fn config(&self) -> &TimerConfig {
        &self.inner.config
    }

    /// Timers of this context that currently have a tick scheduled
    pub fn active_set(&self) -> &ActiveSet {
        &self.inner.active
    }

    /// Enable or disable debug introspection
    pub fn set_debug(&self, enabled: bool) {
        self.inner.debug.store(enabled, Ordering::Relaxed);
    }

    pub fn is_debug(&self) -> bool {
        self.inner.debug.load(Ordering::Relaxed)
    }

    pub(crate) fn hidden(&self) -> &Mutex<Option<Vec<WeakTimer>>> {
        &self.inner.hidden
    }

    /// Create and start a repeating timer
    ///
    /// - `options.count` defaults to unbounded
    /// - `options.interval` defaults to one frame
    /// - `options.timeout` defaults to unbounded
    #[track_caller]
    pub fn repeat<F>(&self, callback: F, options: TimerOptions) -> Timer
    where
        F: FnMut(usize) + Send + 'static,
    {
        let timer = Timer::new(
            self.clone(),
            TimerKind::Repeat,
            Box::new(callback),
            options,
            Location::caller(),
        );
        timer.start();
        timer
    }

    /// Create and start a one-shot timer
    ///
    /// - `options.count` defaults to 1
    /// - `options.interval` (the delay) defaults to one frame
    /// - `options.timeout` defaults to the configured one-shot timeout
    #[track_caller]
    pub fn wait<F>(&self, mut callback: F, options: TimerOptions) -> Timer
    where
        F: FnMut() + Send + 'static,
    {
        let timer = Timer::new(
            self.clone(),
            TimerKind::Wait,
            Box::new(move |_: usize| callback()),
            options,
            Location::caller(),
        );
        timer.start();
        timer
    }

    /// Create and start a one-shot timer firing after `delay`
    #[track_caller]
    pub fn wait_for<F>(&self, callback: F, delay: Duration) -> Timer
    where
        F: FnMut() + Send + 'static,
    {
        self.wait(callback, TimerOptions::new().interval(delay))
    }

    /// Like [`repeat`](Self::repeat), but reject invalid options instead of
    /// falling back to defaults
    #[track_caller]
    pub fn try_repeat<F>(&self, callback: F, options: TimerOptions) -> TimerResult<Timer>
    where
        F: FnMut(usize) + Send + 'static,
    {
        options.validate()?;
        Ok(self.repeat(callback, options))
    }

    /// Like [`wait`](Self::wait), but reject invalid options instead of
    /// falling back to defaults
    #[track_caller]
    pub fn try_wait<F>(&self, callback: F, options: TimerOptions) -> TimerResult<Timer>
    where
        F: FnMut() + Send + 'static,
    {
        options.validate()?;
        Ok(self.wait(callback, options))
    }

    /// Create a conditional timer, checking `condition` once per interval
    ///
    /// Nothing runs until [`When::start`] or [`When::start_with`] is called.
    #[track_caller]
    pub fn when<P>(&self, mut condition: P, options: WhenOptions) -> When
    where
        P: FnMut() -> bool + Send + 'static,
    {
        When::new(self, move || Ok(condition()), options, Location::caller())
    }

    /// Create a conditional timer whose condition can fail
    ///
    /// A failing condition stops the timer and rejects with
    /// [`Rejection::Failed`](crate::Rejection::Failed).
    #[track_caller]
    pub fn try_when<P, E>(&self, mut condition: P, options: WhenOptions) -> When
    where
        P: FnMut() -> Result<bool, E> + Send + 'static,
        E: Display,
    {
        When::new(
            self,
            move || condition().map_err(|error| error.to_string()),
            options,
            Location::caller(),
        )
    }

    /// Completion that resolves after `duration`
    ///
    /// Rejects with [`Rejection::TimedOut`](crate::Rejection::TimedOut) if
    /// `timeout` elapses first.
    #[track_caller]
    pub fn delay(&self, duration: Duration, timeout: Option<Duration>) -> Completion {
        crate::delay::delay(self, duration, timeout, Location::caller())
    }
}

impl std::fmt::Debug for TimerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerContext")
            .field("frame_duration", &self.frame_duration())
            .field("active", &self.inner.active.len())
            .field("debug", &self.is_debug())
            .finish()
    }
}

/// Process-wide context and the frame clock driving it
struct Global {
    clock: Arc<FrameClock>,
    context: TimerContext,
}

static GLOBAL: LazyLock<Global> = LazyLock::new(|| {
    let clock = Arc::new(FrameClock::new());
    let context = TimerContext::new(clock.clone());
    Global { clock, context }
});

/// The process-wide context
pub fn global() -> &'static TimerContext {
    &GLOBAL.context
}

/// Frame clock of the process-wide context
pub fn global_clock() -> &'static Arc<FrameClock> {
    &GLOBAL.clock
}

/// Advance the process-wide context by one frame
///
/// Call from the host's frame callback with a monotonic timestamp in
/// milliseconds. Returns the number of tick callbacks that ran.
pub fn on_frame(timestamp: f64) -> usize {
    GLOBAL.clock.tick(timestamp)
}

/// Create and start a repeating timer on the process-wide context
#[track_caller]
pub fn repeat<F>(callback: F, options: TimerOptions) -> Timer
where
    F: FnMut(usize) + Send + 'static,
{
    global().repeat(callback, options)
}

/// Create and start a one-shot timer on the process-wide context
#[track_caller]
pub fn wait<F>(callback: F, options: TimerOptions) -> Timer
where
    F: FnMut() + Send + 'static,
{
    global().wait(callback, options)
}

/// Create and start a one-shot timer firing after `delay` on the process-wide context
#[track_caller]
pub fn wait_for<F>(callback: F, delay: Duration) -> Timer
where
    F: FnMut() + Send + 'static,
{
    global().wait_for(callback, delay)
}

/// Create a conditional timer on the process-wide context
#[track_caller]
pub fn when<P>(condition: P, options: WhenOptions) -> When
where
    P: FnMut() -> bool + Send + 'static,
{
    global().when(condition, options)
}

/// Create a fallible conditional timer on the process-wide context
#[track_caller]
pub fn try_when<P, E>(condition: P, options: WhenOptions) -> When
where
    P: FnMut() -> Result<bool, E> + Send + 'static,
    E: Display,
{
    global().try_when(condition, options)
}

/// Completion on the process-wide context that resolves after `duration`
#[track_caller]
pub fn delay(duration: Duration, timeout: Option<Duration>) -> Completion {
    global().delay(duration, timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimerError;
    use crate::kind::{is_repeated, is_waited};
    use crate::testing::{Harness, Recorder};

    #[test]
    fn test_factories_tag_and_start() {
        let harness = Harness::new();

        let repeated = harness.context.repeat(|_| {}, TimerOptions::new());
        let waited = harness.context.wait_for(|| {}, Duration::from_millis(100));

        assert!(is_repeated(&repeated));
        assert!(is_waited(&waited));
        assert!(repeated.active() && waited.active());
        assert_eq!(waited.options().interval_ms, 100.0);
        assert_eq!(harness.context.active_set().len(), 2);

        repeated.destroy();
        waited.destroy();
    }

    #[test]
    fn test_strict_constructors() {
        let harness = Harness::new();

        let result = harness.context.try_repeat(|_| {}, TimerOptions::new().count(0));
        assert_eq!(result.unwrap_err(), TimerError::InvalidCount(0));

        let result = harness.context.try_wait(|| {}, TimerOptions::new().interval_ms(-10.0));
        assert_eq!(result.unwrap_err(), TimerError::InvalidInterval(-10.0));

        let result = harness.context.try_wait(|| {}, TimerOptions::new().timeout_ms(-1.0));
        assert_eq!(result.unwrap_err(), TimerError::InvalidTimeout(-1.0));

        // Nothing was registered for rejected options
        assert!(harness.context.active_set().is_empty());

        let timer = harness
            .context
            .try_wait(|| {}, TimerOptions::new().interval_ms(5.0))
            .unwrap();
        assert_eq!(timer.options().interval_ms, harness.context.frame_duration());
        timer.destroy();
    }

    #[test]
    fn test_config_timeout_applies_to_wait() {
        let config = TimerConfig {
            one_shot_timeout_ms: 50.0,
            ..TimerConfig::default()
        };
        let harness = Harness::with_config(config);
        let hits = Recorder::new();
        let errors = Recorder::new();

        harness.context.wait(
            hits.plain(),
            TimerOptions::new().interval_ms(500.0).on_error(errors.plain()),
        );

        harness.run_until(1000.0);
        assert_eq!(hits.len(), 0);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_contexts_are_independent() {
        let first = Harness::new();
        let second = Harness::new();
        let hits = Recorder::new();

        first.context.repeat(hits.indexed(), TimerOptions::new().count(2));

        second.run_until(200.0);
        assert_eq!(hits.len(), 0);
        assert!(second.context.active_set().is_empty());

        first.run_until(200.0);
        assert_eq!(hits.values(), vec![0, 1]);
    }

    #[test]
    fn test_debug_flag_from_config() {
        let config = TimerConfig {
            debug: true,
            ..TimerConfig::default()
        };
        let harness = Harness::with_config(config);
        assert!(harness.context.is_debug());

        harness.context.set_debug(false);
        assert!(!harness.context.is_debug());
    }
}
