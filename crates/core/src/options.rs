//! Timer options and their resolution
//!
//! Options are permissive: anything out of range silently falls back to the
//! default for the timer kind. Strict constructors call [`TimerOptions::validate`]
//! first to report bad values instead.

use std::time::Duration;

use serde::Serialize;

use crate::error::{TimerError, TimerResult};
use crate::kind::TimerKind;

/// Default timeout for one-shot timers
pub const DEFAULT_TIMEOUT_MS: f64 = 30_000.0;

/// Called once per finished run with `true` when the run completed
pub type AfterCallback = Box<dyn FnMut(bool) + Send + 'static>;

/// Called when a run times out, before the after callback
pub type ErrorCallback = Box<dyn FnMut() + Send + 'static>;

/// User-supplied timer options
///
/// # Example
///
/// ```ignore
/// let options = TimerOptions::new()
///     .count(5)
///     .interval(Duration::from_millis(50))
///     .on_after(|finished| tracing::info!("done: {}", finished));
/// ```
#[derive(Default)]
pub struct TimerOptions {
    count: Option<usize>,
    interval: Option<f64>,
    timeout: Option<f64>,
    after: Option<AfterCallback>,
    error: Option<ErrorCallback>,
}

impl TimerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the callback runs
    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Time between runs (or the delay of a one-shot timer)
    pub fn interval(self, interval: Duration) -> Self {
        self.interval_ms(duration_ms(interval))
    }

    /// Time between runs in milliseconds
    pub fn interval_ms(mut self, interval: f64) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Active time after which the run is abandoned
    pub fn timeout(self, timeout: Duration) -> Self {
        self.timeout_ms(duration_ms(timeout))
    }

    /// Timeout in milliseconds
    pub fn timeout_ms(mut self, timeout: f64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Never time out, even for one-shot timers
    pub fn no_timeout(self) -> Self {
        self.timeout_ms(f64::INFINITY)
    }

    /// Callback for the end of every run
    pub fn on_after<F>(mut self, callback: F) -> Self
    where
        F: FnMut(bool) + Send + 'static,
    {
        self.after = Some(Box::new(callback));
        self
    }

    /// Callback for a timed out run
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.error = Some(Box::new(callback));
        self
    }

    /// Report supplied values that [`resolve`](Self::resolve) would discard
    /// as invalid rather than merely out of range
    pub fn validate(&self) -> TimerResult<()> {
        if self.count == Some(0) {
            return Err(TimerError::InvalidCount(0));
        }
        if let Some(interval) = self.interval {
            if interval.is_nan() || interval < 0.0 {
                return Err(TimerError::InvalidInterval(interval));
            }
        }
        if let Some(timeout) = self.timeout {
            if timeout.is_nan() || timeout <= 0.0 {
                return Err(TimerError::InvalidTimeout(timeout));
            }
        }
        Ok(())
    }

    /// Fill in defaults for `kind`
    ///
    /// # Arguments
    /// * `frame_ms` - Nominal frame duration, the default and minimum interval
    /// * `one_shot_timeout_ms` - Default timeout for waiting timers
    pub fn resolve(&self, kind: TimerKind, frame_ms: f64, one_shot_timeout_ms: f64) -> ResolvedOptions {
        let repeating = kind.is_repeating();

        let count = match self.count {
            Some(count) if count > 0 => Some(count),
            _ if repeating => None,
            _ => Some(1),
        };

        let interval_ms = match self.interval {
            Some(interval) if interval > frame_ms => interval,
            _ => frame_ms,
        };

        let timeout_ms = match self.timeout {
            Some(timeout) if timeout > 0.0 => timeout,
            _ if repeating => f64::INFINITY,
            _ => one_shot_timeout_ms,
        };

        ResolvedOptions {
            count,
            interval_ms,
            timeout_ms,
        }
    }

    pub(crate) fn take_callbacks(&mut self) -> (Option<AfterCallback>, Option<ErrorCallback>) {
        (self.after.take(), self.error.take())
    }
}

impl std::fmt::Debug for TimerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerOptions")
            .field("count", &self.count)
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .field("after", &self.after.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// Options for a conditional timer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WhenOptions {
    count: Option<usize>,
    interval: Option<f64>,
    timeout: Option<f64>,
}

impl WhenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the condition is checked
    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Time between condition checks
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(duration_ms(interval));
        self
    }

    /// Active time after which the completion is rejected
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(duration_ms(timeout));
        self
    }

    pub(crate) fn into_timer_options(self) -> TimerOptions {
        TimerOptions {
            count: self.count,
            interval: self.interval,
            timeout: self.timeout,
            after: None,
            error: None,
        }
    }
}

/// Fully defaulted options of a constructed timer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedOptions {
    /// Number of runs, `None` when unbounded
    pub count: Option<usize>,
    /// Milliseconds between runs
    pub interval_ms: f64,
    /// Timeout in milliseconds, infinite when unbounded
    pub timeout_ms: f64,
}

impl ResolvedOptions {
    /// Tick threshold treated as a full interval
    ///
    /// Half a frame of slack absorbs timestamp jitter without drifting.
    pub fn minimum(&self, frame_ms: f64) -> f64 {
        self.interval_ms - frame_ms / 2.0
    }

    /// Time the remaining runs need, given progress so far
    pub(crate) fn remaining(&self, index: usize, partial: f64) -> f64 {
        match self.count {
            Some(count) => count.saturating_sub(index) as f64 * self.interval_ms - partial,
            None => f64::INFINITY,
        }
    }
}

pub(crate) fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f64 = 1000.0 / 60.0;

    #[test]
    fn test_repeat_defaults() {
        let resolved = TimerOptions::new().resolve(TimerKind::Repeat, FRAME, DEFAULT_TIMEOUT_MS);
        assert_eq!(resolved.count, None);
        assert_eq!(resolved.interval_ms, FRAME);
        assert!(resolved.timeout_ms.is_infinite());
    }

    #[test]
    fn test_wait_defaults() {
        let resolved = TimerOptions::new().resolve(TimerKind::Wait, FRAME, DEFAULT_TIMEOUT_MS);
        assert_eq!(resolved.count, Some(1));
        assert_eq!(resolved.interval_ms, FRAME);
        assert_eq!(resolved.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let resolved = TimerOptions::new()
            .count(0)
            .interval_ms(-5.0)
            .timeout_ms(0.0)
            .resolve(TimerKind::Wait, FRAME, DEFAULT_TIMEOUT_MS);

        assert_eq!(resolved.count, Some(1));
        assert_eq!(resolved.interval_ms, FRAME);
        assert_eq!(resolved.timeout_ms, DEFAULT_TIMEOUT_MS);

        // Intervals must exceed one frame
        let resolved = TimerOptions::new()
            .interval_ms(FRAME)
            .resolve(TimerKind::Repeat, FRAME, DEFAULT_TIMEOUT_MS);
        assert_eq!(resolved.interval_ms, FRAME);

        let resolved = TimerOptions::new()
            .interval_ms(f64::NAN)
            .timeout_ms(f64::NAN)
            .resolve(TimerKind::Repeat, FRAME, DEFAULT_TIMEOUT_MS);
        assert_eq!(resolved.interval_ms, FRAME);
        assert!(resolved.timeout_ms.is_infinite());
    }

    #[test]
    fn test_supplied_values_kept() {
        let resolved = TimerOptions::new()
            .count(5)
            .interval(Duration::from_millis(50))
            .timeout(Duration::from_secs(1))
            .resolve(TimerKind::Repeat, FRAME, DEFAULT_TIMEOUT_MS);

        assert_eq!(resolved.count, Some(5));
        assert_eq!(resolved.interval_ms, 50.0);
        assert_eq!(resolved.timeout_ms, 1000.0);
        assert_eq!(resolved.remaining(2, 10.0), 140.0);
    }

    #[test]
    fn test_no_timeout_for_wait() {
        let resolved = TimerOptions::new()
            .no_timeout()
            .resolve(TimerKind::Wait, FRAME, DEFAULT_TIMEOUT_MS);
        assert!(resolved.timeout_ms.is_infinite());
    }

    #[test]
    fn test_validate() {
        assert!(TimerOptions::new().validate().is_ok());
        assert!(TimerOptions::new().interval_ms(5.0).validate().is_ok());
        assert_eq!(
            TimerOptions::new().count(0).validate(),
            Err(TimerError::InvalidCount(0))
        );
        assert_eq!(
            TimerOptions::new().interval_ms(-1.0).validate(),
            Err(TimerError::InvalidInterval(-1.0))
        );
        assert_eq!(
            TimerOptions::new().timeout_ms(0.0).validate(),
            Err(TimerError::InvalidTimeout(0.0))
        );
    }

    #[test]
    fn test_when_options_convert() {
        let resolved = WhenOptions::new()
            .count(3)
            .interval(Duration::from_millis(25))
            .into_timer_options()
            .resolve(TimerKind::When, FRAME, DEFAULT_TIMEOUT_MS);

        assert_eq!(resolved.count, Some(3));
        assert_eq!(resolved.interval_ms, 25.0);
        assert!(resolved.timeout_ms.is_infinite());
    }

    #[test]
    fn test_minimum() {
        let resolved = TimerOptions::new()
            .interval_ms(100.0)
            .resolve(TimerKind::Wait, 20.0, DEFAULT_TIMEOUT_MS);
        assert_eq!(resolved.minimum(20.0), 90.0);
    }
}
