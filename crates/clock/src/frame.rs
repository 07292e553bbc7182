//! Frame clock
//!
//! A tick source shaped like an animation-frame callback: callers request a
//! single callback for the next frame and get back a handle that can cancel it.
//! The host pumps the clock once per frame with a monotonic timestamp.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::ClockError;

/// Nominal frame duration in milliseconds (60 frames per second)
pub const FRAME_DURATION_MS: f64 = 1000.0 / 60.0;

new_key_type! {
    /// Handle for a requested tick, used for cancellation
    pub struct TickHandle;
}

/// Callback invoked once with the frame timestamp (milliseconds)
pub type TickCallback = Box<dyn FnOnce(f64) + Send + 'static>;

/// A source of frame ticks.
///
/// Implementations call each requested callback at most once, on a later
/// frame, with a timestamp that never decreases. Cancelling a handle that
/// already fired or was already cancelled is a no-op.
pub trait Clock: Send + Sync {
    /// Request `callback` to run on the next frame
    fn request_tick(&self, callback: TickCallback) -> TickHandle;

    /// Cancel a previously requested tick
    fn cancel_tick(&self, handle: TickHandle);

    /// Nominal duration of one frame in milliseconds
    fn frame_duration(&self) -> f64 {
        FRAME_DURATION_MS
    }
}

/// Host-pumped frame clock
///
/// Callbacks requested while a frame is being processed run on the next
/// frame, never on the current one.
pub struct FrameClock {
    pending: Mutex<SlotMap<TickHandle, TickCallback>>,
    frame_duration: f64,
    last_timestamp: Mutex<Option<f64>>,
    frame_count: AtomicU64,
    last_frame_time_ns: AtomicU64,
}

impl FrameClock {
    /// Create a clock with the nominal 60 Hz frame duration
    pub fn new() -> Self {
        Self::with_frame_duration(FRAME_DURATION_MS)
    }

    /// Create a clock for a given frame rate in Hz
    pub fn with_frame_rate(rate: f64) -> Result<Self, ClockError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ClockError::InvalidFrameRate(rate));
        }
        Ok(Self::with_frame_duration(1000.0 / rate))
    }

    fn with_frame_duration(frame_duration: f64) -> Self {
        Self {
            pending: Mutex::new(SlotMap::with_key()),
            frame_duration,
            last_timestamp: Mutex::new(None),
            frame_count: AtomicU64::new(0),
            last_frame_time_ns: AtomicU64::new(0),
        }
    }

    /// Run every callback that was pending when the frame began
    ///
    /// # Arguments
    /// * `timestamp` - Frame time in milliseconds. Values lower than the
    ///   previous frame's timestamp are clamped to it.
    ///
    /// # Returns
    /// The number of callbacks that ran
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn tick(&self, timestamp: f64) -> usize {
        let started = Instant::now();
        let timestamp = self.monotonic(timestamp);
        let frame = self.frame_count.fetch_add(1, Ordering::Relaxed) + 1;

        // Drain first so callbacks can request their next tick without deadlocking
        let due: Vec<TickCallback> = self.pending.lock().drain().map(|(_, cb)| cb).collect();
        let count = due.len();

        for callback in due {
            callback(timestamp);
        }

        let elapsed = started.elapsed().as_nanos() as u64;
        self.last_frame_time_ns.store(elapsed, Ordering::Relaxed);

        if elapsed as f64 > self.frame_duration * 1_000_000.0 {
            tracing::warn!(
                "Frame {} took {:.2}ms ({} callbacks)",
                frame,
                elapsed as f64 / 1_000_000.0,
                count
            );
        }

        count
    }

    fn monotonic(&self, timestamp: f64) -> f64 {
        let mut last = self.last_timestamp.lock();
        let timestamp = match *last {
            Some(previous) if timestamp.is_nan() || timestamp < previous => {
                tracing::warn!(
                    "Clamping non-monotonic frame timestamp {} to {}",
                    timestamp,
                    previous
                );
                previous
            }
            None if timestamp.is_nan() => 0.0,
            _ => timestamp,
        };
        *last = Some(timestamp);
        timestamp
    }

    /// Number of callbacks waiting for the next frame
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Number of frames processed so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    /// Timestamp of the most recent frame
    pub fn last_timestamp(&self) -> Option<f64> {
        *self.last_timestamp.lock()
    }

    /// Processing time of the most recent frame in nanoseconds
    pub fn last_frame_time_ns(&self) -> u64 {
        self.last_frame_time_ns.load(Ordering::Relaxed)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FrameClock {
    fn request_tick(&self, callback: TickCallback) -> TickHandle {
        self.pending.lock().insert(callback)
    }

    fn cancel_tick(&self, handle: TickHandle) {
        self.pending.lock().remove(handle);
    }

    fn frame_duration(&self) -> f64 {
        self.frame_duration
    }
}
