//! Fixed-rate fallback driver
//!
//! Pumps a [`FrameClock`] from a background thread when the host has no frame
//! callback of its own. Timestamps are milliseconds since the driver started.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};

use crate::{Clock, ClockError, FrameClock};

/// Background thread ticking a clock once per period
///
/// The thread stops when the driver is stopped or dropped.
pub struct FixedRateDriver {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl FixedRateDriver {
    /// Drive `clock` at its own frame duration
    pub fn spawn(clock: Arc<FrameClock>) -> Result<Self, ClockError> {
        let period = Duration::from_secs_f64(clock.frame_duration() / 1000.0);
        Self::with_period(clock, period)
    }

    /// Drive `clock` with an explicit period between frames
    pub fn with_period(clock: Arc<FrameClock>, period: Duration) -> Result<Self, ClockError> {
        let (sender, receiver) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("frametick-driver".to_string())
            .spawn(move || {
                let epoch = Instant::now();
                tracing::debug!("Fixed-rate driver started ({:?} period)", period);

                loop {
                    match receiver.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {
                            clock.tick(epoch.elapsed().as_secs_f64() * 1000.0);
                        }
                        // Explicit stop or every sender dropped
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                tracing::debug!("Fixed-rate driver stopped");
            })?;

        Ok(Self {
            shutdown: Some(sender),
            handle: Some(handle),
        })
    }

    /// Stop the driver and wait for its thread to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(sender) = self.shutdown.take() {
            let _ = sender.try_send(());
        }

        if let Some(handle) = self.handle.take() {
            // Dropped from inside a tick callback: the thread exits on its own
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                tracing::error!("Fixed-rate driver thread panicked");
            }
        }
    }
}

impl Drop for FixedRateDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}
