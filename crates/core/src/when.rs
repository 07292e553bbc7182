//! Conditional timers
//!
//! A [`When`] polls a condition once per interval on a repeating timer and
//! settles a [`Completion`] the first time the condition holds. It rejects
//! when the timer is stopped, times out, runs out of checks or the condition
//! fails or panics. The condition is never evaluated again after a verdict.
//!
//! The underlying timer destroys itself as soon as the completion settles.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe, Location};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::context::TimerContext;
use crate::error::{Rejection, TimerError, TimerResult};
use crate::kind::{Tagged, TimerKind};
use crate::options::WhenOptions;
use crate::settle::{Completion, Outcome, Settlement};
use crate::timers::{Timer, WeakTimer};

/// Condition polled by a [`When`]; `Err` fails the completion
pub type Condition = Box<dyn FnMut() -> Result<bool, String> + Send + 'static>;

/// Conditional timer settling a single completion
pub struct When {
    timer: Timer,
    settlement: Arc<Settlement>,
    started: AtomicBool,
}

impl When {
    pub(crate) fn new<P>(
        context: &TimerContext,
        condition: P,
        options: WhenOptions,
        trace: &'static Location<'static>,
    ) -> Self
    where
        P: FnMut() -> Result<bool, String> + Send + 'static,
    {
        let mut condition: Condition = Box::new(condition);
        let settlement = Settlement::new();
        let verdict: Arc<Mutex<Option<Outcome>>> = Arc::default();
        let handle: Arc<OnceLock<WeakTimer>> = Arc::default();

        let check = {
            let verdict = verdict.clone();
            let handle = handle.clone();
            move |_index: usize| {
                if verdict.lock().is_some() {
                    return;
                }
                let checked = panic::catch_unwind(AssertUnwindSafe(|| condition()));
                let outcome = match checked {
                    Ok(Ok(false)) => return,
                    Ok(Ok(true)) => Ok(()),
                    Ok(Err(message)) => Err(Rejection::Failed(message)),
                    Err(payload) => Err(Rejection::Failed(panic_message(&*payload))),
                };
                *verdict.lock() = Some(outcome);

                if let Some(timer) = handle.get().and_then(WeakTimer::upgrade) {
                    timer.stop();
                }
            }
        };

        let on_error = {
            let verdict = verdict.clone();
            move || {
                verdict.lock().get_or_insert(Err(Rejection::TimedOut));
            }
        };

        let on_after = {
            let settlement = settlement.clone();
            let handle = handle.clone();
            move |finished: bool| {
                let outcome = verdict.lock().take().unwrap_or(Err(if finished {
                    Rejection::Exhausted
                } else {
                    Rejection::Stopped
                }));

                if let Some(timer) = handle.get().and_then(WeakTimer::upgrade) {
                    timer.destroy();
                }
                if let Err(rejection) = &outcome {
                    tracing::debug!("Condition rejected: {}", rejection);
                }
                settlement.settle(outcome);
            }
        };

        let timer = Timer::new(
            context.clone(),
            TimerKind::When,
            Box::new(check),
            options
                .into_timer_options()
                .on_after(on_after)
                .on_error(on_error),
            trace,
        );
        let _ = handle.set(timer.downgrade());

        Self {
            timer,
            settlement,
            started: AtomicBool::new(false),
        }
    }

    /// Start polling and return the completion
    ///
    /// # Errors
    /// [`TimerError::Destroyed`] after [`destroy`](Self::destroy),
    /// [`TimerError::AlreadyStarted`] on any later call.
    pub fn start(&self) -> TimerResult<Completion> {
        self.claim()?;
        self.timer.start();
        Ok(self.settlement.completion())
    }

    /// Start polling and report the outcome through callbacks
    ///
    /// Exactly one of the callbacks runs, unless the conditional timer is
    /// destroyed first, in which case neither does.
    pub fn start_with<R, J>(&self, on_resolve: R, on_reject: J) -> TimerResult<()>
    where
        R: FnOnce() + Send + 'static,
        J: FnOnce(Rejection) + Send + 'static,
    {
        self.claim()?;
        self.settlement.on_settle(on_resolve, on_reject);
        self.timer.start();
        Ok(())
    }

    fn claim(&self) -> TimerResult<()> {
        if self.timer.destroyed() {
            return Err(TimerError::Destroyed);
        }
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(TimerError::AlreadyStarted);
        }
        Ok(())
    }

    /// Completion of this conditional timer, pending until started and settled
    pub fn completion(&self) -> Completion {
        self.settlement.completion()
    }

    pub fn pause(&self) -> &Self {
        self.timer.pause();
        self
    }

    pub fn resume(&self) -> &Self {
        self.timer.resume();
        self
    }

    /// Stop polling; a pending completion rejects with [`Rejection::Stopped`]
    pub fn stop(&self) -> &Self {
        self.timer.stop();
        self
    }

    /// Tear down without running the outcome callbacks
    ///
    /// A pending completion rejects with [`Rejection::Destroyed`].
    pub fn destroy(&self) -> &Self {
        self.settlement.sever();
        self.timer.destroy();
        self
    }

    pub fn active(&self) -> bool {
        self.timer.active()
    }

    pub fn paused(&self) -> bool {
        self.timer.paused()
    }

    pub fn destroyed(&self) -> bool {
        self.timer.destroyed()
    }

    /// Underlying polling timer
    pub fn timer(&self) -> &Timer {
        &self.timer
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "condition panicked".to_string()
    }
}

impl Tagged for When {
    fn kind(&self) -> TimerKind {
        TimerKind::When
    }
}

impl std::fmt::Debug for When {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("When")
            .field("timer", &self.timer)
            .field("started", &self.started.load(Ordering::Relaxed))
            .field("outcome", &self.settlement.try_result())
            .finish()
    }
}
