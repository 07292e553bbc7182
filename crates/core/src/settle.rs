//! Single-settlement completions
//!
//! A [`Settlement`] is resolved or rejected at most once. The outcome can be
//! observed three ways: by awaiting a [`Completion`], by blocking on it from
//! another thread, or through callbacks registered up front.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::Rejection;

/// Outcome of a settled completion
pub type Outcome = Result<(), Rejection>;

type ResolveCallback = Box<dyn FnOnce() + Send + 'static>;
type RejectCallback = Box<dyn FnOnce(Rejection) + Send + 'static>;

#[derive(Default)]
struct SettleState {
    outcome: Option<Outcome>,
    waker: Option<Waker>,
    on_resolve: Option<ResolveCallback>,
    on_reject: Option<RejectCallback>,
}

/// One-time outcome shared between a timer and whoever waits on it
#[derive(Default)]
pub struct Settlement {
    state: Mutex<SettleState>,
    settled: Condvar,
}

impl Settlement {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record `outcome` unless already settled
    ///
    /// Returns `false` when an earlier outcome won. Callbacks and wakers run
    /// after the internal lock is released.
    pub fn settle(&self, outcome: Outcome) -> bool {
        let (waker, on_resolve, on_reject) = {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                return false;
            }
            state.outcome = Some(outcome.clone());
            (state.waker.take(), state.on_resolve.take(), state.on_reject.take())
        };
        self.settled.notify_all();

        match outcome {
            Ok(()) => {
                if let Some(on_resolve) = on_resolve {
                    on_resolve();
                }
            }
            Err(rejection) => {
                if let Some(on_reject) = on_reject {
                    on_reject(rejection);
                }
            }
        }
        if let Some(waker) = waker {
            waker.wake();
        }
        true
    }

    /// Register callbacks for the outcome
    ///
    /// Runs the matching callback immediately if already settled.
    pub fn on_settle<R, J>(&self, on_resolve: R, on_reject: J)
    where
        R: FnOnce() + Send + 'static,
        J: FnOnce(Rejection) + Send + 'static,
    {
        let outcome = {
            let mut state = self.state.lock();
            match state.outcome.clone() {
                Some(outcome) => outcome,
                None => {
                    state.on_resolve = Some(Box::new(on_resolve));
                    state.on_reject = Some(Box::new(on_reject));
                    return;
                }
            }
        };

        match outcome {
            Ok(()) => on_resolve(),
            Err(rejection) => on_reject(rejection),
        }
    }

    /// Drop registered callbacks and reject with [`Rejection::Destroyed`]
    ///
    /// Waiters are released; the callbacks never run.
    pub fn sever(&self) {
        {
            let mut state = self.state.lock();
            state.on_resolve = None;
            state.on_reject = None;
        }
        self.settle(Err(Rejection::Destroyed));
    }

    pub fn is_settled(&self) -> bool {
        self.state.lock().outcome.is_some()
    }

    /// Outcome if already settled
    pub fn try_result(&self) -> Option<Outcome> {
        self.state.lock().outcome.clone()
    }

    pub fn completion(self: &Arc<Self>) -> Completion {
        Completion {
            settlement: self.clone(),
        }
    }
}

/// Awaitable view of a [`Settlement`]
///
/// Can be `.await`ed from any executor, or waited on synchronously with
/// [`wait`](Self::wait) while another thread pumps the clock.
#[derive(Clone)]
pub struct Completion {
    settlement: Arc<Settlement>,
}

impl Completion {
    /// Block until settled
    pub fn wait(&self) -> Outcome {
        let mut state = self.settlement.state.lock();
        loop {
            if let Some(outcome) = state.outcome.clone() {
                return outcome;
            }
            self.settlement.settled.wait(&mut state);
        }
    }

    /// Block until settled or `timeout` passes, returning `None` on timeout
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Outcome> {
        let deadline = Instant::now() + timeout;
        let mut state = self.settlement.state.lock();
        loop {
            if let Some(outcome) = state.outcome.clone() {
                return Some(outcome);
            }
            if self.settlement.settled.wait_until(&mut state, deadline).timed_out() {
                return state.outcome.clone();
            }
        }
    }

    pub fn try_result(&self) -> Option<Outcome> {
        self.settlement.try_result()
    }

    pub fn is_settled(&self) -> bool {
        self.settlement.is_settled()
    }
}

impl Future for Completion {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.settlement.state.lock();
        match state.outcome.clone() {
            Some(outcome) => Poll::Ready(outcome),
            None => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("outcome", &self.try_result())
            .finish()
    }
}
