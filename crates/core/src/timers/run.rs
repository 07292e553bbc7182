//! Tick loop of an active timer
//!
//! One [`RunLoop`] exists per activation. It travels from tick callback to
//! tick callback and carries the anchors of the current run; the timer state
//! only sees the progress it publishes.

use frametick_clock::TickHandle;

use super::{RunFlags, Timer, TimerState};

pub(super) struct RunLoop {
    timer: Timer,
    generation: u64,
    /// Active time preserved from earlier runs
    elapsed: f64,
    /// Interval progress preserved from a pause, until the next anchor reset
    carry: f64,
    index: usize,
    /// Active time this run needs to complete every remaining interval
    remaining: f64,
    /// First tick of this run
    start: Option<f64>,
    /// Quantization anchor, moved to every tick that fires the callback
    current: Option<f64>,
}

impl RunLoop {
    pub fn new(timer: Timer, state: &TimerState) -> Self {
        let remaining = timer.inner.options.remaining(state.index, state.partial);

        Self {
            timer,
            generation: state.run,
            elapsed: state.elapsed,
            carry: state.partial,
            index: state.index,
            remaining,
            start: None,
            current: None,
        }
    }

    /// Request the next tick for this loop
    pub fn schedule(self) -> TickHandle {
        let clock = self.timer.inner.context.clock().clone();
        clock.request_tick(Box::new(move |timestamp: f64| self.step(timestamp)))
    }

    fn step(mut self, timestamp: f64) {
        let timer = self.timer.clone();
        let inner = &*timer.inner;
        let mut state = inner.state.lock();

        // Superseded by a pause, stop, restart or destroy
        if state.run != self.generation || !state.flags.contains(RunFlags::ACTIVE) {
            return;
        }
        state.tick = None;

        let start = *self.start.get_or_insert(timestamp);
        let current = *self.current.get_or_insert(timestamp);
        let lifetime = timestamp - start;
        let time = timestamp - current + self.carry;

        state.elapsed = self.elapsed + lifetime;
        state.partial = time;

        let finished = lifetime >= self.remaining;

        if !finished && state.elapsed >= inner.options.timeout_ms {
            let elapsed = state.elapsed;
            inner.deactivate(&mut state);
            state.reset();
            drop(state);

            tracing::debug!("{} timer timed out after {:.1}ms", inner.kind, elapsed);
            inner.error.call(|error| error());
            inner.after.call(|after| after(false));
            return;
        }

        if !finished && time < inner.minimum {
            state.tick = Some(self.schedule());
            return;
        }

        let index = self.index;
        self.index += 1;
        let count = inner.options.count;
        let exhausted = count.is_some_and(|count| self.index >= count);

        if !(finished || exhausted) {
            state.index = self.index;
            state.partial = 0.0;
            self.current = Some(timestamp);
            self.carry = 0.0;
            let generation = self.generation;
            state.tick = Some(self.schedule());
            drop(state);

            let _guard = Unwind {
                timer: &timer,
                generation,
            };
            inner.callback.call(|callback| callback(index));
            return;
        }

        // The run stays active without a tick until its last callbacks
        // returned, so they can still stop, pause or restart it
        let generation = self.generation;
        drop(state);

        // Late frames can cover several intervals; catch up on the runs they skipped
        let end = count.unwrap_or(self.index).max(self.index);
        for index in index..end {
            {
                let mut state = inner.state.lock();
                if state.run != generation {
                    return;
                }
                state.index = index + 1;
                state.partial = 0.0;
            }

            let _guard = Unwind {
                timer: &timer,
                generation,
            };
            inner.callback.call(|callback| callback(index));
        }

        let mut state = inner.state.lock();
        if state.run != generation {
            return;
        }
        inner.deactivate(&mut state);
        state.reset();
        drop(state);

        tracing::debug!("{} timer finished after {} runs", inner.kind, end);
        inner.after.call(|after| after(true));
    }
}

/// Abandons the run if a callback unwinds through it
struct Unwind<'a> {
    timer: &'a Timer,
    generation: u64,
}

impl Drop for Unwind<'_> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            return;
        }

        let inner = &*self.timer.inner;
        let mut state = inner.state.lock();
        if state.run == self.generation {
            inner.deactivate(&mut state);
            state.reset();
            tracing::warn!("{} timer callback panicked, run abandoned", inner.kind);
        }
    }
}
