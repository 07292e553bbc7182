//! One-shot delays as completions

use std::panic::Location;
use std::time::Duration;

use crate::context::TimerContext;
use crate::error::Rejection;
use crate::kind::TimerKind;
use crate::options::TimerOptions;
use crate::settle::{Completion, Settlement};
use crate::timers::Timer;

/// Start a one-shot timer on `context` and return its completion
///
/// Resolves once `duration` of active time has passed. Rejects with
/// [`Rejection::TimedOut`] when `timeout` elapses first and with
/// [`Rejection::Stopped`] if the timer is stopped some other way. Without a
/// `timeout` the delay never times out.
pub(crate) fn delay(
    context: &TimerContext,
    duration: Duration,
    timeout: Option<Duration>,
    trace: &'static Location<'static>,
) -> Completion {
    let settlement = Settlement::new();

    let options = TimerOptions::new().interval(duration);
    let options = match timeout {
        Some(timeout) => options.timeout(timeout),
        None => options.no_timeout(),
    };

    let on_error = {
        let settlement = settlement.clone();
        move || {
            settlement.settle(Err(Rejection::TimedOut));
        }
    };
    let on_after = {
        let settlement = settlement.clone();
        move |finished: bool| {
            settlement.settle(if finished { Ok(()) } else { Err(Rejection::Stopped) });
        }
    };

    let timer = Timer::new(
        context.clone(),
        TimerKind::Wait,
        Box::new(|_: usize| {}),
        options.on_after(on_after).on_error(on_error),
        trace,
    );
    timer.start();

    settlement.completion()
}

#[cfg(test)]
mod tests {
    use crate::error::Rejection;
    use crate::testing::Harness;
    use std::time::Duration;

    #[test]
    fn test_delay_resolves() {
        let harness = Harness::new();
        let completion = harness.context.delay(Duration::from_millis(100), None);

        harness.run_until(96.0);
        assert!(!completion.is_settled());

        harness.run_until(112.0);
        assert_eq!(completion.try_result(), Some(Ok(())));
        assert!(harness.context.active_set().is_empty());
    }

    #[test]
    fn test_delay_times_out() {
        let harness = Harness::new();
        let completion = harness
            .context
            .delay(Duration::from_millis(200), Some(Duration::from_millis(50)));

        harness.run_until(300.0);
        assert_eq!(completion.try_result(), Some(Err(Rejection::TimedOut)));
    }

    #[test]
    fn test_long_delay_ignores_one_shot_timeout() {
        let harness = Harness::new();
        let completion = harness.context.delay(Duration::from_secs(40), None);

        harness.run_until(35_000.0);
        assert!(!completion.is_settled());

        harness.run_until(40_100.0);
        assert_eq!(completion.try_result(), Some(Ok(())));
    }

    #[test]
    fn test_hidden_context_holds_delay() {
        let harness = Harness::new();
        let completion = harness.context.delay(Duration::from_millis(100), None);

        harness.run_until(48.0);
        harness.context.set_hidden(true);
        harness.run_until(500.0);
        assert!(!completion.is_settled());

        harness.context.set_hidden(false);
        harness.run_until(700.0);
        assert_eq!(completion.try_result(), Some(Ok(())));
    }
}
