//! frametick demo
//!
//! Loads the timer config, drives a private context from a fixed-rate
//! background clock and walks through repeating timers, one-shot timers,
//! conditional timers, delays and host visibility changes.
//!
//! Log verbosity follows `RUST_LOG` and defaults to `info`.

use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use frametick_clock::FixedRateDriver;
use frametick_core::{
    default_config_path, Rejection, TimerConfig, TimerContext, TimerOptions, WhenOptions,
};

/// Upper bound on any single blocking wait
const WAIT_LIMIT: Duration = Duration::from_secs(10);

fn main() -> Result<(), Box<dyn Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    let path = default_config_path();
    let config = TimerConfig::load(&path)?;
    tracing::info!("frametick demo loading ({} fps, config {:?})", config.frame_rate, path);

    let clock = Arc::new(config.frame_clock()?);
    let context = TimerContext::with_config(clock.clone(), config);
    let driver = FixedRateDriver::spawn(clock)?;

    let result = run(&context);

    if context.is_debug() {
        match context.snapshot_json() {
            Ok(json) => tracing::info!("Timers still running: {}", json),
            Err(e) => tracing::warn!("Failed to render snapshot: {}", e),
        }
    }

    driver.stop();
    tracing::info!("frametick demo finished");
    result
}

fn run(context: &TimerContext) -> Result<(), Box<dyn Error>> {
    repeat_and_wait(context)?;
    conditions(context)?;
    visibility(context)?;
    Ok(())
}

fn repeat_and_wait(context: &TimerContext) -> Result<(), Box<dyn Error>> {
    let finished = context.delay(Duration::from_millis(400), None);

    context.repeat(
        |index| tracing::info!("Repeat tick {}", index),
        TimerOptions::new()
            .count(5)
            .interval(Duration::from_millis(50))
            .on_after(|done| tracing::info!("Repeat finished: {}", done)),
    );
    context.wait_for(
        || tracing::info!("Waited 100ms"),
        Duration::from_millis(100),
    );

    wait_for(finished, "delay")
}

fn conditions(context: &TimerContext) -> Result<(), Box<dyn Error>> {
    let checks = Arc::new(AtomicUsize::new(0));

    let counter = checks.clone();
    let when = context.when(
        move || counter.fetch_add(1, Ordering::SeqCst) >= 10,
        WhenOptions::new().interval(Duration::from_millis(20)),
    );
    let completion = when.start()?;
    wait_for(completion, "condition")?;
    tracing::info!("Condition held after {} checks", checks.load(Ordering::SeqCst));

    let never = context.when(
        || false,
        WhenOptions::new().timeout(Duration::from_millis(100)),
    );
    match never.start()?.wait_timeout(WAIT_LIMIT) {
        Some(Err(Rejection::TimedOut)) => tracing::info!("Condition timed out as expected"),
        other => tracing::warn!("Unexpected condition outcome: {:?}", other),
    }

    let timed = context.delay(Duration::from_secs(5), Some(Duration::from_millis(100)));
    match timed.wait_timeout(WAIT_LIMIT) {
        Some(Err(rejection)) => tracing::info!("Delay rejected: {}", rejection),
        other => tracing::warn!("Unexpected delay outcome: {:?}", other),
    }

    Ok(())
}

fn visibility(context: &TimerContext) -> Result<(), Box<dyn Error>> {
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = hits.clone();
    let timer = context.repeat(
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
        TimerOptions::new().interval(Duration::from_millis(25)),
    );

    std::thread::sleep(Duration::from_millis(150));
    let paused = context.set_hidden(true);
    let before = hits.load(Ordering::SeqCst);
    tracing::info!("Host hidden, {} timers paused after {} ticks", paused, before);

    std::thread::sleep(Duration::from_millis(150));
    if hits.load(Ordering::SeqCst) != before {
        tracing::warn!("Timer ticked while hidden");
    }

    let resumed = context.set_hidden(false);
    std::thread::sleep(Duration::from_millis(150));
    tracing::info!(
        "Host visible, {} timers resumed, {} ticks total",
        resumed,
        hits.load(Ordering::SeqCst)
    );

    timer.destroy();
    Ok(())
}

fn wait_for(completion: frametick_core::Completion, what: &str) -> Result<(), Box<dyn Error>> {
    match completion.wait_timeout(WAIT_LIMIT) {
        Some(Ok(())) => Ok(()),
        Some(Err(rejection)) => Err(format!("{} rejected: {}", what, rejection).into()),
        None => Err(format!("{} did not settle within {:?}", what, WAIT_LIMIT).into()),
    }
}
