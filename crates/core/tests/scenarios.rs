//! End-to-end timer scenarios through the public API

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use frametick_core::clock::{FixedRateDriver, FrameClock};
use frametick_core::{Rejection, TimerContext, TimerOptions, WhenOptions};

fn context() -> (Arc<FrameClock>, TimerContext) {
    let clock = Arc::new(FrameClock::new());
    let context = TimerContext::new(clock.clone());
    (clock, context)
}

fn run(clock: &FrameClock, from: f64, to: f64) {
    let mut now = from;
    while now <= to {
        clock.tick(now);
        now += 16.0;
    }
}

#[test]
fn wait_fires_once_after_delay() {
    let (clock, context) = context();
    let fired = Arc::new(Mutex::new(Vec::new()));

    let log = fired.clone();
    let timer = context.wait(
        move || log.lock().push(()),
        TimerOptions::new().interval(Duration::from_millis(100)),
    );

    run(&clock, 0.0, 80.0);
    assert!(fired.lock().is_empty());

    run(&clock, 96.0, 400.0);
    assert_eq!(fired.lock().len(), 1);
    assert!(!timer.active());
}

#[test]
fn repeat_reports_every_index_then_finishes() {
    let (clock, context) = context();
    let indices = Arc::new(Mutex::new(Vec::new()));
    let after = Arc::new(Mutex::new(Vec::new()));

    let log = indices.clone();
    let finished = after.clone();
    context.repeat(
        move |index| log.lock().push(index),
        TimerOptions::new()
            .count(5)
            .interval(Duration::from_millis(50))
            .on_after(move |done| finished.lock().push(done)),
    );

    run(&clock, 0.0, 1000.0);
    assert_eq!(*indices.lock(), vec![0, 1, 2, 3, 4]);
    assert_eq!(*after.lock(), vec![true]);
    assert!(context.active_set().is_empty());
}

#[test]
fn when_times_out_before_flag_is_seen() {
    let (clock, context) = context();
    let flag = Arc::new(AtomicBool::new(false));

    let reader = flag.clone();
    let when = context.when(
        move || reader.load(Ordering::SeqCst),
        WhenOptions::new().timeout(Duration::from_millis(50)),
    );
    let completion = when.start().unwrap();

    run(&clock, 0.0, 192.0);
    assert_eq!(completion.try_result(), Some(Err(Rejection::TimedOut)));

    flag.store(true, Ordering::SeqCst);
    run(&clock, 208.0, 400.0);
    assert_eq!(completion.try_result(), Some(Err(Rejection::TimedOut)));
}

#[test]
fn pause_and_resume_keep_progress() {
    let (clock, context) = context();
    let indices = Arc::new(Mutex::new(Vec::new()));

    let log = indices.clone();
    let timer = context.repeat(
        move |index| log.lock().push(index),
        TimerOptions::new().count(3).interval_ms(100.0),
    );

    run(&clock, 0.0, 160.0);
    assert_eq!(*indices.lock(), vec![0]);

    timer.pause();
    run(&clock, 176.0, 2000.0);
    assert_eq!(*indices.lock(), vec![0]);

    timer.resume();
    run(&clock, 2016.0, 3000.0);
    assert_eq!(*indices.lock(), vec![0, 1, 2]);
}

#[test]
fn delay_resolves_on_driven_clock() {
    let clock = Arc::new(FrameClock::new());
    let context = TimerContext::new(clock.clone());
    let driver = FixedRateDriver::spawn(clock).unwrap();

    let completion = context.delay(Duration::from_millis(30), None);
    assert_eq!(completion.wait_timeout(Duration::from_secs(5)), Some(Ok(())));

    driver.stop();
}
