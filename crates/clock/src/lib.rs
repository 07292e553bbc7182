//! frametick clock - Frame Tick Sources
//!
//! This crate handles:
//! - The [`Clock`] trait timers are driven by
//! - A host-pumped [`FrameClock`] (call [`FrameClock::tick`] once per frame)
//! - A [`FixedRateDriver`] fallback that pumps a clock from a background thread
//!
//! # Architecture
//!
//! A clock hands out one-shot tick callbacks. Whoever consumes ticks requests
//! the next one from inside the current one, so at most one callback per
//! consumer is ever pending.

pub mod driver;
pub mod error;
pub mod frame;

pub use driver::FixedRateDriver;
pub use error::ClockError;
pub use frame::{Clock, FrameClock, TickCallback, TickHandle, FRAME_DURATION_MS};
