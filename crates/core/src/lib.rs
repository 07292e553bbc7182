//! frametick core - Pausable Frame-Driven Timers
//!
//! This crate contains timers advanced by a frame clock, conditional timers
//! that settle a completion, and the bookkeeping around them.
//!
//! # Re-exports
//!
//! The clock crate is re-exported as [`clock`] for convenience.

pub use frametick_clock as clock;

pub mod config;
pub mod context;
pub mod debug;
mod delay;
pub mod error;
pub mod kind;
pub mod options;
pub mod registry;
pub mod settle;
pub mod timers;
mod visibility;
pub mod when;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use context::{
    delay, global, global_clock, on_frame, repeat, try_when, wait, wait_for, when, TimerContext,
};
pub use error::{Rejection, TimerError, TimerResult};
pub use kind::{is_repeated, is_timer, is_waited, is_when, Tagged, TimerKind};
pub use options::{ResolvedOptions, TimerOptions, WhenOptions, DEFAULT_TIMEOUT_MS};
pub use registry::ActiveSet;
pub use settle::{Completion, Outcome};
pub use timers::{RunFlags, Timer, TimerCallback, WeakTimer, Work};
pub use when::When;

// Re-export debug surface
pub use debug::{active_timers, is_debug, set_debug, snapshot, TimerSnapshot};

// Re-export config types
pub use config::{default_config_path, ConfigError, ConfigResult, TimerConfig};
