//! Error types for timers and conditional polling

/// Errors reported synchronously by timer construction and usage
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimerError {
    /// A repeat count of zero was supplied
    #[error("Invalid repeat count: {0} (must be at least 1)")]
    InvalidCount(usize),

    /// A negative or non-numeric interval was supplied
    #[error("Invalid interval: {0}ms (must be a non-negative number)")]
    InvalidInterval(f64),

    /// A non-positive or non-numeric timeout was supplied
    #[error("Invalid timeout: {0}ms (must be a positive number)")]
    InvalidTimeout(f64),

    /// A conditional timer was started more than once
    #[error("Timer has already been started")]
    AlreadyStarted,

    /// The timer was used after being destroyed
    #[error("Timer has already been destroyed")]
    Destroyed,
}

/// Result type for timer operations
pub type TimerResult<T> = Result<T, TimerError>;

/// Why a pending completion was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The timer was stopped before the condition held
    #[error("Timer was stopped before completing")]
    Stopped,

    /// The timeout elapsed first
    #[error("Timer timed out")]
    TimedOut,

    /// Every allowed check ran without the condition holding
    #[error("Condition was not met within the allowed number of checks")]
    Exhausted,

    /// The condition itself failed
    #[error("Condition failed: {0}")]
    Failed(String),

    /// The timer was destroyed while the completion was pending
    #[error("Timer was destroyed")]
    Destroyed,
}
