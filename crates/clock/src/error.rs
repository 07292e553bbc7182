//! Error types for clock construction and driving

/// Error type for clock operations
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Frame rate was zero, negative, or not a number
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),

    /// The fixed-rate driver thread could not be spawned
    #[error("Failed to spawn driver thread: {0}")]
    SpawnFailed(#[from] std::io::Error),
}
