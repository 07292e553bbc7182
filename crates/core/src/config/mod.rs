//! Configuration for timer contexts
//!
//! Settings live in a TOML file and are read once when a context is created:
//! - Debug introspection on startup
//! - Host frame rate
//! - Default timeout of one-shot timers
//!
//! Missing files are created with defaults, missing keys fall back to their
//! defaults.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use frametick_core::{TimerConfig, TimerContext};
//!
//! let config = TimerConfig::load(&frametick_core::default_config_path())?;
//! let clock = Arc::new(config.frame_clock()?);
//! let context = TimerContext::with_config(clock, config);
//! ```

mod loader;

use std::path::Path;

use serde::{Deserialize, Serialize};

use frametick_clock::{ClockError, FrameClock};

use crate::options::DEFAULT_TIMEOUT_MS;

pub use loader::{default_config_path, CONFIG_ENV, DEFAULT_CONFIG_FILE};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A setting is out of range
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// The configured frame rate cannot drive a clock
    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Timer context configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Start with debug introspection enabled
    pub debug: bool,

    /// Host frames per second
    pub frame_rate: f64,

    /// Timeout of one-shot timers that do not set their own
    pub one_shot_timeout_ms: f64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            debug: false,
            frame_rate: 60.0,
            one_shot_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl TimerConfig {
    /// Load config from `path`, creating a default file if missing
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = Self::from_toml_str(&content)?;
            tracing::debug!("Loaded timer config from {:?}", path);
            Ok(config)
        } else {
            let default = Self::default();
            default.save(path)?;
            tracing::info!("Created default timer config at {:?}", path);
            Ok(default)
        }
    }

    /// Save config to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved timer config to {:?}", path);
        Ok(())
    }

    /// Replace self with the contents of `path`
    ///
    /// Self is left untouched if the file is unreadable or invalid.
    pub fn reload(&mut self, path: &Path) -> ConfigResult<()> {
        let content = std::fs::read_to_string(path)?;
        *self = Self::from_toml_str(&content)?;
        tracing::debug!("Reloaded timer config from {:?}", path);
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "frame_rate must be a positive number, got {}",
                self.frame_rate
            )));
        }
        if self.one_shot_timeout_ms.is_nan() || self.one_shot_timeout_ms <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "one_shot_timeout_ms must be positive, got {}",
                self.one_shot_timeout_ms
            )));
        }
        Ok(())
    }

    /// Nominal frame duration in milliseconds
    pub fn frame_duration_ms(&self) -> f64 {
        1000.0 / self.frame_rate
    }

    /// Frame clock running at the configured rate
    pub fn frame_clock(&self) -> ConfigResult<FrameClock> {
        Ok(FrameClock::with_frame_rate(self.frame_rate)?)
    }
}
