//! Config path resolution

use std::path::PathBuf;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "FRAMETICK_CONFIG";

/// Config file used when [`CONFIG_ENV`] is unset
pub const DEFAULT_CONFIG_FILE: &str = "frametick.toml";

/// Returns the config file path.
///
/// Uses `$FRAMETICK_CONFIG` when set and non-empty, otherwise
/// `frametick.toml` in the working directory.
pub fn default_config_path() -> PathBuf {
    resolve(std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

fn resolve(configured: Option<PathBuf>) -> PathBuf {
    configured
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
