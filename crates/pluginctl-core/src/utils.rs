//! Shared utility functions for pluginctl crates

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Environment variable that relocates the user config home
pub const USER_CONFIG_HOME_ENV: &str = "PLUGINCTL_USER_CONFIG_HOME";

/// Get the user's home directory
///
/// Prefers the HOME environment variable over `dirs::home_dir()`, which reads
/// the password database and ignores overrides.
pub fn get_home_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return Ok(PathBuf::from(home));
        }
    }

    dirs::home_dir().ok_or_else(|| Error::config("Could not determine home directory"))
}

/// Resolve the user config home
///
/// Precedence: explicit override > `PLUGINCTL_USER_CONFIG_HOME` > `$HOME/.pluginctl`.
pub fn user_config_home(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    match std::env::var(USER_CONFIG_HOME_ENV) {
        Ok(value) if !value.trim().is_empty() => Ok(PathBuf::from(value)),
        _ => Ok(get_home_dir()?.join(".pluginctl")),
    }
}
