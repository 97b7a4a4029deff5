//! Runtime configuration for the plugin manager
//!
//! Loaded by [`crate::config::ConfigLoader`] from `<home>/pluginctl.yaml`
//! with `PLUGINCTL_*` environment overrides.

use serde::{Deserialize, Serialize};

/// Complete plugin manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginsConfig {
    /// Active package edition
    #[serde(default = "default_edition")]
    pub edition: String,

    /// File that must exist at the root of every installed package
    #[serde(default = "default_entry_module")]
    pub entry_module: String,

    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            edition: default_edition(),
            entry_module: default_entry_module(),
            network: NetworkConfig::default(),
        }
    }
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Manifest fetch timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Archive download timeout in seconds
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            download_timeout_secs: default_download_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_edition() -> String {
    "community".to_string()
}
fn default_entry_module() -> String {
    "init.py".to_string()
}
fn default_http_timeout() -> u64 {
    30
}
fn default_download_timeout() -> u64 {
    300 // 5 minutes
}
fn default_user_agent() -> String {
    format!(
        "pluginctl/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
