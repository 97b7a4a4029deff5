//! Error types for pluginctl-core
//!
//! The variants mirror the failure classes of the plugin manager: transport
//! failures (always retryable, never corrupt state), malformed manifests,
//! registry misuse, resolution misuse, and filesystem transition failures.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using pluginctl-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for pluginctl
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure while fetching a manifest or archive
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// A fetch or download exceeded its configured timeout
    #[error("Timed out after {secs}s fetching {url}")]
    Timeout { url: String, secs: u64 },

    /// The archive body ended before the advertised length
    #[error("Incomplete transfer from {url}: expected {expected} bytes, received {received}")]
    IncompleteTransfer {
        url: String,
        expected: u64,
        received: u64,
    },

    /// A fetched manifest is malformed or violates manifest invariants
    #[error("Invalid plugin manifest at {url}: {message}")]
    ManifestParse { url: String, message: String },

    /// Repository add refused because its manifest is malformed
    #[error("Repository {url} does not serve a valid plugin manifest: {message}")]
    ManifestInvalid { url: String, message: String },

    /// Repository add refused because its manifest could not be fetched
    #[error("Repository {url} is unreachable: {message}")]
    RepositoryUnreachable { url: String, message: String },

    /// Repository already registered
    #[error("Repository already registered: {url}")]
    DuplicateRepository { url: String },

    /// No registered repository matches the url or name
    #[error("Repository not found: {key}")]
    RepositoryNotFound { key: String },

    /// No registered repository offers the plugin
    #[error("Plugin not found: {name}")]
    PluginNotFound { name: String },

    /// The plugin exists but not in the requested version or edition
    #[error("Version {version} of plugin '{name}' not found{}", detail_suffix(.detail))]
    VersionNotFound {
        name: String,
        version: String,
        detail: Option<String>,
    },

    /// An index or name does not select exactly one option
    #[error("Invalid selection: {message}")]
    Selection { message: String },

    /// A required prompt had no answer and no default
    #[error("No answer provided for prompt: {prompt}")]
    PromptUnanswered { prompt: String },

    /// Staging, extraction, validation or activation failed; local state unchanged
    #[error("Installation of {name} {version} failed: {message}")]
    InstallationFailed {
        name: String,
        version: String,
        message: String,
    },

    /// Removal of the plugin directory failed part-way; index entry preserved
    #[error("Uninstall of '{name}' incomplete, could not fully remove {}: {message}", .path.display())]
    UninstallIncomplete {
        name: String,
        path: PathBuf,
        message: String,
    },

    /// The plugin is not installed locally
    #[error("Plugin '{name}' is not installed")]
    PluginNotInstalled { name: String },

    /// A url is not an absolute http(s) url
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_ref()
        .map(|d| format!(" ({})", d))
        .unwrap_or_default()
}

impl Error {
    /// Whether the caller may retry the operation unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::IncompleteTransfer { .. }
        )
    }

    /// Create a network error
    pub fn network(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a manifest parse error
    pub fn manifest_parse(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ManifestParse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a plugin not found error
    pub fn plugin_not_found(name: impl Into<String>) -> Self {
        Self::PluginNotFound { name: name.into() }
    }

    /// Create a version not found error
    pub fn version_not_found(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::VersionNotFound {
            name: name.into(),
            version: version.into(),
            detail: None,
        }
    }

    /// Create a selection error
    pub fn selection(message: impl Into<String>) -> Self {
        Self::Selection {
            message: message.into(),
        }
    }

    /// Create an installation failure
    pub fn installation_failed(
        name: impl Into<String>,
        version: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        Self::InstallationFailed {
            name: name.into(),
            version: version.into(),
            message: message.to_string(),
        }
    }

    /// Create a plugin not installed error
    pub fn not_installed(name: impl Into<String>) -> Self {
        Self::PluginNotInstalled { name: name.into() }
    }

    /// Create an invalid config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
