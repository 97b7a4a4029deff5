//! Local installation records

use crate::version::PluginVersion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A plugin present on disk under the plugins directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledPlugin {
    pub name: String,
    pub caption: String,
    pub module_name: String,
    pub installed_version: PluginVersion,

    /// Repository the package came from
    #[serde(rename = "sourceRepositoryURL")]
    pub source_repository_url: String,

    pub install_path: PathBuf,
    pub edition: String,

    /// Hex SHA-256 of the downloaded archive
    pub archive_sha256: String,

    pub installed_at: DateTime<Utc>,
}

/// Persisted index document, keyed by plugin name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstalledIndex {
    #[serde(default)]
    pub plugins: BTreeMap<String, InstalledPlugin>,
}
