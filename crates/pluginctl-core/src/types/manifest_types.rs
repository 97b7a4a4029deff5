//! Repository manifest document types
//!
//! A manifest is served by every plugin repository:
//! ```json
//! {
//!   "fileType": "MySQL Shell Plugins Manifest",
//!   "version": "0.0.1",
//!   "repository": { "name": "...", "description": "..." },
//!   "plugins": [
//!     {
//!       "name": "repo", "caption": "Repo Testing Plugin", "moduleName": "repo",
//!       "description": "...", "latestVersion": "0.0.2",
//!       "editions": [{ "name": "community", "packagePrefix": "...",
//!                      "licenseHeader": "...", "licenseFile": "..." }],
//!       "versions": [{ "version": "0.0.2", "developmentStage": "preview",
//!                      "changes": ["..."], "urls": { "community": "http://..." } }]
//!     }
//!   ]
//! }
//! ```
//!
//! Every field above is required. Deserialization alone only checks shape;
//! [`Manifest::validate`] enforces the cross-field invariants.

use crate::version::PluginVersion;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Sentinel value of the `fileType` field
pub const MANIFEST_FILE_TYPE: &str = "MySQL Shell Plugins Manifest";

/// A repository manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Must equal [`MANIFEST_FILE_TYPE`]
    pub file_type: String,

    /// Manifest schema version
    pub version: String,

    /// Publication stamp, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_version: Option<String>,

    /// Display metadata of the repository
    pub repository: RepositoryInfo,

    /// Plugins offered by this repository
    pub plugins: Vec<PluginDescriptor>,
}

/// Repository display metadata declared by a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub description: String,
}

/// A plugin offered by a repository
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    pub name: String,
    pub caption: String,
    pub module_name: String,
    pub description: String,

    /// Declared latest version; informational, see [`PluginDescriptor::latest`]
    pub latest_version: String,

    pub editions: Vec<Edition>,
    pub versions: Vec<VersionEntry>,
}

/// A licensing/build variant of a plugin package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edition {
    pub name: String,
    pub package_prefix: String,
    pub license_header: String,
    pub license_file: String,
}

/// One published version of a plugin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub version: PluginVersion,
    pub development_stage: String,
    pub changes: Vec<String>,

    /// Edition name -> package archive url
    pub urls: BTreeMap<String, String>,

    /// Edition name -> SHA-256 of the archive, when the publisher provides one
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sha256: BTreeMap<String, String>,
}

impl VersionEntry {
    /// Download url for an edition
    pub fn url_for(&self, edition: &str) -> Option<&str> {
        self.urls.get(edition).map(String::as_str)
    }

    /// Expected archive digest for an edition
    pub fn sha256_for(&self, edition: &str) -> Option<&str> {
        self.sha256.get(edition).map(String::as_str)
    }
}

impl PluginDescriptor {
    /// Latest version, recomputed from `versions`
    pub fn latest(&self) -> Option<&VersionEntry> {
        self.versions.iter().max_by(|a, b| a.version.cmp(&b.version))
    }

    /// Entry for an exact version
    pub fn find_version(&self, version: &PluginVersion) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| &v.version == version)
    }

    /// Versions ordered newest first
    pub fn versions_descending(&self) -> Vec<&VersionEntry> {
        let mut versions: Vec<_> = self.versions.iter().collect();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        versions
    }

    /// Whether the declared `latestVersion` disagrees with the version list
    pub fn declared_latest_mismatch(&self) -> bool {
        match (self.latest(), PluginVersion::parse(&self.latest_version)) {
            (Some(latest), Ok(declared)) => latest.version != declared,
            (None, _) => false,
            (Some(_), Err(_)) => true,
        }
    }
}

impl Manifest {
    /// Check the invariants serde cannot express
    ///
    /// Returns the first violation as a message.
    pub fn validate(&self) -> Result<(), String> {
        if self.file_type != MANIFEST_FILE_TYPE {
            return Err(format!(
                "unexpected fileType '{}', expected '{}'",
                self.file_type, MANIFEST_FILE_TYPE
            ));
        }

        if self.repository.name.trim().is_empty() {
            return Err("repository name is empty".to_string());
        }

        let mut names = HashSet::new();
        for plugin in &self.plugins {
            if plugin.name.trim().is_empty() {
                return Err("plugin with empty name".to_string());
            }
            if !names.insert(plugin.name.as_str()) {
                return Err(format!("duplicate plugin name '{}'", plugin.name));
            }
            validate_module_name(&plugin.module_name)
                .map_err(|e| format!("plugin '{}': {}", plugin.name, e))?;
            validate_plugin_versions(plugin)?;
        }

        Ok(())
    }
}

/// The module name becomes a directory name under the plugins root
fn validate_module_name(module_name: &str) -> Result<(), String> {
    if module_name.is_empty() {
        return Err("moduleName is empty".to_string());
    }
    if module_name.starts_with('.')
        || module_name.contains('/')
        || module_name.contains('\\')
        || module_name.contains(':')
    {
        return Err(format!(
            "moduleName '{}' is not a plain directory name",
            module_name
        ));
    }
    Ok(())
}

fn validate_plugin_versions(plugin: &PluginDescriptor) -> Result<(), String> {
    let editions: HashSet<&str> = plugin.editions.iter().map(|e| e.name.as_str()).collect();
    let mut seen = HashSet::new();

    for entry in &plugin.versions {
        if !seen.insert(&entry.version) {
            return Err(format!(
                "plugin '{}' lists version {} more than once",
                plugin.name, entry.version
            ));
        }

        for (edition, link) in &entry.urls {
            if !editions.contains(edition.as_str()) {
                return Err(format!(
                    "plugin '{}' version {} has a url for undeclared edition '{}'",
                    plugin.name, entry.version, edition
                ));
            }
            match url::Url::parse(link) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
                Ok(parsed) => {
                    return Err(format!(
                        "plugin '{}' version {} url '{}' uses unsupported scheme '{}'",
                        plugin.name,
                        entry.version,
                        link,
                        parsed.scheme()
                    ))
                }
                Err(e) => {
                    return Err(format!(
                        "plugin '{}' version {} has invalid url '{}': {}",
                        plugin.name, entry.version, link, e
                    ))
                }
            }
        }
    }

    Ok(())
}
