//! Registered repository types

use serde::{Deserialize, Serialize};

/// A subscribed manifest source
///
/// Identity is the url; name and description are copied from the manifest
/// at registration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Repository {
    pub fn new(
        url: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            url: normalize_url(&url.into()),
            name: name.into(),
            description: description.into(),
        }
    }

    /// Whether `key` names this repository by url or by name
    pub fn matches(&self, key: &str) -> bool {
        let key = key.trim();
        self.url == key || self.name == key
    }
}

impl PartialEq for Repository {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for Repository {}

/// Canonical form of a repository url used for identity comparisons
pub fn normalize_url(url: &str) -> String {
    url.trim().to_string()
}

/// Persisted registry document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryList {
    #[serde(default)]
    pub repositories: Vec<Repository>,
}
