//! Plugin version tokens
//!
//! Manifests carry "semantic-ish" version strings. A token is parsed as
//! semver after padding missing minor/patch components with zero, so `1.2`
//! orders and compares equal to `1.2.0`. The original text is kept for
//! display and persistence.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// An orderable plugin version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PluginVersion {
    raw: String,
    parsed: Version,
}

impl PluginVersion {
    /// Parse a version token
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim().trim_start_matches('v');
        if trimmed.is_empty() {
            return Err("empty version".to_string());
        }

        let parsed = Version::parse(trimmed)
            .or_else(|_| Version::parse(&pad_components(trimmed)))
            .map_err(|e| format!("invalid version '{}': {}", raw, e))?;

        Ok(Self {
            raw: raw.trim().to_string(),
            parsed,
        })
    }

    /// The version exactly as written in the manifest
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The normalized semver value
    pub fn semver(&self) -> &Version {
        &self.parsed
    }
}

/// Pad `1` / `1.2` (optionally followed by `-pre` or `+build`) to three components
fn pad_components(token: &str) -> String {
    let split_at = token.find(['-', '+']).unwrap_or(token.len());
    let (core, suffix) = token.split_at(split_at);
    let mut parts: Vec<&str> = core.split('.').collect();
    while parts.len() < 3 {
        parts.push("0");
    }
    format!("{}{}", parts.join("."), suffix)
}

impl PartialEq for PluginVersion {
    fn eq(&self, other: &Self) -> bool {
        self.parsed == other.parsed
    }
}

impl Eq for PluginVersion {}

impl PartialOrd for PluginVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PluginVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parsed.cmp(&other.parsed)
    }
}

impl std::hash::Hash for PluginVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.parsed.hash(state);
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for PluginVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PluginVersion {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PluginVersion> for String {
    fn from(value: PluginVersion) -> Self {
        value.raw
    }
}
