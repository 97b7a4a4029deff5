//! Remote manifest fetching
//!
//! A manifest is accepted whole or not at all: the response must be 2xx,
//! the body UTF-8 JSON with every required field, and the document must pass
//! [`Manifest::validate`].

use pluginctl_core::types::Manifest;
use pluginctl_core::{Error, NetworkConfig, Result};
use std::time::Duration;
use tracing::{debug, warn};

/// Stateless manifest fetcher
#[derive(Debug, Clone)]
pub struct ManifestStore {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl ManifestStore {
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .timeout(Duration::from_secs(network.http_timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout_secs: network.http_timeout_secs,
        })
    }

    /// Fetch, parse and validate the manifest served at `url`
    pub async fn fetch(&self, url: &str) -> Result<Manifest> {
        let url = url.trim();
        check_http_url(url)?;
        debug!("Fetching manifest from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(url, format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let text = std::str::from_utf8(&body)
            .map_err(|e| Error::manifest_parse(url, format!("body is not UTF-8: {}", e)))?;

        let manifest: Manifest =
            serde_json::from_str(text).map_err(|e| Error::manifest_parse(url, e.to_string()))?;

        manifest
            .validate()
            .map_err(|message| Error::manifest_parse(url, message))?;

        for plugin in &manifest.plugins {
            if plugin.declared_latest_mismatch() {
                warn!(
                    "Manifest {} declares latest version {} for '{}', using {}",
                    url,
                    plugin.latest_version,
                    plugin.name,
                    plugin
                        .latest()
                        .map(|v| v.version.to_string())
                        .unwrap_or_default()
                );
            }
        }

        debug!(
            "Manifest {} lists {} plugin(s)",
            url,
            manifest.plugins.len()
        );
        Ok(manifest)
    }

    fn transport_error(&self, url: &str, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            Error::network(url, err)
        }
    }
}

/// Reject anything that is not an absolute http(s) url
pub(crate) fn check_http_url(url: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(url).map_err(|e| Error::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::InvalidUrl {
            url: url.to_string(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(parsed)
}
