//! Package archive download
//!
//! Archives are streamed into a private temporary directory as
//! `<file>.part` and renamed to their final name only once the whole body
//! has arrived. The directory is deleted when the [`DownloadedArchive`] is
//! dropped, so a failed or abandoned transfer never leaves files behind.

use crate::manifest::check_http_url;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use pluginctl_core::{Error, NetworkConfig, Result};
use reqwest::header::CONTENT_LENGTH;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

/// A fully downloaded archive in a private temporary directory
#[derive(Debug)]
pub struct DownloadedArchive {
    path: PathBuf,
    size: u64,
    sha256: String,
    _temp_dir: TempDir,
}

impl DownloadedArchive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Lowercase hex SHA-256 of the archive content
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Compare against an expected digest, ignoring case
    pub fn matches_sha256(&self, expected: &str) -> bool {
        self.sha256.eq_ignore_ascii_case(expected.trim())
    }
}

/// Streams package archives to disk
#[derive(Debug, Clone)]
pub struct ArchiveDownloader {
    client: reqwest::Client,
    timeout_secs: u64,
    show_progress: bool,
}

impl ArchiveDownloader {
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout_secs: network.download_timeout_secs,
            show_progress: false,
        })
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Download `url`, bounded as a whole by the download timeout
    pub async fn fetch(&self, url: &str) -> Result<DownloadedArchive> {
        let parsed = check_http_url(url)?;
        let file_name = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")
            .unwrap_or("package")
            .to_string();

        let temp_dir = tempfile::Builder::new()
            .prefix("pluginctl-download-")
            .tempdir()?;

        let timeout = Duration::from_secs(self.timeout_secs);
        match tokio::time::timeout(timeout, self.stream_to(url, temp_dir.path(), &file_name)).await
        {
            Ok(Ok((path, size, sha256))) => {
                info!("Downloaded {} ({})", url, human_readable_size(size));
                Ok(DownloadedArchive {
                    path,
                    size,
                    sha256,
                    _temp_dir: temp_dir,
                })
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::Timeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }),
        }
    }

    async fn stream_to(
        &self,
        url: &str,
        dir: &Path,
        file_name: &str,
    ) -> Result<(PathBuf, u64, String)> {
        let final_path = dir.join(file_name);
        let part_path = dir.join(format!("{}.part", file_name));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(url, format!("HTTP {}", status)));
        }

        let expected = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());

        let progress = if self.show_progress {
            let pb = ProgressBar::new(expected.unwrap_or(0));
            if let Ok(style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
            ) {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb.set_message(format!("Downloading {}", file_name));
            Some(pb)
        } else {
            None
        };

        let mut file = File::create(&part_path)?;
        let mut hasher = Sha256::new();
        let mut received: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| match expected {
                Some(expected) => Error::IncompleteTransfer {
                    url: url.to_string(),
                    expected,
                    received,
                },
                None => Error::network(url, e),
            })?;
            file.write_all(&chunk)?;
            hasher.update(&chunk);
            received += chunk.len() as u64;

            if let Some(pb) = &progress {
                pb.set_position(received);
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        file.sync_all()?;
        drop(file);

        if let Some(expected) = expected {
            if received != expected {
                return Err(Error::IncompleteTransfer {
                    url: url.to_string(),
                    expected,
                    received,
                });
            }
        }

        fs::rename(&part_path, &final_path)?;
        let sha256 = format!("{:x}", hasher.finalize());
        debug!("Archive {} sha256 {}", final_path.display(), sha256);

        Ok((final_path, received, sha256))
    }
}

/// Format a byte count for display
pub fn human_readable_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
