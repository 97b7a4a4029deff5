//! Repository registry
//!
//! The ordered list of subscribed manifest urls, persisted as JSON in the
//! user config home. Registration order is significant: it breaks ties
//! between repositories offering the same plugin.

use crate::manifest::ManifestStore;
use crate::persist::{read_json_or_default, write_json_atomic};
use crate::prompt::ConfirmationGateway;
use pluginctl_core::types::{normalize_url, Repository, RepositoryList};
use pluginctl_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of a registry mutation that may be declined at the prompt
#[derive(Debug, Clone)]
pub enum RepositoryChange {
    Added(Repository),
    Removed(Repository),
    Cancelled,
}

/// Persisted list of subscribed repositories
pub struct RepositoryRegistry {
    path: PathBuf,
    repositories: Vec<Repository>,
}

impl RepositoryRegistry {
    /// Load the registry, starting empty when the file does not exist
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let list: RepositoryList = read_json_or_default(&path)?;
        debug!(
            "Loaded {} repositories from {}",
            list.repositories.len(),
            path.display()
        );
        Ok(Self {
            path,
            repositories: list.repositories,
        })
    }

    /// Repositories in registration order
    pub fn list(&self) -> &[Repository] {
        &self.repositories
    }

    /// Find a repository by url, or by a name only one repository carries
    pub fn find_unique(&self, key: &str) -> Result<&Repository> {
        let key = key.trim();
        if let Some(repository) = self.repositories.iter().find(|r| r.url == key) {
            return Ok(repository);
        }

        let named: Vec<&Repository> = self
            .repositories
            .iter()
            .filter(|r| r.matches(key))
            .collect();
        match named.as_slice() {
            [] => Err(Error::RepositoryNotFound {
                key: key.to_string(),
            }),
            [repository] => Ok(*repository),
            _ => Err(Error::selection(format!(
                "{} repositories are named '{}', use the url instead",
                named.len(),
                key
            ))),
        }
    }

    pub fn contains_url(&self, url: &str) -> bool {
        let url = normalize_url(url);
        self.repositories.iter().any(|r| r.url == url)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register a repository after validating its manifest and confirming
    pub async fn add(
        &mut self,
        url: &str,
        store: &ManifestStore,
        gateway: &mut dyn ConfirmationGateway,
    ) -> Result<RepositoryChange> {
        let url = normalize_url(url);
        if self.contains_url(&url) {
            return Err(Error::DuplicateRepository { url });
        }

        let manifest = store.fetch(&url).await.map_err(|e| match e {
            Error::Network { message, .. } => Error::RepositoryUnreachable {
                url: url.clone(),
                message,
            },
            Error::Timeout { secs, .. } => Error::RepositoryUnreachable {
                url: url.clone(),
                message: format!("timed out after {}s", secs),
            },
            Error::ManifestParse { message, .. } => Error::ManifestInvalid {
                url: url.clone(),
                message,
            },
            other => other,
        })?;

        let question = format!(
            "Are you sure you want to add the repository '{}'?",
            manifest.repository.name
        );
        if !gateway.confirm(&question, Some(false))? {
            debug!("Adding repository {} cancelled", url);
            return Ok(RepositoryChange::Cancelled);
        }

        let repository = Repository::new(
            url,
            manifest.repository.name,
            manifest.repository.description,
        );
        self.insert(repository.clone())?;
        info!("Added repository {} ({})", repository.name, repository.url);
        Ok(RepositoryChange::Added(repository))
    }

    /// Append a repository and persist; fails on a duplicate url
    pub fn insert(&mut self, repository: Repository) -> Result<()> {
        if self.contains_url(&repository.url) {
            return Err(Error::DuplicateRepository {
                url: repository.url,
            });
        }
        self.repositories.push(repository);
        if let Err(e) = self.save() {
            self.repositories.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Remove a repository by url or unambiguous name
    pub fn remove(&mut self, key: &str) -> Result<Repository> {
        let url = self.find_unique(key)?.url.clone();
        let position = self
            .repositories
            .iter()
            .position(|r| r.url == url)
            .ok_or_else(|| Error::RepositoryNotFound {
                key: key.trim().to_string(),
            })?;

        let removed = self.repositories.remove(position);
        if let Err(e) = self.save() {
            self.repositories.insert(position, removed);
            return Err(e);
        }
        info!("Removed repository {} ({})", removed.name, removed.url);
        Ok(removed)
    }

    fn save(&self) -> Result<()> {
        write_json_atomic(
            &self.path,
            &RepositoryList {
                repositories: self.repositories.clone(),
            },
        )
    }
}
