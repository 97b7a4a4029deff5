//! Version catalog
//!
//! [`VersionCatalog::refresh`] fetches every registered manifest and
//! aggregates the result into an immutable [`CatalogSnapshot`]. Nothing is
//! cached between refreshes.
//!
//! Within a snapshot every (plugin, repository) pair is a [`PluginCandidate`].
//! Candidates of one plugin are kept in repository registration order, and
//! [`CatalogSnapshot::entries`] numbers all candidates from 1, ordered by
//! plugin name and then registration order. Listings show that number and
//! selection by index refers to it.

use crate::manifest::ManifestStore;
use crate::registry::RepositoryRegistry;
use futures::future::join_all;
use pluginctl_core::types::{PluginDescriptor, Repository, VersionEntry};
use pluginctl_core::{Error, PluginVersion, Result};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// One plugin as offered by one repository
#[derive(Debug, Clone)]
pub struct PluginCandidate {
    pub repository: Repository,

    /// Zero-based registration position of the repository
    pub registration: usize,

    pub descriptor: PluginDescriptor,
}

impl PluginCandidate {
    pub fn latest(&self) -> Option<&VersionEntry> {
        self.descriptor.latest()
    }
}

/// Every candidate for a plugin name, in registration order
#[derive(Debug, Clone)]
pub struct AggregatedPlugin {
    pub name: String,
    pub candidates: Vec<PluginCandidate>,
}

impl AggregatedPlugin {
    /// Highest version offered by any candidate
    pub fn latest_version(&self) -> Option<&PluginVersion> {
        self.candidates
            .iter()
            .filter_map(|c| c.latest())
            .map(|v| &v.version)
            .max()
    }
}

/// A repository whose manifest could not be used in this snapshot
#[derive(Debug)]
pub struct RepositoryFailure {
    pub repository: Repository,
    pub error: Error,
}

/// A numbered candidate as shown in listings
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry<'a> {
    /// 1-based, stable within the snapshot
    pub index: usize,
    pub candidate: &'a PluginCandidate,
}

/// Which version to resolve
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VersionRequest {
    #[default]
    Latest,
    Exact(PluginVersion),
}

/// Restricts resolution to one candidate
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SourceSelector {
    #[default]
    Any,
    /// 1-based position among the plugin's candidates
    Candidate(usize),
    /// 1-based catalog entry index
    Entry(usize),
    /// Repository url
    Url(String),
}

/// A concrete version chosen from one candidate
#[derive(Debug, Clone)]
pub struct ResolvedVersion {
    pub repository: Repository,
    pub descriptor: PluginDescriptor,
    pub entry: VersionEntry,
}

impl ResolvedVersion {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn version(&self) -> &PluginVersion {
        &self.entry.version
    }
}

/// Immutable view of all manifests at one point in time
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    repositories: Vec<Repository>,
    plugins: BTreeMap<String, AggregatedPlugin>,
    failures: Vec<RepositoryFailure>,
}

impl CatalogSnapshot {
    /// Build a snapshot from per-repository fetch results in registration order
    pub fn from_results(
        results: Vec<(Repository, Result<pluginctl_core::types::Manifest>)>,
    ) -> Self {
        let mut snapshot = Self::default();

        for (registration, (repository, result)) in results.into_iter().enumerate() {
            snapshot.repositories.push(repository.clone());
            match result {
                Ok(manifest) => {
                    for descriptor in manifest.plugins {
                        snapshot
                            .plugins
                            .entry(descriptor.name.clone())
                            .or_insert_with(|| AggregatedPlugin {
                                name: descriptor.name.clone(),
                                candidates: Vec::new(),
                            })
                            .candidates
                            .push(PluginCandidate {
                                repository: repository.clone(),
                                registration,
                                descriptor,
                            });
                    }
                }
                Err(error) => {
                    warn!("Skipping repository {}: {}", repository.url, error);
                    snapshot
                        .failures
                        .push(RepositoryFailure { repository, error });
                }
            }
        }

        snapshot
    }

    /// Repositories considered, in registration order
    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    pub fn failures(&self) -> &[RepositoryFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<RepositoryFailure> {
        self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn plugin(&self, name: &str) -> Option<&AggregatedPlugin> {
        self.plugins.get(name)
    }

    /// Plugins in name order
    pub fn plugins(&self) -> impl Iterator<Item = &AggregatedPlugin> {
        self.plugins.values()
    }

    /// Every candidate, numbered from 1
    pub fn entries(&self) -> Vec<CatalogEntry<'_>> {
        self.plugins
            .values()
            .flat_map(|plugin| plugin.candidates.iter())
            .enumerate()
            .map(|(i, candidate)| CatalogEntry {
                index: i + 1,
                candidate,
            })
            .collect()
    }

    /// Look up a catalog entry by its 1-based index
    pub fn entry(&self, index: usize) -> Result<CatalogEntry<'_>> {
        let entries = self.entries();
        let count = entries.len();
        entries
            .into_iter()
            .find(|e| e.index == index)
            .ok_or_else(|| {
                Error::selection(format!(
                    "index {} is out of range, the catalog has {} entries",
                    index, count
                ))
            })
    }

    /// Resolve a plugin name to one concrete version
    ///
    /// Latest is the highest version across candidates; among candidates
    /// offering it, the earliest registered wins. An explicit version picks
    /// the earliest registered candidate offering it.
    pub fn resolve(
        &self,
        name: &str,
        request: &VersionRequest,
        source: &SourceSelector,
    ) -> Result<ResolvedVersion> {
        let plugin = self
            .plugin(name)
            .ok_or_else(|| Error::plugin_not_found(name))?;
        let candidates = self.restrict(plugin, source)?;

        let chosen = match request {
            VersionRequest::Latest => {
                let latest = candidates
                    .iter()
                    .filter_map(|c| c.latest().map(|v| v.version.clone()))
                    .max()
                    .ok_or_else(|| Error::VersionNotFound {
                        name: name.to_string(),
                        version: "latest".to_string(),
                        detail: Some("no versions are published".to_string()),
                    })?;
                first_offering(&candidates, &latest)
            }
            VersionRequest::Exact(version) => first_offering(&candidates, version),
        };

        chosen.ok_or_else(|| {
            let requested = match request {
                VersionRequest::Latest => "latest".to_string(),
                VersionRequest::Exact(v) => v.to_string(),
            };
            Error::version_not_found(name, requested)
        })
    }

    /// Latest version of `name`, preferring `preferred_url` on ties
    pub fn resolve_preferring(
        &self,
        name: &str,
        preferred_url: Option<&str>,
    ) -> Result<ResolvedVersion> {
        let plugin = self
            .plugin(name)
            .ok_or_else(|| Error::plugin_not_found(name))?;

        let latest = plugin
            .latest_version()
            .cloned()
            .ok_or_else(|| Error::VersionNotFound {
                name: name.to_string(),
                version: "latest".to_string(),
                detail: Some("no versions are published".to_string()),
            })?;

        let mut ordered: Vec<&PluginCandidate> = plugin.candidates.iter().collect();
        if let Some(url) = preferred_url {
            ordered.sort_by_key(|c| c.repository.url != url);
        }

        first_offering(&ordered, &latest)
            .ok_or_else(|| Error::version_not_found(name, latest.to_string()))
    }

    fn restrict<'a>(
        &'a self,
        plugin: &'a AggregatedPlugin,
        source: &SourceSelector,
    ) -> Result<Vec<&'a PluginCandidate>> {
        match source {
            SourceSelector::Any => Ok(plugin.candidates.iter().collect()),
            SourceSelector::Candidate(position) => position
                .checked_sub(1)
                .and_then(|i| plugin.candidates.get(i))
                .map(|c| vec![c])
                .ok_or_else(|| {
                    Error::selection(format!(
                        "source {} is out of range, '{}' is offered by {} repositories",
                        position,
                        plugin.name,
                        plugin.candidates.len()
                    ))
                }),
            SourceSelector::Entry(index) => {
                let entry = self.entry(*index)?;
                if entry.candidate.descriptor.name != plugin.name {
                    return Err(Error::selection(format!(
                        "entry {} is '{}', not '{}'",
                        index, entry.candidate.descriptor.name, plugin.name
                    )));
                }
                Ok(vec![entry.candidate])
            }
            SourceSelector::Url(url) => {
                let url = url.trim();
                plugin
                    .candidates
                    .iter()
                    .find(|c| c.repository.url == url)
                    .map(|c| vec![c])
                    .ok_or_else(|| {
                        Error::selection(format!(
                            "repository {} does not offer '{}'",
                            url, plugin.name
                        ))
                    })
            }
        }
    }
}

fn first_offering(
    candidates: &[&PluginCandidate],
    version: &PluginVersion,
) -> Option<ResolvedVersion> {
    candidates.iter().find_map(|candidate| {
        candidate
            .descriptor
            .find_version(version)
            .map(|entry| ResolvedVersion {
                repository: candidate.repository.clone(),
                descriptor: candidate.descriptor.clone(),
                entry: entry.clone(),
            })
    })
}

/// Builds snapshots from the registered repositories
#[derive(Debug, Clone)]
pub struct VersionCatalog {
    store: ManifestStore,
}

impl VersionCatalog {
    pub fn new(store: ManifestStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    /// Fetch every registered manifest concurrently
    pub async fn refresh(&self, registry: &RepositoryRegistry) -> CatalogSnapshot {
        self.refresh_repositories(registry.list()).await
    }

    pub async fn refresh_repositories(&self, repositories: &[Repository]) -> CatalogSnapshot {
        debug!("Refreshing {} repositories", repositories.len());

        let fetches = repositories.iter().map(|repository| async move {
            let result = self.store.fetch(&repository.url).await;
            (repository.clone(), result)
        });
        let results = join_all(fetches).await;

        CatalogSnapshot::from_results(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pluginctl_core::types::{Edition, Manifest, RepositoryInfo, MANIFEST_FILE_TYPE};

    fn descriptor(name: &str, versions: &[&str]) -> PluginDescriptor {
        PluginDescriptor {
            name: name.to_string(),
            caption: format!("{} caption", name),
            module_name: name.to_string(),
            description: String::new(),
            latest_version: versions.first().copied().unwrap_or("0.0.0").to_string(),
            editions: vec![Edition {
                name: "community".to_string(),
                package_prefix: name.to_string(),
                license_header: String::new(),
                license_file: String::new(),
            }],
            versions: versions
                .iter()
                .map(|v| VersionEntry {
                    version: PluginVersion::parse(v).unwrap(),
                    development_stage: "preview".to_string(),
                    changes: vec![],
                    urls: [(
                        "community".to_string(),
                        format!("http://127.0.0.1:9/{}-{}.zip", name, v),
                    )]
                    .into_iter()
                    .collect(),
                    sha256: BTreeMap::new(),
                })
                .collect(),
        }
    }

    fn manifest(plugins: Vec<PluginDescriptor>) -> Manifest {
        Manifest {
            file_type: MANIFEST_FILE_TYPE.to_string(),
            version: "0.0.1".to_string(),
            release_version: None,
            repository: RepositoryInfo {
                name: "r".to_string(),
                description: String::new(),
            },
            plugins,
        }
    }

    fn repo(name: &str) -> Repository {
        Repository::new(format!("http://{}/m.json", name), name, "")
    }

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot::from_results(vec![
            (
                repo("first"),
                Ok(manifest(vec![
                    descriptor("zeta", &["1.0.0"]),
                    descriptor("alpha", &["0.1", "0.2.0"]),
                ])),
            ),
            (
                repo("broken"),
                Err(Error::network("http://broken/m.json", "refused")),
            ),
            (
                repo("second"),
                Ok(manifest(vec![descriptor("alpha", &["0.2.0", "0.3.0"])])),
            ),
        ])
    }

    #[test]
    fn test_entries_are_numbered_by_name_then_registration() {
        let snapshot = snapshot();
        let entries: Vec<_> = snapshot
            .entries()
            .iter()
            .map(|e| {
                (
                    e.index,
                    e.candidate.descriptor.name.clone(),
                    e.candidate.repository.name.clone(),
                )
            })
            .collect();

        assert_eq!(
            entries,
            vec![
                (1, "alpha".to_string(), "first".to_string()),
                (2, "alpha".to_string(), "second".to_string()),
                (3, "zeta".to_string(), "first".to_string()),
            ]
        );
    }

    #[test]
    fn test_failures_are_recorded() {
        let snapshot = snapshot();
        assert_eq!(snapshot.failures().len(), 1);
        assert_eq!(snapshot.failures()[0].repository.name, "broken");
        assert_eq!(snapshot.repositories().len(), 3);
    }

    #[test]
    fn test_latest_across_candidates() {
        let snapshot = snapshot();
        let resolved = snapshot
            .resolve("alpha", &VersionRequest::Latest, &SourceSelector::Any)
            .unwrap();
        assert_eq!(resolved.version().to_string(), "0.3.0");
        assert_eq!(resolved.repository.name, "second");
    }

    #[test]
    fn test_exact_version_prefers_first_registered() {
        let snapshot = snapshot();
        let version = VersionRequest::Exact(PluginVersion::parse("0.2").unwrap());
        let resolved = snapshot
            .resolve("alpha", &version, &SourceSelector::Any)
            .unwrap();
        assert_eq!(resolved.repository.name, "first");
    }

    #[test]
    fn test_source_restriction() {
        let snapshot = snapshot();
        let resolved = snapshot
            .resolve("alpha", &VersionRequest::Latest, &SourceSelector::Candidate(1))
            .unwrap();
        assert_eq!(resolved.version().to_string(), "0.2.0");

        let resolved = snapshot
            .resolve("alpha", &VersionRequest::Latest, &SourceSelector::Entry(2))
            .unwrap();
        assert_eq!(resolved.repository.name, "second");

        assert!(matches!(
            snapshot.resolve("alpha", &VersionRequest::Latest, &SourceSelector::Candidate(3)),
            Err(Error::Selection { .. })
        ));
        assert!(matches!(
            snapshot.resolve("alpha", &VersionRequest::Latest, &SourceSelector::Entry(3)),
            Err(Error::Selection { .. })
        ));
        assert!(matches!(
            snapshot.entry(9),
            Err(Error::Selection { .. })
        ));
    }

    #[test]
    fn test_missing_plugin_and_version() {
        let snapshot = snapshot();
        assert!(matches!(
            snapshot.resolve("nope", &VersionRequest::Latest, &SourceSelector::Any),
            Err(Error::PluginNotFound { .. })
        ));
        let version = VersionRequest::Exact(PluginVersion::parse("9.9.9").unwrap());
        assert!(matches!(
            snapshot.resolve("alpha", &version, &SourceSelector::Any),
            Err(Error::VersionNotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_preferring_source_on_tie() {
        let snapshot = CatalogSnapshot::from_results(vec![
            (repo("a"), Ok(manifest(vec![descriptor("p", &["1.0.0"])]))),
            (repo("b"), Ok(manifest(vec![descriptor("p", &["1.0.0"])]))),
        ]);

        let default = snapshot.resolve_preferring("p", None).unwrap();
        assert_eq!(default.repository.name, "a");

        let preferred = snapshot
            .resolve_preferring("p", Some("http://b/m.json"))
            .unwrap();
        assert_eq!(preferred.repository.name, "b");
    }
}
