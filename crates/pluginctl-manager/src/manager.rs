//! Plugin manager command facade
//!
//! [`PluginManager`] composes the registry, catalog, install engine and a
//! [`ConfirmationGateway`] into the user-facing commands. It returns
//! structured outcomes; rendering them is up to the caller.

use crate::catalog::{
    CatalogSnapshot, PluginCandidate, RepositoryFailure, ResolvedVersion, SourceSelector,
    VersionCatalog, VersionRequest,
};
use crate::download::ArchiveDownloader;
use crate::engine::{InstallEngine, InstallOutcome};
use crate::manifest::ManifestStore;
use crate::prompt::ConfirmationGateway;
use crate::registry::{RepositoryChange, RepositoryRegistry};
use pluginctl_core::types::{InstalledPlugin, Repository};
use pluginctl_core::{Error, HomeLayout, PluginVersion, PluginsConfig, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

const PLUGIN_PROMPT: &str = "Please enter the index or name of a plugin";
const REPOSITORY_PROMPT: &str = "Please enter the index or name of a repository";

const ABOUT: &str = "\
pluginctl manages plugins published in remote plugin repositories.

A plugin repository is a JSON manifest listing plugins, their versions and
the package archive of every edition. Register repositories with
'pluginctl repositories add <URL>', browse what they offer with
'pluginctl list' and 'pluginctl details', then install, update or uninstall
plugins. Installed plugins live in one directory per plugin under the
plugins folder of the user config home and are tracked in a local index
together with the repository they came from.";

/// Result of [`PluginManager::update`]
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    Upgraded(InstallOutcome),
    AlreadyUpToDate(InstalledPlugin),
    Cancelled,
}

/// Result of [`PluginManager::uninstall`]
#[derive(Debug, Clone)]
pub enum UninstallOutcome {
    Uninstalled(InstalledPlugin),
    Cancelled,
}

/// One line of a plugin listing
#[derive(Debug, Clone, Serialize)]
pub struct ListingRow {
    /// Catalog entry index; absent for installed plugins no repository offers
    pub index: Option<usize>,
    pub name: String,
    pub caption: String,
    pub latest: Option<String>,
    pub installed: Option<String>,
    pub repository: Option<String>,
    pub update_available: bool,
}

/// Plugins offered and installed, plus repositories that could not be read
#[derive(Debug)]
pub struct PluginListing {
    pub rows: Vec<ListingRow>,
    pub failures: Vec<RepositoryFailure>,
}

/// One published version as shown by `details`
#[derive(Debug, Clone, Serialize)]
pub struct VersionDetails {
    pub version: String,
    pub development_stage: String,
    pub changes: Vec<String>,
    pub available: bool,
}

/// Everything known about one plugin candidate
#[derive(Debug, Clone, Serialize)]
pub struct PluginDetails {
    pub name: String,
    pub caption: String,
    pub description: String,
    pub module_name: String,
    pub repository: Repository,
    pub editions: Vec<String>,
    pub latest: Option<String>,
    pub versions: Vec<VersionDetails>,
    pub installed: Option<InstalledPlugin>,
}

/// Where things live and how the manager is configured
#[derive(Debug, Clone, Serialize)]
pub struct ManagerInfo {
    pub version: String,
    pub home: PathBuf,
    pub plugins_dir: PathBuf,
    pub registry_path: PathBuf,
    pub index_path: PathBuf,
    pub edition: String,
    pub entry_module: String,
    pub repositories: usize,
    pub installed: usize,
}

/// The plugin manager
pub struct PluginManager {
    layout: HomeLayout,
    config: PluginsConfig,
    registry: RepositoryRegistry,
    catalog: VersionCatalog,
    engine: InstallEngine,
    gateway: Box<dyn ConfirmationGateway>,
}

impl PluginManager {
    /// Open the manager state stored under `layout`
    pub fn open(
        layout: HomeLayout,
        config: PluginsConfig,
        gateway: Box<dyn ConfirmationGateway>,
    ) -> Result<Self> {
        let store = ManifestStore::new(&config.network)?;
        let downloader = ArchiveDownloader::new(&config.network)?;
        let registry = RepositoryRegistry::load(layout.registry_path())?;
        let engine = InstallEngine::new(&layout, &config, downloader)?;

        debug!("Opened plugin manager at {}", layout.root().display());
        Ok(Self {
            layout,
            config,
            registry,
            catalog: VersionCatalog::new(store),
            engine,
            gateway,
        })
    }

    /// Enable or disable download progress bars
    pub fn with_progress(mut self, show: bool) -> Self {
        self.engine.set_show_progress(show);
        self
    }

    pub fn config(&self) -> &PluginsConfig {
        &self.config
    }

    /// Registered repositories in registration order
    pub fn repositories(&self) -> &[Repository] {
        self.registry.list()
    }

    /// Installed plugins in name order
    pub fn installed(&self) -> Vec<&InstalledPlugin> {
        self.engine.index().list()
    }

    pub fn entry_point(&self, name: &str) -> Result<PathBuf> {
        self.engine.entry_point(name)
    }

    pub async fn add_repository(&mut self, url: &str) -> Result<RepositoryChange> {
        self.registry
            .add(url, self.catalog.store(), self.gateway.as_mut())
            .await
    }

    /// Unregister a repository; installed plugins are left alone
    pub fn remove_repository(&mut self, key: Option<&str>) -> Result<RepositoryChange> {
        let repository = match key {
            Some(key) => self.registry.find_unique(key)?.clone(),
            None => {
                let options: Vec<String> = self
                    .registry
                    .list()
                    .iter()
                    .map(|r| format!("{} ({})", r.name, r.url))
                    .collect();
                if options.is_empty() {
                    return Err(Error::selection("no repositories are registered"));
                }
                let choice = self.gateway.choose(REPOSITORY_PROMPT, &options)?;
                chosen(self.registry.list(), choice)?
            }
        };

        let question = format!(
            "Are you sure you want to remove the repository '{}'?",
            repository.name
        );
        if !self.gateway.confirm(&question, Some(false))? {
            return Ok(RepositoryChange::Cancelled);
        }

        let removed = self.registry.remove(&repository.url)?;
        Ok(RepositoryChange::Removed(removed))
    }

    /// Fetch every registered manifest into a fresh snapshot
    pub async fn refresh(&self) -> CatalogSnapshot {
        self.catalog.refresh(&self.registry).await
    }

    /// Offered plugins joined with local state
    pub async fn list(&self, installed_only: bool) -> Result<PluginListing> {
        let snapshot = self.refresh().await;
        let index = self.engine.index();

        let mut rows: Vec<ListingRow> = snapshot
            .entries()
            .into_iter()
            .map(|entry| {
                let descriptor = &entry.candidate.descriptor;
                let latest = entry.candidate.latest().map(|v| v.version.clone());
                let installed = index
                    .get(&descriptor.name)
                    .filter(|p| p.source_repository_url == entry.candidate.repository.url);
                let update_available = match (&latest, installed) {
                    (Some(latest), Some(installed)) => latest > &installed.installed_version,
                    _ => false,
                };

                ListingRow {
                    index: Some(entry.index),
                    name: descriptor.name.clone(),
                    caption: descriptor.caption.clone(),
                    latest: latest.map(|v| v.to_string()),
                    installed: installed.map(|p| p.installed_version.to_string()),
                    repository: Some(entry.candidate.repository.name.clone()),
                    update_available,
                }
            })
            .collect();

        for plugin in index.list() {
            let offered = snapshot.plugin(&plugin.name).is_some_and(|aggregated| {
                aggregated
                    .candidates
                    .iter()
                    .any(|c| c.repository.url == plugin.source_repository_url)
            });
            if !offered {
                rows.push(ListingRow {
                    index: None,
                    name: plugin.name.clone(),
                    caption: plugin.caption.clone(),
                    latest: None,
                    installed: Some(plugin.installed_version.to_string()),
                    repository: self
                        .registry
                        .list()
                        .iter()
                        .find(|r| r.url == plugin.source_repository_url)
                        .map(|r| r.name.clone()),
                    update_available: false,
                });
            }
        }

        if installed_only {
            rows.retain(|row| row.installed.is_some());
        }

        Ok(PluginListing {
            rows,
            failures: snapshot.into_failures(),
        })
    }

    pub fn info(&self) -> ManagerInfo {
        ManagerInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            home: self.layout.root().to_path_buf(),
            plugins_dir: self.layout.plugins_dir(),
            registry_path: self.layout.registry_path(),
            index_path: self.layout.index_path(),
            edition: self.config.edition.clone(),
            entry_module: self.config.entry_module.clone(),
            repositories: self.registry.list().len(),
            installed: self.engine.index().list().len(),
        }
    }

    pub fn about() -> &'static str {
        ABOUT
    }

    /// Details of one plugin, prompting when `key` is omitted or ambiguous
    pub async fn details(&mut self, key: Option<&str>) -> Result<PluginDetails> {
        let snapshot = self.refresh().await;
        let (name, source) = self.select_candidate(&snapshot, key)?;
        let plugin = snapshot
            .plugin(&name)
            .ok_or_else(|| Error::plugin_not_found(&name))?;

        let candidate = match source {
            SourceSelector::Entry(index) => snapshot.entry(index)?.candidate,
            SourceSelector::Candidate(position) => plugin
                .candidates
                .get(position.saturating_sub(1))
                .ok_or_else(|| Error::selection(format!("source {} is out of range", position)))?,
            _ => plugin
                .candidates
                .first()
                .ok_or_else(|| Error::plugin_not_found(&name))?,
        };

        let descriptor = &candidate.descriptor;
        let edition = &self.config.edition;
        Ok(PluginDetails {
            name: descriptor.name.clone(),
            caption: descriptor.caption.clone(),
            description: descriptor.description.clone(),
            module_name: descriptor.module_name.clone(),
            repository: candidate.repository.clone(),
            editions: descriptor.editions.iter().map(|e| e.name.clone()).collect(),
            latest: descriptor.latest().map(|v| v.version.to_string()),
            versions: descriptor
                .versions_descending()
                .into_iter()
                .map(|v| VersionDetails {
                    version: v.version.to_string(),
                    development_stage: v.development_stage.clone(),
                    changes: v.changes.clone(),
                    available: v.url_for(edition).is_some(),
                })
                .collect(),
            installed: self.engine.index().get(&descriptor.name).cloned(),
        })
    }

    /// Install a plugin by name or catalog index
    ///
    /// `source` is a candidate position or a repository url.
    pub async fn install(
        &mut self,
        key: &str,
        version: Option<&str>,
        force: bool,
        source: Option<&str>,
    ) -> Result<InstallOutcome> {
        let snapshot = self.refresh().await;
        let resolved = self.resolve_install(&snapshot, key, version, source)?;
        self.engine.install(&resolved, force).await
    }

    fn resolve_install(
        &mut self,
        snapshot: &CatalogSnapshot,
        key: &str,
        version: Option<&str>,
        source: Option<&str>,
    ) -> Result<ResolvedVersion> {
        let key = key.trim();
        let (name, mut selector) = match key.parse::<usize>() {
            Ok(index) => {
                let entry = snapshot.entry(index)?;
                (
                    entry.candidate.descriptor.name.clone(),
                    SourceSelector::Entry(index),
                )
            }
            Err(_) => (key.to_string(), SourceSelector::Any),
        };

        if let Some(source) = source {
            if selector != SourceSelector::Any {
                return Err(Error::selection(
                    "a catalog index already selects the source repository",
                ));
            }
            let source = source.trim();
            selector = match source.parse::<usize>() {
                Ok(position) => SourceSelector::Candidate(position),
                Err(_) => SourceSelector::Url(source.to_string()),
            };
        } else if selector == SourceSelector::Any {
            let plugin = snapshot
                .plugin(&name)
                .ok_or_else(|| Error::plugin_not_found(&name))?;
            if plugin.candidates.len() > 1 {
                let candidates: Vec<&PluginCandidate> = plugin.candidates.iter().collect();
                let choice = self.choose_source(&name, &candidates)?;
                selector = SourceSelector::Candidate(choice + 1);
            }
        }

        let request = match version {
            Some(text) => VersionRequest::Exact(PluginVersion::parse(text).map_err(|e| {
                Error::VersionNotFound {
                    name: name.clone(),
                    version: text.to_string(),
                    detail: Some(e),
                }
            })?),
            None => VersionRequest::Latest,
        };

        snapshot.resolve(&name, &request, &selector)
    }

    /// Upgrade an installed plugin to the newest version any repository offers
    pub async fn update(&mut self, name: Option<&str>) -> Result<UpdateOutcome> {
        let name = self.select_installed(name)?;
        let installed = self
            .engine
            .index()
            .get(&name)
            .cloned()
            .ok_or_else(|| Error::not_installed(&name))?;

        let snapshot = self.refresh().await;
        let mut latest =
            snapshot.resolve_preferring(&name, Some(installed.source_repository_url.as_str()))?;

        if latest.version() <= &installed.installed_version {
            info!("{} {} is up to date", name, installed.installed_version);
            return Ok(UpdateOutcome::AlreadyUpToDate(installed));
        }

        if latest.repository.url != installed.source_repository_url {
            latest = self.choose_upgrade_source(&snapshot, &name, latest)?;
        }

        let question = format!(
            "Are you sure you want to update the '{}'?",
            installed.caption
        );
        if !self.gateway.confirm(&question, Some(true))? {
            return Ok(UpdateOutcome::Cancelled);
        }

        let outcome = self.engine.install(&latest, true).await?;
        Ok(UpdateOutcome::Upgraded(outcome))
    }

    pub async fn uninstall(&mut self, name: Option<&str>) -> Result<UninstallOutcome> {
        let name = self.select_installed(name)?;
        if self.engine.index().get(&name).is_none() {
            return Err(Error::not_installed(&name));
        }

        let question = format!("Are you sure you want to uninstall the plugin '{}'?", name);
        if !self.gateway.confirm(&question, Some(false))? {
            return Ok(UninstallOutcome::Cancelled);
        }

        let removed = self.engine.uninstall(&name).await?;
        Ok(UninstallOutcome::Uninstalled(removed))
    }

    fn select_installed(&mut self, name: Option<&str>) -> Result<String> {
        if let Some(name) = name {
            return Ok(name.trim().to_string());
        }

        let options: Vec<String> = self
            .engine
            .index()
            .list()
            .iter()
            .map(|p| p.name.clone())
            .collect();
        if options.is_empty() {
            return Err(Error::selection("no plugins are installed"));
        }
        let choice = self.gateway.choose(PLUGIN_PROMPT, &options)?;
        chosen(&options, choice)
    }

    /// The recorded source no longer offers the newest version; let the
    /// user pick when more than one other repository does
    fn choose_upgrade_source(
        &mut self,
        snapshot: &CatalogSnapshot,
        name: &str,
        latest: ResolvedVersion,
    ) -> Result<ResolvedVersion> {
        let plugin = snapshot
            .plugin(name)
            .ok_or_else(|| Error::plugin_not_found(name))?;
        let offering: Vec<&PluginCandidate> = plugin
            .candidates
            .iter()
            .filter(|c| c.descriptor.find_version(latest.version()).is_some())
            .collect();
        if offering.len() < 2 {
            return Ok(latest);
        }

        let choice = self.choose_source(name, &offering)?;
        let url = chosen(&offering, choice)?.repository.url.clone();
        snapshot.resolve(
            name,
            &VersionRequest::Exact(latest.version().clone()),
            &SourceSelector::Url(url),
        )
    }

    /// Ask which of `candidates` to use; returns a position in `candidates`
    fn choose_source(&mut self, name: &str, candidates: &[&PluginCandidate]) -> Result<usize> {
        let options: Vec<String> = candidates
            .iter()
            .map(|c| format!("{} ({})", c.repository.name, c.repository.url))
            .collect();
        let prompt = format!("'{}' is offered by several repositories, pick one", name);
        let choice = self.gateway.choose(&prompt, &options)?;
        if choice >= options.len() {
            return Err(out_of_range(choice));
        }
        Ok(choice)
    }

    /// Narrow a free-text key down to one plugin candidate
    fn select_candidate(
        &mut self,
        snapshot: &CatalogSnapshot,
        key: Option<&str>,
    ) -> Result<(String, SourceSelector)> {
        let name = match key.map(str::trim) {
            Some(key) => {
                if let Ok(index) = key.parse::<usize>() {
                    let entry = snapshot.entry(index)?;
                    return Ok((
                        entry.candidate.descriptor.name.clone(),
                        SourceSelector::Entry(index),
                    ));
                }
                key.to_string()
            }
            None => {
                let names: Vec<String> = snapshot.plugins().map(|p| p.name.clone()).collect();
                if names.is_empty() {
                    return Err(Error::selection("no plugins are available"));
                }
                let choice = self.gateway.choose(PLUGIN_PROMPT, &names)?;
                chosen(&names, choice)?
            }
        };

        let plugin = snapshot
            .plugin(&name)
            .ok_or_else(|| Error::plugin_not_found(&name))?;
        if plugin.candidates.len() == 1 {
            return Ok((name, SourceSelector::Candidate(1)));
        }

        let candidates: Vec<&PluginCandidate> = plugin.candidates.iter().collect();
        let choice = self.choose_source(&name, &candidates)?;
        Ok((name, SourceSelector::Candidate(choice + 1)))
    }
}

/// Option at a gateway-supplied index
fn chosen<T: Clone>(options: &[T], choice: usize) -> Result<T> {
    options
        .get(choice)
        .cloned()
        .ok_or_else(|| out_of_range(choice))
}

fn out_of_range(choice: usize) -> Error {
    Error::selection(format!("choice {} is out of range", choice + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Confirms everything and picks a fixed position, recording the options shown
    struct FixedChoice {
        choice: usize,
        shown: Arc<Mutex<Vec<String>>>,
    }

    impl ConfirmationGateway for FixedChoice {
        fn confirm(&mut self, _question: &str, _default: Option<bool>) -> Result<bool> {
            Ok(true)
        }

        fn choose(&mut self, _prompt: &str, options: &[String]) -> Result<usize> {
            *self.shown.lock().unwrap() = options.to_vec();
            Ok(self.choice)
        }
    }

    fn manager_choosing(choice: usize) -> (PluginManager, Arc<Mutex<Vec<String>>>, TempDir) {
        let temp = TempDir::new().unwrap();
        let shown = Arc::new(Mutex::new(Vec::new()));
        let gateway = FixedChoice {
            choice,
            shown: Arc::clone(&shown),
        };
        let mut manager = PluginManager::open(
            HomeLayout::new(temp.path()),
            PluginsConfig::default(),
            Box::new(gateway),
        )
        .unwrap();
        manager
            .registry
            .insert(Repository::new("http://a/m.json", "Shared", ""))
            .unwrap();
        manager
            .registry
            .insert(Repository::new("http://b/m.json", "Shared", ""))
            .unwrap();
        (manager, shown, temp)
    }

    #[test]
    fn test_out_of_range_choice_is_selection_error() {
        let (mut manager, _shown, _temp) = manager_choosing(99);

        let err = manager.remove_repository(None).unwrap_err();
        assert!(matches!(err, Error::Selection { .. }));
        assert_eq!(manager.repositories().len(), 2);
    }

    #[test]
    fn test_repository_choice_shows_urls() {
        let (mut manager, shown, _temp) = manager_choosing(1);

        let change = manager.remove_repository(None).unwrap();
        match change {
            RepositoryChange::Removed(removed) => assert_eq!(removed.url, "http://b/m.json"),
            other => panic!("unexpected change: {:?}", other),
        }
        assert_eq!(
            *shown.lock().unwrap(),
            vec!["Shared (http://a/m.json)", "Shared (http://b/m.json)"]
        );
        assert_eq!(manager.repositories()[0].url, "http://a/m.json");
    }

    #[test]
    fn test_shared_repository_name_is_rejected() {
        let (mut manager, _shown, _temp) = manager_choosing(0);

        let err = manager.remove_repository(Some("Shared")).unwrap_err();
        assert!(matches!(err, Error::Selection { .. }));
        assert_eq!(manager.repositories().len(), 2);

        manager.remove_repository(Some("http://a/m.json")).unwrap();
        assert_eq!(manager.repositories()[0].url, "http://b/m.json");
    }

    #[test]
    fn test_chosen_checks_bounds() {
        let options = vec!["a".to_string(), "b".to_string()];
        assert_eq!(chosen(&options, 1).unwrap(), "b");
        assert!(matches!(chosen(&options, 2), Err(Error::Selection { .. })));
    }
}
