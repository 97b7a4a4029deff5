//! Install engine
//!
//! Drives the per-plugin state machine `Absent -> Installed(v) -> Installed(v')
//! -> Absent`. A new version is downloaded, extracted into
//! `<plugins>/.staging/<module>-<uuid>` and validated before anything under
//! the active plugin directory is touched. Activation then swaps directories:
//!
//! 1. rename the active directory to a backup
//! 2. rename the staged package into place
//! 3. persist the index
//! 4. delete the backup
//!
//! A failure in step 2 or 3 restores the backup, so the plugin directory and
//! the index always describe either the old or the new state.

use crate::archive;
use crate::catalog::ResolvedVersion;
use crate::download::ArchiveDownloader;
use crate::index::LocalPluginIndex;
use chrono::Utc;
use fs4::fs_std::FileExt;
use pluginctl_core::types::InstalledPlugin;
use pluginctl_core::{Error, HomeLayout, PluginVersion, PluginsConfig, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const STAGING_DIR: &str = ".staging";
const LOCK_FILE: &str = ".lock";

/// Result of [`InstallEngine::install`]
#[derive(Debug, Clone)]
pub enum InstallOutcome {
    /// The plugin was absent
    Installed(InstalledPlugin),
    /// Forced reinstall of the installed version
    Reinstalled(InstalledPlugin),
    /// Upgrade or downgrade
    Changed {
        from: PluginVersion,
        to: PluginVersion,
        plugin: InstalledPlugin,
    },
    /// Same version already present; nothing was downloaded
    AlreadyInstalled(InstalledPlugin),
}

impl InstallOutcome {
    pub fn plugin(&self) -> &InstalledPlugin {
        match self {
            Self::Installed(plugin)
            | Self::Reinstalled(plugin)
            | Self::AlreadyInstalled(plugin)
            | Self::Changed { plugin, .. } => plugin,
        }
    }
}

/// Per-operation staging directory, removed on drop
struct StagingArea {
    path: PathBuf,
}

impl StagingArea {
    fn create(plugins_dir: &Path, module_name: &str) -> Result<Self> {
        let path = plugins_dir
            .join(STAGING_DIR)
            .join(format!("{}-{}", module_name, uuid::Uuid::new_v4()));
        fs::create_dir_all(&path)?;
        debug!("Created staging directory {}", path.display());
        Ok(Self { path })
    }

    fn package_dir(&self) -> PathBuf {
        self.path.join("package")
    }

    fn backup_dir(&self) -> PathBuf {
        self.path.join("backup")
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_dir_all(&self.path) {
                warn!(
                    "Failed to remove staging directory {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

/// Sole writer of the plugins directory and the local index
pub struct InstallEngine {
    plugins_dir: PathBuf,
    edition: String,
    entry_module: String,
    downloader: ArchiveDownloader,
    index: LocalPluginIndex,
}

impl InstallEngine {
    pub fn new(
        layout: &HomeLayout,
        config: &PluginsConfig,
        downloader: ArchiveDownloader,
    ) -> Result<Self> {
        Ok(Self {
            plugins_dir: layout.plugins_dir(),
            edition: config.edition.clone(),
            entry_module: config.entry_module.clone(),
            downloader,
            index: LocalPluginIndex::load(layout.index_path())?,
        })
    }

    /// Enable or disable the download progress bar
    pub fn set_show_progress(&mut self, show: bool) {
        self.downloader = self.downloader.clone().with_progress(show);
    }

    pub fn index(&self) -> &LocalPluginIndex {
        &self.index
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }

    pub fn edition(&self) -> &str {
        &self.edition
    }

    /// Path of an installed plugin's entry module
    pub fn entry_point(&self, name: &str) -> Result<PathBuf> {
        let plugin = self
            .index
            .get(name)
            .ok_or_else(|| Error::not_installed(name))?;
        let entry = plugin.install_path.join(&self.entry_module);
        if !entry.is_file() {
            warn!(
                "Plugin '{}' is indexed but {} is missing",
                name,
                entry.display()
            );
            return Err(Error::not_installed(name));
        }
        Ok(entry)
    }

    /// Install `resolved`, replacing any installed version of the plugin
    pub async fn install(
        &mut self,
        resolved: &ResolvedVersion,
        force: bool,
    ) -> Result<InstallOutcome> {
        let _lock = self.lock()?;
        self.index.reload()?;

        let name = resolved.name().to_string();
        let version = resolved.version().clone();
        let fail = |message: String| Error::installation_failed(&name, version.to_string(), message);

        let existing = self.index.get(&name).cloned();
        if let Some(current) = &existing {
            if current.installed_version == version && !force {
                info!("{} {} is already installed", name, version);
                return Ok(InstallOutcome::AlreadyInstalled(current.clone()));
            }
        }

        let url = resolved
            .entry
            .url_for(&self.edition)
            .ok_or_else(|| Error::VersionNotFound {
                name: name.clone(),
                version: version.to_string(),
                detail: Some(format!("no '{}' package is published", self.edition)),
            })?;

        let module_name = resolved.descriptor.module_name.clone();
        let install_path = self.plugins_dir.join(&module_name);
        self.check_ownership(&name, &install_path, existing.as_ref())
            .map_err(fail)?;

        info!("Installing {} {} from {}", name, version, url);
        let archive = self.downloader.fetch(url).await?;

        if let Some(expected) = resolved.entry.sha256_for(&self.edition) {
            if !archive.matches_sha256(expected) {
                return Err(fail(format!(
                    "checksum mismatch: expected {}, got {}",
                    expected,
                    archive.sha256()
                )));
            }
            debug!("Archive checksum verified for {} {}", name, version);
        }

        let staging = StagingArea::create(&self.plugins_dir, &module_name)?;
        let archive_path = archive.path().to_path_buf();
        let package_dir = staging.package_dir();
        let entry_module = self.entry_module.clone();

        let root = tokio::task::spawn_blocking(move || {
            archive::extract(&archive_path, &package_dir)?;
            archive::locate_package_root(&package_dir, &entry_module)
        })
        .await
        .map_err(|e| fail(format!("extraction task failed: {}", e)))?
        .map_err(|e| fail(e.to_string()))?;

        let record = InstalledPlugin {
            name: name.clone(),
            caption: resolved.descriptor.caption.clone(),
            module_name,
            installed_version: version.clone(),
            source_repository_url: resolved.repository.url.clone(),
            install_path: install_path.clone(),
            edition: self.edition.clone(),
            archive_sha256: archive.sha256().to_string(),
            installed_at: Utc::now(),
        };

        self.activate(&root, &install_path, record.clone(), &staging)
            .map_err(fail)?;

        if let Some(previous) = &existing {
            if previous.install_path != install_path && previous.install_path.exists() {
                if let Err(e) = fs::remove_dir_all(&previous.install_path) {
                    warn!(
                        "Failed to remove previous directory {}: {}",
                        previous.install_path.display(),
                        e
                    );
                }
            }
        }

        let outcome = match existing {
            None => InstallOutcome::Installed(record),
            Some(previous) if previous.installed_version == version => {
                InstallOutcome::Reinstalled(record)
            }
            Some(previous) => InstallOutcome::Changed {
                from: previous.installed_version,
                to: version.clone(),
                plugin: record,
            },
        };
        info!("Installed {} {} at {}", name, version, install_path.display());
        Ok(outcome)
    }

    /// Remove an installed plugin's directory and index entry
    pub async fn uninstall(&mut self, name: &str) -> Result<InstalledPlugin> {
        let _lock = self.lock()?;
        self.index.reload()?;

        let record = self
            .index
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_installed(name))?;

        let path = record.install_path.clone();
        if path.exists() {
            let target = path.clone();
            let removal = tokio::task::spawn_blocking(move || fs::remove_dir_all(&target))
                .await
                .map_err(|e| e.to_string())
                .and_then(|result| result.map_err(|e| e.to_string()));

            if let Err(message) = removal {
                return Err(Error::UninstallIncomplete {
                    name: name.to_string(),
                    path,
                    message,
                });
            }
        } else {
            warn!(
                "Directory {} of plugin '{}' was already gone",
                path.display(),
                name
            );
        }

        self.index.remove(name)?;
        info!("Uninstalled {} {}", name, record.installed_version);
        Ok(record)
    }

    fn check_ownership(
        &self,
        name: &str,
        install_path: &Path,
        existing: Option<&InstalledPlugin>,
    ) -> std::result::Result<(), String> {
        if let Some(owner) = self.index.owner_of(install_path) {
            if owner.name != name {
                return Err(format!(
                    "directory {} belongs to plugin '{}'",
                    install_path.display(),
                    owner.name
                ));
            }
        }

        let managed = existing.is_some_and(|e| e.install_path == install_path);
        if install_path.exists() && !managed {
            return Err(format!(
                "{} already exists and is not managed by pluginctl",
                install_path.display()
            ));
        }

        Ok(())
    }

    fn activate(
        &mut self,
        root: &Path,
        install_path: &Path,
        record: InstalledPlugin,
        staging: &StagingArea,
    ) -> std::result::Result<(), String> {
        let backup = if install_path.exists() {
            let backup = staging.backup_dir();
            fs::rename(install_path, &backup)
                .map_err(|e| format!("failed to move the active version aside: {}", e))?;
            Some(backup)
        } else {
            None
        };

        if let Err(e) = fs::rename(root, install_path) {
            restore_backup(backup.as_deref(), install_path);
            return Err(format!("failed to activate the new version: {}", e));
        }

        if let Err(e) = self.index.put(record) {
            if let Err(cleanup) = fs::remove_dir_all(install_path) {
                warn!(
                    "Failed to remove {} during rollback: {}",
                    install_path.display(),
                    cleanup
                );
            }
            restore_backup(backup.as_deref(), install_path);
            return Err(format!("failed to record the installation: {}", e));
        }

        if let Some(backup) = backup {
            if let Err(e) = fs::remove_dir_all(&backup) {
                warn!("Failed to remove backup {}: {}", backup.display(), e);
            }
        }
        Ok(())
    }

    /// Take the exclusive lock on the plugins directory
    fn lock(&self) -> Result<File> {
        fs::create_dir_all(&self.plugins_dir)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.plugins_dir.join(LOCK_FILE))?;
        file.lock_exclusive()?;
        Ok(file)
    }
}

fn restore_backup(backup: Option<&Path>, install_path: &Path) {
    if let Some(backup) = backup {
        match fs::rename(backup, install_path) {
            Ok(()) => warn!("Restored previous version at {}", install_path.display()),
            Err(e) => warn!(
                "Failed to restore {} from {}: {}",
                install_path.display(),
                backup.display(),
                e
            ),
        }
    }
}
