//! Local plugin index
//!
//! The authoritative record of which plugins are on disk, at which version
//! and from which repository. Only [`crate::engine::InstallEngine`] mutates
//! it, as the last step of a successful operation.

use crate::persist::{read_json_or_default, write_json_atomic};
use pluginctl_core::types::{InstalledIndex, InstalledPlugin};
use pluginctl_core::Result;
use std::path::{Path, PathBuf};

/// Installed plugins keyed by name, persisted as JSON
#[derive(Debug)]
pub struct LocalPluginIndex {
    path: PathBuf,
    index: InstalledIndex,
}

impl LocalPluginIndex {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let index = read_json_or_default(&path)?;
        Ok(Self { path, index })
    }

    /// Re-read the file, picking up changes made by other processes
    pub fn reload(&mut self) -> Result<()> {
        self.index = read_json_or_default(&self.path)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&InstalledPlugin> {
        self.index.plugins.get(name)
    }

    /// Installed plugins in name order
    pub fn list(&self) -> Vec<&InstalledPlugin> {
        self.index.plugins.values().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.index.plugins.is_empty()
    }

    /// The installed plugin whose directory is `install_path`, if any
    pub fn owner_of(&self, install_path: &Path) -> Option<&InstalledPlugin> {
        self.index
            .plugins
            .values()
            .find(|p| p.install_path == install_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace an entry and persist
    pub(crate) fn put(&mut self, entry: InstalledPlugin) -> Result<()> {
        let name = entry.name.clone();
        let previous = self.index.plugins.insert(name.clone(), entry);
        if let Err(e) = write_json_atomic(&self.path, &self.index) {
            match previous {
                Some(previous) => self.index.plugins.insert(name, previous),
                None => self.index.plugins.remove(&name),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Remove an entry and persist
    pub(crate) fn remove(&mut self, name: &str) -> Result<Option<InstalledPlugin>> {
        let Some(removed) = self.index.plugins.remove(name) else {
            return Ok(None);
        };
        if let Err(e) = write_json_atomic(&self.path, &self.index) {
            self.index.plugins.insert(name.to_string(), removed);
            return Err(e);
        }
        Ok(Some(removed))
    }
}
