//! Layered configuration loader
//!
//! Precedence (low to high):
//! 1. Built-in defaults
//! 2. `<home>/pluginctl.yaml`
//! 3. Environment variables (`PLUGINCTL_*`)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::PluginsConfig;
use crate::utils::user_config_home;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the optional config file inside the user config home
pub const CONFIG_FILE_NAME: &str = "pluginctl.yaml";

/// Files and directories owned by pluginctl inside the user config home
#[derive(Debug, Clone)]
pub struct HomeLayout {
    root: PathBuf,
}

impl HomeLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the home from an explicit override, the environment, or `$HOME`
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        Ok(Self::new(user_config_home(explicit)?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persisted repository registry
    pub fn registry_path(&self) -> PathBuf {
        self.root.join("plugin-repositories.json")
    }

    /// Persisted index of installed plugins
    pub fn index_path(&self) -> PathBuf {
        self.root.join("plugin-index.json")
    }

    /// Directory holding one subdirectory per installed plugin
    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join("plugins")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }
}

/// Loads [`PluginsConfig`] for a user config home
pub struct ConfigLoader {
    layout: HomeLayout,
    edition: Option<String>,
}

impl ConfigLoader {
    pub fn new(layout: HomeLayout) -> Self {
        Self {
            layout,
            edition: None,
        }
    }

    /// Edition given on the command line; wins over file and environment
    pub fn with_edition(mut self, edition: Option<String>) -> Self {
        self.edition = edition;
        self
    }

    /// Load configuration with layered precedence
    pub fn load(&self) -> Result<PluginsConfig> {
        let path = self.layout.config_path();
        let config = if path.exists() {
            debug!("Loading configuration from {}", path.display());
            let content = fs::read_to_string(&path)?;
            serde_yaml_ng::from_str(&content).map_err(|e| {
                Error::config(format!("Failed to parse {}: {}", path.display(), e))
            })?
        } else {
            PluginsConfig::default()
        };

        let mut config = Self::apply_env_overrides(config)?;
        if let Some(edition) = &self.edition {
            config.edition = edition.clone();
        }
        Self::validate(&config)?;
        Ok(config)
    }

    fn apply_env_overrides(mut config: PluginsConfig) -> Result<PluginsConfig> {
        if let Ok(val) = env::var("PLUGINCTL_EDITION") {
            config.edition = val;
        }

        if let Ok(val) = env::var("PLUGINCTL_ENTRY_MODULE") {
            config.entry_module = val;
        }

        if let Ok(val) = env::var("PLUGINCTL_HTTP_TIMEOUT") {
            config.network.http_timeout_secs = val
                .parse()
                .map_err(|_| Error::config("PLUGINCTL_HTTP_TIMEOUT must be a valid number"))?;
        }

        if let Ok(val) = env::var("PLUGINCTL_DOWNLOAD_TIMEOUT") {
            config.network.download_timeout_secs = val.parse().map_err(|_| {
                Error::config("PLUGINCTL_DOWNLOAD_TIMEOUT must be a valid number")
            })?;
        }

        Ok(config)
    }

    fn validate(config: &PluginsConfig) -> Result<()> {
        if config.edition.trim().is_empty() {
            return Err(Error::config("edition must not be empty"));
        }
        let entry = Path::new(&config.entry_module);
        if config.entry_module.is_empty()
            || entry.is_absolute()
            || entry.components().count() != 1
        {
            return Err(Error::config(format!(
                "entry-module '{}' must be a plain file name",
                config.entry_module
            )));
        }
        if config.network.http_timeout_secs == 0 || config.network.download_timeout_secs == 0 {
            return Err(Error::config("network timeouts must be greater than zero"));
        }
        Ok(())
    }

    pub fn layout(&self) -> &HomeLayout {
        &self.layout
    }
}
