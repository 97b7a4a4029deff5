//! Manager construction over a temporary config home

use pluginctl_core::{HomeLayout, PluginsConfig};
use pluginctl_manager::{PluginManager, RepositoryChange, ScriptedGateway};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Configuration with short timeouts for tests
pub fn test_config() -> PluginsConfig {
    let mut config = PluginsConfig::default();
    config.network.http_timeout_secs = 5;
    config.network.download_timeout_secs = 5;
    config
}

/// Open a manager over `home` answering prompts from `answers`
pub fn open_manager(home: &Path, answers: &[&str]) -> PluginManager {
    PluginManager::open(
        HomeLayout::new(home),
        test_config(),
        Box::new(ScriptedGateway::new(answers.iter().copied())),
    )
    .unwrap()
}

/// Register a repository, confirming the prompt
pub async fn register(home: &Path, url: &str) {
    let mut manager = open_manager(home, &["yes"]);
    let change = manager.add_repository(url).await.unwrap();
    assert!(matches!(change, RepositoryChange::Added(_)));
}

pub fn temp_home() -> TempDir {
    TempDir::new().unwrap()
}

/// Content of an installed plugin's entry module
pub fn installed_code(manager: &PluginManager, name: &str) -> String {
    fs::read_to_string(manager.entry_point(name).unwrap()).unwrap()
}

pub fn plugins_dir(home: &Path) -> PathBuf {
    HomeLayout::new(home).plugins_dir()
}

/// Whether any staging directory was left behind
pub fn staging_is_empty(home: &Path) -> bool {
    let staging = plugins_dir(home).join(".staging");
    !staging.exists() || fs::read_dir(staging).unwrap().next().is_none()
}
