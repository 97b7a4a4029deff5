//! CLI command implementations

pub mod about;
pub mod details;
pub mod info;
pub mod install;
pub mod list;
pub mod repositories;
pub mod uninstall;
pub mod update;

use anyhow::{Context as _, Result};
use pluginctl_core::{ConfigLoader, HomeLayout};
use pluginctl_manager::{AssumeYes, ConfirmationGateway, PluginManager, ScriptedGateway};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::prompt::TerminalGateway;

/// Global options shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    pub home: Option<PathBuf>,
    pub edition: Option<String>,
    pub yes: bool,
    pub answers: Vec<String>,
    pub quiet: bool,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            home: cli.home.clone(),
            edition: cli.edition.clone(),
            yes: cli.yes,
            answers: cli.answers.clone(),
            quiet: cli.quiet,
        }
    }

    pub fn layout(&self) -> Result<HomeLayout> {
        HomeLayout::resolve(self.home.clone()).context("Failed to resolve the user config home")
    }

    /// Load configuration and open the manager with the matching prompt mode
    pub fn open_manager(&self) -> Result<PluginManager> {
        let layout = self.layout()?;
        let config = ConfigLoader::new(layout.clone())
            .with_edition(self.edition.clone())
            .load()
            .context("Failed to load configuration")?;

        let manager = PluginManager::open(layout, config, self.gateway())
            .context("Failed to open the plugin manager")?;
        Ok(manager.with_progress(!self.quiet))
    }

    fn gateway(&self) -> Box<dyn ConfirmationGateway> {
        if self.yes {
            Box::new(AssumeYes)
        } else if !self.answers.is_empty() || !std::io::stdin().is_terminal() {
            Box::new(ScriptedGateway::new(self.answers.iter().cloned()))
        } else {
            Box::new(TerminalGateway)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn context(home: &TempDir, edition: &str) -> Context {
        Context {
            home: Some(home.path().to_path_buf()),
            edition: Some(edition.to_string()),
            yes: true,
            answers: Vec::new(),
            quiet: true,
        }
    }

    #[test]
    fn test_edition_flag_is_applied() {
        let home = TempDir::new().unwrap();
        let manager = context(&home, "commercial").open_manager().unwrap();
        assert_eq!(manager.config().edition, "commercial");
    }

    #[test]
    fn test_blank_edition_flag_is_rejected() {
        let home = TempDir::new().unwrap();
        assert!(context(&home, "").open_manager().is_err());
    }
}
