//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// pluginctl - install and update plugins from remote plugin repositories
#[derive(Parser, Debug)]
#[command(name = "pluginctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// User config home (defaults to $PLUGINCTL_USER_CONFIG_HOME or ~/.pluginctl)
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Edition whose packages are installed
    #[arg(long, global = true)]
    pub edition: Option<String>,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Pre-recorded prompt answer, consumed in order (repeatable)
    #[arg(long = "answer", value_name = "TEXT", global = true, conflicts_with = "yes")]
    pub answers: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plugin repository management
    #[command(subcommand, visible_alias = "repos")]
    Repositories(RepositoriesCommands),

    /// List plugins offered by the registered repositories
    List(ListArgs),

    /// Show where pluginctl keeps its state
    Info(InfoArgs),

    /// Describe what pluginctl does
    About,

    /// Show the details of a plugin
    Details(DetailsArgs),

    /// Install a plugin
    Install(InstallArgs),

    /// Update an installed plugin to the newest version
    #[command(visible_alias = "upgrade")]
    Update(UpdateArgs),

    /// Uninstall a plugin
    Uninstall(UninstallArgs),
}

#[derive(Subcommand, Debug)]
pub enum RepositoriesCommands {
    /// Register a plugin repository by its manifest URL
    Add(RepositoryAddArgs),

    /// Unregister a plugin repository
    Remove(RepositoryRemoveArgs),

    /// List registered repositories
    List(RepositoryListArgs),
}

#[derive(Args, Debug)]
pub struct RepositoryAddArgs {
    /// Manifest URL
    pub url: String,
}

#[derive(Args, Debug)]
pub struct RepositoryRemoveArgs {
    /// Repository URL or name; prompts when omitted
    pub key: Option<String>,
}

#[derive(Args, Debug)]
pub struct RepositoryListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show installed plugins
    #[arg(long)]
    pub installed: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DetailsArgs {
    /// Plugin name or listing index; prompts when omitted
    pub plugin: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Plugin name or listing index
    pub plugin: String,

    /// Install this version instead of the latest
    #[arg(long)]
    pub version: Option<String>,

    /// Reinstall even if the version is already installed
    #[arg(short, long)]
    pub force: bool,

    /// Repository to install from: position among the plugin's sources or manifest URL
    #[arg(long, value_name = "INDEX|URL")]
    pub source: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Installed plugin name; prompts when omitted
    pub plugin: Option<String>,
}

#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Installed plugin name; prompts when omitted
    pub plugin: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_install_arguments() {
        let cli = Cli::try_parse_from([
            "pluginctl",
            "install",
            "repo",
            "--version",
            "0.0.1",
            "--force",
            "--source",
            "2",
        ])
        .unwrap();

        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.plugin, "repo");
                assert_eq!(args.version.as_deref(), Some("0.0.1"));
                assert!(args.force);
                assert_eq!(args.source.as_deref(), Some("2"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pluginctl",
            "uninstall",
            "--answer",
            "repo",
            "--answer",
            "yes",
            "--home",
            "/tmp/plugins-home",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.answers, vec!["repo", "yes"]);
        assert_eq!(cli.home, Some(PathBuf::from("/tmp/plugins-home")));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Uninstall(UninstallArgs { plugin: None })
        ));
    }

    #[test]
    fn test_upgrade_alias_and_repos_alias() {
        let cli = Cli::try_parse_from(["pluginctl", "upgrade", "repo"]).unwrap();
        assert!(matches!(cli.command, Commands::Update(_)));

        let cli = Cli::try_parse_from(["pluginctl", "repos", "remove"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Repositories(RepositoriesCommands::Remove(RepositoryRemoveArgs {
                key: None
            }))
        ));
    }

    #[test]
    fn test_yes_conflicts_with_answers() {
        let result = Cli::try_parse_from(["pluginctl", "-y", "--answer", "no", "uninstall"]);
        assert!(result.is_err());
    }
}
