//! Plugin install command

use anyhow::{Context as _, Result};
use pluginctl_manager::InstallOutcome;

use super::Context;
use crate::cli::InstallArgs;
use crate::output;

pub async fn run(args: InstallArgs, ctx: &Context) -> Result<()> {
    let mut manager = ctx.open_manager()?;
    let outcome = manager
        .install(
            &args.plugin,
            args.version.as_deref(),
            args.force,
            args.source.as_deref(),
        )
        .await
        .with_context(|| format!("Failed to install '{}'", args.plugin.trim()))?;

    report(&outcome);
    Ok(())
}

/// Print the result of an install or upgrade
pub fn report(outcome: &InstallOutcome) {
    let plugin = outcome.plugin();
    match outcome {
        InstallOutcome::Installed(_) => output::success(&format!(
            "Installed {} {}",
            plugin.name, plugin.installed_version
        )),
        InstallOutcome::Reinstalled(_) => output::success(&format!(
            "Reinstalled {} {}",
            plugin.name, plugin.installed_version
        )),
        InstallOutcome::Changed { from, to, .. } => {
            let verb = if to > from { "Upgraded" } else { "Downgraded" };
            output::success(&format!("{} {} from {} to {}", verb, plugin.name, from, to));
        }
        InstallOutcome::AlreadyInstalled(_) => {
            output::info(&format!(
                "{} {} is already installed, use --force to reinstall",
                plugin.name, plugin.installed_version
            ));
            return;
        }
    }
    output::kv("Location", &plugin.install_path.display().to_string());
}
