//! Plugin uninstall command

use anyhow::{Context as _, Result};
use pluginctl_manager::UninstallOutcome;

use super::Context;
use crate::cli::UninstallArgs;
use crate::output;

pub async fn run(args: UninstallArgs, ctx: &Context) -> Result<()> {
    let mut manager = ctx.open_manager()?;
    let outcome = manager
        .uninstall(args.plugin.as_deref())
        .await
        .context("Failed to uninstall plugin")?;

    match outcome {
        UninstallOutcome::Uninstalled(plugin) => output::success(&format!(
            "Uninstalled {} {}",
            plugin.name, plugin.installed_version
        )),
        UninstallOutcome::Cancelled => output::info("Cancelled"),
    }
    Ok(())
}
