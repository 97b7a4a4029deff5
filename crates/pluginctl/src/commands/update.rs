//! Plugin update command

use anyhow::{Context as _, Result};
use pluginctl_manager::UpdateOutcome;

use super::Context;
use crate::cli::UpdateArgs;
use crate::output;

pub async fn run(args: UpdateArgs, ctx: &Context) -> Result<()> {
    let mut manager = ctx.open_manager()?;
    let outcome = manager
        .update(args.plugin.as_deref())
        .await
        .context("Failed to update plugin")?;

    match outcome {
        UpdateOutcome::Upgraded(outcome) => super::install::report(&outcome),
        UpdateOutcome::AlreadyUpToDate(plugin) => output::info(&format!(
            "{} {} is the latest version",
            plugin.name, plugin.installed_version
        )),
        UpdateOutcome::Cancelled => output::info("Cancelled"),
    }
    Ok(())
}
