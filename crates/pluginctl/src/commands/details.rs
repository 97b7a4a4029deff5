//! Plugin details command

use anyhow::{Context as _, Result};
use tabled::{settings::Style, Table, Tabled};

use super::Context;
use crate::cli::DetailsArgs;
use crate::output;

#[derive(Tabled)]
struct VersionRow {
    version: String,
    stage: String,
    changes: String,
}

pub async fn run(args: DetailsArgs, ctx: &Context) -> Result<()> {
    let mut manager = ctx.open_manager()?;
    let details = manager
        .details(args.plugin.as_deref())
        .await
        .context("Failed to show plugin details")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&details)?);
        return Ok(());
    }

    output::header(&details.caption);
    output::kv("Name", &details.name);
    output::kv("Module", &details.module_name);
    output::kv(
        "Repository",
        &format!("{} ({})", details.repository.name, details.repository.url),
    );
    output::kv("Editions", &details.editions.join(", "));
    output::kv("Latest", &output::or_dash(details.latest.as_deref()));
    match &details.installed {
        Some(installed) => output::kv(
            "Installed",
            &format!(
                "{} ({} edition, {})",
                installed.installed_version,
                installed.edition,
                installed.installed_at.format("%Y-%m-%d %H:%M UTC")
            ),
        ),
        None => output::kv("Installed", "-"),
    }

    if !details.description.is_empty() {
        println!("\n{}", details.description);
    }

    let rows: Vec<VersionRow> = details
        .versions
        .iter()
        .map(|v| VersionRow {
            version: if v.available {
                v.version.clone()
            } else {
                format!("{} (no {} package)", v.version, manager.config().edition)
            },
            stage: v.development_stage.clone(),
            changes: v.changes.join("\n"),
        })
        .collect();

    if !rows.is_empty() {
        output::header("Versions");
        let mut table = Table::new(rows);
        table.with(Style::sharp());
        println!("{}", table);
    }
    Ok(())
}
