//! Plugin list command

use anyhow::{Context as _, Result};
use pluginctl_manager::ListingRow;
use serde_json::json;
use tabled::{settings::Style, Table, Tabled};

use super::Context;
use crate::cli::ListArgs;
use crate::output;

#[derive(Tabled)]
struct PluginRow {
    #[tabled(rename = "#")]
    index: String,
    name: String,
    caption: String,
    latest: String,
    installed: String,
    repository: String,
}

impl From<&ListingRow> for PluginRow {
    fn from(row: &ListingRow) -> Self {
        let installed = match (&row.installed, row.update_available) {
            (Some(version), true) => format!("{} (update available)", version),
            (Some(version), false) => version.clone(),
            (None, _) => "-".to_string(),
        };

        Self {
            index: row.index.map(|i| i.to_string()).unwrap_or_else(|| "-".to_string()),
            name: row.name.clone(),
            caption: row.caption.clone(),
            latest: output::or_dash(row.latest.as_deref()),
            installed,
            repository: output::or_dash(row.repository.as_deref()),
        }
    }
}

pub async fn run(args: ListArgs, ctx: &Context) -> Result<()> {
    let manager = ctx.open_manager()?;
    if manager.repositories().is_empty() && manager.installed().is_empty() {
        output::info("No repositories registered. Add one with 'pluginctl repositories add <URL>'");
        return Ok(());
    }

    let spinner = output::spinner("Fetching plugin repositories...", ctx.quiet || args.json);
    let listing = manager.list(args.installed).await;
    spinner.finish_and_clear();
    let listing = listing.context("Failed to list plugins")?;

    if args.json {
        let failures: Vec<_> = listing
            .failures
            .iter()
            .map(|f| {
                json!({
                    "repository": f.repository,
                    "error": f.error.to_string(),
                })
            })
            .collect();
        let document = json!({ "plugins": listing.rows, "failures": failures });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    for failure in &listing.failures {
        output::warning(&format!(
            "Repository '{}' is unavailable: {}",
            failure.repository.name, failure.error
        ));
    }

    if listing.rows.is_empty() {
        if args.installed {
            output::info("No plugins installed");
        } else {
            output::info("No plugins available");
        }
        return Ok(());
    }

    let rows: Vec<PluginRow> = listing.rows.iter().map(PluginRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);

    if !args.installed {
        println!(
            "\nInstall with 'pluginctl install <NAME|#>', details with 'pluginctl details <NAME|#>'"
        );
    }
    Ok(())
}
