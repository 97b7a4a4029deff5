//! Repository commands

use anyhow::{Context as _, Result};
use pluginctl_manager::RepositoryChange;
use tabled::{settings::Style, Table, Tabled};

use super::Context;
use crate::cli::{RepositoriesCommands, RepositoryAddArgs, RepositoryListArgs, RepositoryRemoveArgs};
use crate::output;

pub async fn run(command: RepositoriesCommands, ctx: &Context) -> Result<()> {
    match command {
        RepositoriesCommands::Add(args) => add(args, ctx).await,
        RepositoriesCommands::Remove(args) => remove(args, ctx),
        RepositoriesCommands::List(args) => list(args, ctx),
    }
}

async fn add(args: RepositoryAddArgs, ctx: &Context) -> Result<()> {
    let mut manager = ctx.open_manager()?;

    match manager
        .add_repository(&args.url)
        .await
        .with_context(|| format!("Failed to add repository {}", args.url.trim()))?
    {
        RepositoryChange::Added(repository) => {
            output::success(&format!(
                "Added repository '{}' ({})",
                repository.name, repository.url
            ));
        }
        RepositoryChange::Cancelled => output::info("Cancelled"),
        RepositoryChange::Removed(_) => {}
    }
    Ok(())
}

fn remove(args: RepositoryRemoveArgs, ctx: &Context) -> Result<()> {
    let mut manager = ctx.open_manager()?;

    match manager
        .remove_repository(args.key.as_deref())
        .context("Failed to remove repository")?
    {
        RepositoryChange::Removed(repository) => {
            output::success(&format!("Removed repository '{}'", repository.name));
            if !manager.installed().is_empty() {
                output::info("Installed plugins were left in place");
            }
        }
        RepositoryChange::Cancelled => output::info("Cancelled"),
        RepositoryChange::Added(_) => {}
    }
    Ok(())
}

#[derive(Tabled)]
struct RepositoryRow {
    #[tabled(rename = "#")]
    index: usize,
    name: String,
    url: String,
    description: String,
}

fn list(args: RepositoryListArgs, ctx: &Context) -> Result<()> {
    let manager = ctx.open_manager()?;
    let repositories = manager.repositories();

    if args.json {
        println!("{}", serde_json::to_string_pretty(repositories)?);
        return Ok(());
    }

    if repositories.is_empty() {
        output::info("No repositories registered. Add one with 'pluginctl repositories add <URL>'");
        return Ok(());
    }

    let rows: Vec<RepositoryRow> = repositories
        .iter()
        .enumerate()
        .map(|(i, r)| RepositoryRow {
            index: i + 1,
            name: r.name.clone(),
            url: r.url.clone(),
            description: r.description.clone(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);
    Ok(())
}
