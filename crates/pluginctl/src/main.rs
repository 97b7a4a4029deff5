//! pluginctl - plugin repository and installation manager
//!
//! Entry point for the pluginctl command-line interface.

mod cli;
mod commands;
mod output;
mod prompt;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};
use commands::Context;

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before any TLS operation
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let ctx = Context::from_cli(&cli);
    match cli.command {
        Commands::Repositories(args) => commands::repositories::run(args, &ctx).await,
        Commands::List(args) => commands::list::run(args, &ctx).await,
        Commands::Info(args) => commands::info::run(args, &ctx),
        Commands::About => commands::about::run(),
        Commands::Details(args) => commands::details::run(args, &ctx).await,
        Commands::Install(args) => commands::install::run(args, &ctx).await,
        Commands::Update(args) => commands::update::run(args, &ctx).await,
        Commands::Uninstall(args) => commands::uninstall::run(args, &ctx).await,
    }
}

/// Initialize tracing; the CLI prints its own results, so logs default to warn
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
