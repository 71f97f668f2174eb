//! lootlog CLI - local, resumable copy of case-opening history
//!
//! Syncs new and older history pages into a local database and summarizes them.

mod cli;
mod commands;
mod error;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::common::resolve_db_path;
use crate::commands::completions::run_completions;
use crate::commands::identities::run_identities;
use crate::commands::list::run_list;
use crate::commands::reset::run_reset;
use crate::commands::stats::run_stats;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lootlog=info".parse().expect("Invalid log directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Sync { identity, url } => {
            run_sync(identity.as_deref(), url, &db_path).await?;
        }
        Commands::Stats { identity, json } => run_stats(&identity, json, &db_path).await?,
        Commands::List {
            identity,
            limit,
            special,
            json,
        } => run_list(&identity, limit, special, json, &db_path).await?,
        Commands::Identities { json } => run_identities(json, &db_path).await?,
        Commands::Reset { identity } => {
            run_reset(&identity, &db_path).await?;
        }
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
