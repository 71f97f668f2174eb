use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "lootlog")]
#[command(about = "Keep a local, resumable copy of your case-opening history")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch new and older history pages and merge them into the local copy
    Sync {
        /// Identity to sync (derived from the history URL when omitted)
        #[arg(long, value_name = "ID")]
        identity: Option<String>,
        /// Inventory history URL (overrides LOOTLOG_HISTORY_URL)
        #[arg(long, value_name = "URL")]
        url: Option<String>,
    },
    /// Show aggregate statistics for stored history
    Stats {
        /// Identity to summarize
        #[arg(long, value_name = "ID")]
        identity: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the most recent stored unlocks
    List {
        /// Identity to list
        #[arg(long, value_name = "ID")]
        identity: String,
        /// Number of events to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Only show special (★) outcomes
        #[arg(long)]
        special: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List identities with stored history
    Identities {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete stored history for an identity
    Reset {
        /// Identity to reset
        #[arg(long, value_name = "ID")]
        identity: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
