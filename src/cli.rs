use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "step-finder")]
#[command(about = "Find products in a STEP catalog XML whose attribute matches a value")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding parsed catalog snapshots
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Directory receiving one JSON file per match
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Ignore an existing snapshot and parse the source again
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    Search {
        field: String,

        value: String,

        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Test every flattened entry instead of top-level products only
        #[arg(long)]
        all_entries: bool,
    },
    Index {
        #[arg(value_name = "SOURCE")]
        source: PathBuf,
    },
    Stats {
        #[arg(value_name = "SOURCE")]
        source: PathBuf,
    },
    Clear {
        #[arg(value_name = "SOURCE")]
        source: PathBuf,
    },
}

pub const SUBCOMMANDS: [&str; 5] = ["search", "index", "stats", "clear", "help"];

/// Options that consume the following argument as their value.
pub const VALUE_OPTIONS: [&str; 2] = ["--cache-dir", "--output-dir"];

/// Insert `search` in front of the first positional argument unless it is
/// already a subcommand, so `step-finder FIELD VALUE SOURCE` keeps working.
pub fn rewrite_args_for_implicit_search(mut args: Vec<String>) -> Vec<String> {
    if args.len() <= 1 {
        return args;
    }

    let mut idx = 1usize;
    while idx < args.len() {
        let a = args[idx].as_str();
        if a == "--" {
            idx += 1;
            break;
        }

        if VALUE_OPTIONS.contains(&a) {
            idx += 2;
            continue;
        }

        if a.starts_with('-') {
            idx += 1;
            continue;
        }

        break;
    }

    if idx < args.len() {
        let token = args[idx].as_str();
        if !SUBCOMMANDS.contains(&token) {
            args.insert(idx, "search".to_string());
        }
    }

    args
}
