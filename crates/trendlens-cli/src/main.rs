mod analyze;
mod db;
mod sources;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::db::DbCommands;

#[derive(Debug, Parser)]
#[command(name = "trendlens-cli")]
#[command(about = "Short-form video trend analytics")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze hashtag and engagement trends for one or more keywords
    Analyze {
        /// Keyword to analyze; repeat the flag for several keywords
        #[arg(short, long = "keyword", required = true)]
        keywords: Vec<String>,
        /// Videos to fetch per keyword (defaults to `TRENDLENS_DEFAULT_VIDEO_LIMIT`)
        #[arg(long)]
        limit: Option<usize>,
        /// Ignore fresh cache entries and fetch again
        #[arg(long)]
        force_refresh: bool,
        /// Read videos from `<DIR>/<keyword>.json` instead of the video service
        #[arg(long, value_name = "DIR")]
        fixtures: Option<PathBuf>,
    },
    /// Show recent daily snapshots for a keyword, newest first
    History {
        #[arg(short, long)]
        keyword: String,
        /// Maximum number of snapshots to show
        #[arg(long, default_value = "30")]
        limit: usize,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = trendlens_core::load_app_config()?;
    init_tracing(&config.log_level);

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Analyze {
            keywords,
            limit,
            force_refresh,
            fixtures,
        }) => {
            let request = analyze::AnalyzeArgs {
                keywords,
                limit,
                force_refresh,
                fixtures,
            };
            analyze::run_analyze(&config, request).await
        }
        Some(Commands::History { keyword, limit }) => {
            analyze::run_history(&config, &keyword, limit).await
        }
        Some(Commands::Db { command }) => db::run_db(&config, command).await,
        None => {
            println!("trendlens-cli: no command given; run with --help for usage");
            Ok(())
        }
    }
}

/// Logs go to stderr; stdout carries the JSON output.
/// `RUST_LOG` overrides the configured level when set.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
