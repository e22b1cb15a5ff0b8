//! Database maintenance command handlers for the CLI.

use chrono::{Duration, Utc};
use clap::Subcommand;
use trendlens_core::AppConfig;

/// Sub-commands available under `db`.
#[derive(Debug, Subcommand)]
pub enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Delete cached analyses that expired long ago
    Prune {
        /// Keep entries that expired within this many days; they still serve
        /// as stale fallbacks
        #[arg(long, default_value = "7")]
        older_than_days: u32,
    },
}

/// Dispatch a `db` sub-command against the configured database.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is unset, the pool cannot connect, or
/// the operation itself fails.
pub(crate) async fn run_db(config: &AppConfig, command: DbCommands) -> anyhow::Result<()> {
    let pool = trendlens_db::connect_pool_from_config(config).await?;

    match command {
        DbCommands::Ping => {
            trendlens_db::health_check(&pool).await?;
            println!("database reachable");
        }
        DbCommands::Migrate => {
            let applied = trendlens_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        DbCommands::Prune { older_than_days } => {
            let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
            let removed = trendlens_db::delete_expired_trend_cache(&pool, cutoff).await?;
            tracing::info!(removed, %cutoff, "pruned expired trend cache rows");
            println!("removed {removed} cache entries that expired before {cutoff}");
        }
    }

    Ok(())
}
