//! `analyze` and `history` command handlers.

use std::path::PathBuf;

use serde::Serialize;
use trendlens_core::{load_exclusions, AppConfig, ExclusionList};
use trendlens_engine::{EngineConfig, TrendEngine};

use crate::sources::{
    select_narrative, select_source, select_store, CliSource, CliStore, FixtureVideoSource,
};

#[derive(Debug)]
pub(crate) struct AnalyzeArgs {
    pub keywords: Vec<String>,
    pub limit: Option<usize>,
    pub force_refresh: bool,
    pub fixtures: Option<PathBuf>,
}

/// Analyze a keyword batch and print the result map as JSON.
///
/// Per-keyword failures appear inside the map; only request validation and
/// setup problems fail the command.
///
/// # Errors
///
/// Returns an error if a collaborator cannot be configured, the exclusions
/// file is invalid, or the keyword list is rejected.
pub(crate) async fn run_analyze(config: &AppConfig, args: AnalyzeArgs) -> anyhow::Result<()> {
    let source = select_source(config, args.fixtures.as_deref())?;
    let narrative = select_narrative(config)?;
    let exclusions = configured_exclusions(config)?;
    let store = select_store(config).await?;

    let engine = build_engine(config, source, store)
        .with_narrative(narrative)
        .with_exclusions(exclusions);

    let limit = args.limit.unwrap_or(config.default_video_limit);
    let results = engine
        .analyze(&args.keywords, limit, args.force_refresh)
        .await?;

    let failed = results.values().filter(|o| o.error().is_some()).count();
    tracing::info!(keywords = results.len(), failed, "trend analysis complete");

    print_json(&results)
}

/// Print stored daily snapshots for one keyword.
///
/// # Errors
///
/// Returns an error if the keyword is blank or the store cannot be read.
pub(crate) async fn run_history(
    config: &AppConfig,
    keyword: &str,
    limit: usize,
) -> anyhow::Result<()> {
    let store = select_store(config).await?;
    if matches!(store, CliStore::Memory(_)) {
        tracing::warn!(
            "history is empty without DATABASE_URL; snapshots are not kept between runs"
        );
    }

    // History only reads snapshots; the source is never called.
    let source = CliSource::Fixtures(FixtureVideoSource::new("."));
    let engine = build_engine(config, source, store);
    let snapshots = engine.history(keyword, limit).await?;

    print_json(&snapshots)
}

fn build_engine(
    config: &AppConfig,
    source: CliSource,
    store: CliStore,
) -> TrendEngine<CliSource, CliStore> {
    TrendEngine::new(source, store, EngineConfig::from_app_config(config))
}

fn configured_exclusions(config: &AppConfig) -> anyhow::Result<ExclusionList> {
    match config.exclusions_path.as_deref() {
        Some(path) => {
            let list = load_exclusions(path)?;
            tracing::debug!(path = %path.display(), tags = list.len(), "loaded hashtag exclusions");
            Ok(list)
        }
        None => Ok(ExclusionList::default()),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
