//! Collaborator selection for the CLI.
//!
//! The engine is generic over its collaborators; these enums let `main`
//! pick an implementation at runtime from config and flags.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use trendlens_clients::{ClientError, HttpNarrativeClient, HttpSettings, HttpVideoSource};
use trendlens_core::{
    AnalysisStore, AppConfig, CacheKey, DailySnapshot, FetchOutcome, NarrativeInsight,
    NarrativeInsights, RawVideo, StoreError, StoredAnalysis, TrendSummary, VideoSource,
};
use trendlens_db::PgAnalysisStore;
use trendlens_engine::{InMemoryStore, RetryPolicy, RetryingStore};

// ---------------------------------------------------------------------------
// Fixture video source
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse fixture {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("keyword {0:?} cannot name a fixture file")]
    InvalidKeyword(String),
}

/// A fixture file holds either a bare array of videos or the full envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FixtureFile {
    Videos(Vec<RawVideo>),
    Envelope(FetchOutcome),
}

/// Reads `<dir>/<keyword>.json`, keyed by the lowercased keyword.
#[derive(Debug, Clone)]
pub struct FixtureVideoSource {
    dir: PathBuf,
}

impl FixtureVideoSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Keywords with path separators or `..` are rejected so a lookup never
    /// leaves the fixture directory.
    fn fixture_path(&self, keyword: &str) -> Result<PathBuf, FixtureError> {
        let name = keyword.trim().to_lowercase();
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(FixtureError::InvalidKeyword(keyword.to_string()));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

/// Decode fixture JSON and cap it at `limit` videos.
fn parse_fixture(path: &Path, content: &str, limit: usize) -> Result<FetchOutcome, FixtureError> {
    let file: FixtureFile =
        serde_json::from_str(content).map_err(|source| FixtureError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    let mut outcome = match file {
        FixtureFile::Videos(videos) => FetchOutcome::ok(videos),
        FixtureFile::Envelope(envelope) => envelope,
    };
    outcome.videos.truncate(limit);
    Ok(outcome)
}

impl VideoSource for FixtureVideoSource {
    type Error = FixtureError;

    async fn fetch(&self, keyword: &str, limit: usize) -> Result<FetchOutcome, FixtureError> {
        let path = self.fixture_path(keyword)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "no fixture file for keyword");
                return Ok(FetchOutcome::failed(format!(
                    "no fixture file at {}",
                    path.display()
                )));
            }
            Err(source) => {
                return Err(FixtureError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        parse_fixture(&path, &content, limit)
    }
}

// ---------------------------------------------------------------------------
// Runtime dispatch
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    #[error(transparent)]
    Http(#[from] ClientError),
}

#[derive(Debug)]
pub enum CliSource {
    Fixtures(FixtureVideoSource),
    Http(HttpVideoSource),
}

impl VideoSource for CliSource {
    type Error = SourceError;

    async fn fetch(&self, keyword: &str, limit: usize) -> Result<FetchOutcome, SourceError> {
        match self {
            Self::Fixtures(source) => Ok(source.fetch(keyword, limit).await?),
            Self::Http(source) => Ok(source.fetch(keyword, limit).await?),
        }
    }
}

/// Fixture directory when given, otherwise the configured HTTP service.
///
/// # Errors
///
/// Returns an error if neither is available or the HTTP client cannot be built.
pub(crate) fn select_source(
    config: &AppConfig,
    fixtures: Option<&Path>,
) -> anyhow::Result<CliSource> {
    if let Some(dir) = fixtures {
        tracing::info!(dir = %dir.display(), "reading videos from fixtures");
        return Ok(CliSource::Fixtures(FixtureVideoSource::new(dir)));
    }
    let base_url = config.video_source_url.as_deref().ok_or_else(|| {
        anyhow::anyhow!(
            "TRENDLENS_VIDEO_SOURCE_URL is not set; pass --fixtures DIR or set a video source"
        )
    })?;
    let source = HttpVideoSource::new(base_url, HttpSettings::from_app_config(config))
        .map_err(|e| anyhow::anyhow!("failed to build video source client: {e}"))?;
    Ok(CliSource::Http(source))
}

#[derive(Debug)]
pub enum CliNarrative {
    Disabled,
    Http(HttpNarrativeClient),
}

impl NarrativeInsight for CliNarrative {
    type Error = ClientError;

    async fn summarize(
        &self,
        keyword: &str,
        summary: &TrendSummary,
    ) -> Result<Option<NarrativeInsights>, ClientError> {
        match self {
            Self::Disabled => Ok(None),
            Self::Http(client) => client.summarize(keyword, summary).await,
        }
    }
}

/// # Errors
///
/// Returns an error if a narrative URL is configured but the client cannot
/// be built.
pub(crate) fn select_narrative(config: &AppConfig) -> anyhow::Result<CliNarrative> {
    let Some(base_url) = config.narrative_url.as_deref() else {
        return Ok(CliNarrative::Disabled);
    };
    let client = HttpNarrativeClient::new(base_url, HttpSettings::from_app_config(config))
        .map_err(|e| anyhow::anyhow!("failed to build narrative client: {e}"))?;
    Ok(CliNarrative::Http(client))
}

pub enum CliStore {
    Postgres(RetryingStore<PgAnalysisStore>),
    Memory(InMemoryStore),
}

impl AnalysisStore for CliStore {
    async fn load(&self, key: &CacheKey) -> Result<Option<StoredAnalysis>, StoreError> {
        match self {
            Self::Postgres(store) => store.load(key).await,
            Self::Memory(store) => store.load(key).await,
        }
    }

    async fn save(&self, record: &StoredAnalysis) -> Result<(), StoreError> {
        match self {
            Self::Postgres(store) => store.save(record).await,
            Self::Memory(store) => store.save(record).await,
        }
    }

    async fn upsert_snapshot(&self, snapshot: &DailySnapshot) -> Result<(), StoreError> {
        match self {
            Self::Postgres(store) => store.upsert_snapshot(snapshot).await,
            Self::Memory(store) => store.upsert_snapshot(snapshot).await,
        }
    }

    async fn list_snapshots(
        &self,
        key: &CacheKey,
        limit: usize,
    ) -> Result<Vec<DailySnapshot>, StoreError> {
        match self {
            Self::Postgres(store) => store.list_snapshots(key, limit).await,
            Self::Memory(store) => store.list_snapshots(key, limit).await,
        }
    }
}

/// Postgres behind a retrying decorator when `DATABASE_URL` is set,
/// otherwise a process-local store that forgets everything on exit.
///
/// # Errors
///
/// Returns an error if the database is configured but unreachable.
pub(crate) async fn select_store(config: &AppConfig) -> anyhow::Result<CliStore> {
    if config.database_url.is_none() {
        tracing::info!("DATABASE_URL is not set; using in-memory store");
        return Ok(CliStore::Memory(InMemoryStore::new()));
    }
    let pool = trendlens_db::connect_pool_from_config(config).await?;
    let policy = RetryPolicy {
        max_retries: config.store_max_retries,
        backoff_base_ms: config.store_retry_backoff_base_ms,
    };
    Ok(CliStore::Postgres(RetryingStore::new(
        PgAnalysisStore::new(pool),
        policy,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> PathBuf {
        PathBuf::from("fixtures/fitness.json")
    }

    #[test]
    fn bare_array_fixture_is_a_successful_fetch() {
        let content = r#"[
            {"id": "v1", "description": "a", "stats": {"playCount": 10}},
            {"id": "v2", "description": "b", "stats": {"playCount": 20}}
        ]"#;
        let outcome = parse_fixture(&path(), content, 10).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.videos.len(), 2);
    }

    #[test]
    fn empty_array_fixture_is_successful_and_empty() {
        let outcome = parse_fixture(&path(), "[]", 10).unwrap();
        assert!(outcome.success);
        assert!(outcome.videos.is_empty());
    }

    #[test]
    fn envelope_fixture_is_passed_through() {
        let content = r#"{"success": false, "error": "upstream down"}"#;
        let outcome = parse_fixture(&path(), content, 10).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("upstream down"));
    }

    #[test]
    fn fixture_is_capped_at_limit() {
        let content = r#"[{"id": "v1"}, {"id": "v2"}, {"id": "v3"}]"#;
        let outcome = parse_fixture(&path(), content, 2).unwrap();
        assert_eq!(outcome.videos.len(), 2);
        assert_eq!(outcome.videos[1].id, "v2");
    }

    #[test]
    fn malformed_fixture_reports_path() {
        let err = parse_fixture(&path(), "{oops", 10).unwrap_err();
        assert!(err.to_string().contains("fixtures/fitness.json"));
    }

    #[test]
    fn fixture_path_uses_lowercased_keyword() {
        let source = FixtureVideoSource::new("fixtures");
        assert_eq!(
            source.fixture_path("  Home Workout ").unwrap(),
            PathBuf::from("fixtures/home workout.json")
        );
    }

    #[test]
    fn fixture_path_rejects_traversal() {
        let source = FixtureVideoSource::new("fixtures");
        for keyword in ["../../etc/x", "a/b", "a\\b", "..", "   "] {
            assert!(
                matches!(
                    source.fixture_path(keyword),
                    Err(FixtureError::InvalidKeyword(_))
                ),
                "{keyword:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn traversal_keyword_fails_the_fetch() {
        let source = FixtureVideoSource::new("fixtures");
        let err = source.fetch("../secrets", 10).await.unwrap_err();
        assert!(matches!(err, FixtureError::InvalidKeyword(_)));
    }

    #[tokio::test]
    async fn missing_fixture_is_an_unsuccessful_fetch() {
        let source = FixtureVideoSource::new("/nonexistent/trendlens-fixtures");
        let outcome = source.fetch("fitness", 10).await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("fitness.json"));
    }

    #[tokio::test]
    async fn disabled_narrative_adds_nothing() {
        let summary = TrendSummary {
            keyword: "fitness".to_owned(),
            total_videos: 0,
            total_views: 0,
            avg_engagement_rate: 0.0,
            median_engagement_rate: 0.0,
            avg_description_length: 0,
            optimal_hashtag_count: 0,
            top_hashtags: Vec::new(),
            top_combos: Vec::new(),
            top_phrases: Vec::new(),
            top_creators: Vec::new(),
            top_video_descriptions: Vec::new(),
        };
        let insights = CliNarrative::Disabled
            .summarize("fitness", &summary)
            .await
            .unwrap();
        assert!(insights.is_none());
    }
}
