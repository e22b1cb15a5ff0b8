//! Collaborator seams the trend engine depends on.
//!
//! Implementations live elsewhere: HTTP adapters in `trendlens-clients`,
//! Postgres persistence in `trendlens-db`, and an in-memory store in
//! `trendlens-engine`.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::{NarrativeInsights, TrendSummary};
use crate::error::StoreError;
use crate::video::RawVideo;

/// Envelope returned by a video source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub videos: Vec<RawVideo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchOutcome {
    #[must_use]
    pub fn ok(videos: Vec<RawVideo>) -> Self {
        Self {
            success: true,
            videos,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            videos: Vec::new(),
            error: Some(message.into()),
        }
    }
}

/// Fetches raw videos for a keyword.
pub trait VideoSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch(
        &self,
        keyword: &str,
        limit: usize,
    ) -> impl Future<Output = Result<FetchOutcome, Self::Error>> + Send;
}

/// Produces free-text insights from a statistical summary.
///
/// `Ok(None)` means "nothing to add" and is not an error.
pub trait NarrativeInsight {
    type Error: std::error::Error + Send + Sync + 'static;

    fn summarize(
        &self,
        keyword: &str,
        summary: &TrendSummary,
    ) -> impl Future<Output = Result<Option<NarrativeInsights>, Self::Error>> + Send;
}

/// Narrative collaborator that never produces anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNarrative;

impl NarrativeInsight for NoNarrative {
    type Error = std::convert::Infallible;

    async fn summarize(
        &self,
        _keyword: &str,
        _summary: &TrendSummary,
    ) -> Result<Option<NarrativeInsights>, Self::Error> {
        Ok(None)
    }
}

/// Unique key of a cached analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub platform: String,
    /// Lowercased, trimmed keyword.
    pub keyword: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(platform: &str, keyword: &str) -> Self {
        Self {
            platform: platform.trim().to_lowercase(),
            keyword: keyword.trim().to_lowercase(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.platform, self.keyword)
    }
}

/// A persisted analysis blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    pub key: CacheKey,
    /// Serialized `KeywordAnalysis`, already sanitized.
    pub payload: Value,
    pub total_videos: usize,
    pub analyzed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// One row of trend-over-time history. At most one per key per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub key: CacheKey,
    pub snapshot_date: NaiveDate,
    pub total_videos: usize,
    pub avg_engagement_rate: f64,
    pub median_engagement_rate: f64,
    pub total_views: u64,
    /// Compact sanitized summary: top hashtags, benchmarks, optimal count.
    pub payload: Value,
    pub captured_at: DateTime<Utc>,
}

/// Key-value persistence for analyses and daily snapshots.
pub trait AnalysisStore {
    /// Point lookup by `(platform, keyword)`, regardless of expiry.
    fn load(
        &self,
        key: &CacheKey,
    ) -> impl Future<Output = Result<Option<StoredAnalysis>, StoreError>> + Send;

    /// Upsert by `(platform, keyword)`.
    fn save(&self, record: &StoredAnalysis)
        -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Upsert by `(platform, keyword, snapshot_date)`.
    fn upsert_snapshot(
        &self,
        snapshot: &DailySnapshot,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Most recent snapshots first.
    fn list_snapshots(
        &self,
        key: &CacheKey,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<DailySnapshot>, StoreError>> + Send;
}
