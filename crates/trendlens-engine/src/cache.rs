//! Conversions between [`KeywordAnalysis`] and its persisted forms.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use trendlens_analytics::rerank_analysis;
use trendlens_core::{CacheKey, DailySnapshot, KeywordAnalysis, StoreError, StoredAnalysis};

use crate::sanitize::sanitize_value;

const SNAPSHOT_TOP_HASHTAGS: usize = 10;

/// A stored analysis is fresh while `now - analyzed_at < ttl`.
#[must_use]
pub fn is_fresh(analyzed_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now.signed_duration_since(analyzed_at) < ttl
}

/// Decode a stored payload and recompute ranks and tiers.
///
/// # Errors
///
/// Returns the decode error when the payload is not a valid analysis.
pub fn restore_analysis(record: &StoredAnalysis) -> Result<KeywordAnalysis, serde_json::Error> {
    let mut analysis: KeywordAnalysis = serde_json::from_value(record.payload.clone())?;
    rerank_analysis(&mut analysis);
    Ok(analysis)
}

/// Build the cache record for a fresh analysis. The payload is sanitized.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if the analysis cannot be encoded.
pub fn cache_record(
    key: &CacheKey,
    analysis: &KeywordAnalysis,
    ttl: Duration,
) -> Result<StoredAnalysis, StoreError> {
    let payload = sanitize_value(serde_json::to_value(analysis)?);
    Ok(StoredAnalysis {
        key: key.clone(),
        payload,
        total_videos: analysis.total_videos,
        analyzed_at: analysis.analyzed_at,
        expires_at: analysis.analyzed_at + ttl,
    })
}

/// Build the daily history row for an analysis, dated by `analyzed_at`.
#[must_use]
pub fn daily_snapshot(key: &CacheKey, analysis: &KeywordAnalysis) -> DailySnapshot {
    let top: Vec<_> = analysis
        .hashtag_insights
        .top_hashtags
        .iter()
        .take(SNAPSHOT_TOP_HASHTAGS)
        .map(|h| json!({"tag": h.tag, "count": h.count, "avgEngagement": h.avg_engagement}))
        .collect();

    let payload = sanitize_value(json!({
        "topHashtags": top,
        "suggestedHashtags": analysis.recommendations.suggested_hashtags,
        "engagementBenchmarks": analysis.recommendations.engagement_benchmarks,
        "optimalHashtagCount": analysis.recommendations.optimal_hashtag_count,
        "uniqueCreators": analysis.creator_insights.unique_creators,
    }));

    DailySnapshot {
        key: key.clone(),
        snapshot_date: analysis.analyzed_at.date_naive(),
        total_videos: analysis.total_videos,
        avg_engagement_rate: analysis.aggregate_stats.avg_engagement_rate,
        median_engagement_rate: analysis.aggregate_stats.median_engagement_rate,
        total_views: analysis.aggregate_stats.total_views,
        payload,
        captured_at: analysis.analyzed_at,
    }
}
