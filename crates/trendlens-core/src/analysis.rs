//! Result types for one keyword's trend analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::video::AnalyzedVideo;

/// Full analysis result for one keyword.
///
/// Every field is always present, even for a zero-video batch, so consumers
/// never have to special-case the shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordAnalysis {
    pub keyword: String,
    pub total_videos: usize,
    pub analyzed_at: DateTime<Utc>,
    pub aggregate_stats: AggregateStats,
    pub performance_tiers: PerformanceTiers,
    pub hashtag_insights: HashtagInsights,
    pub content_patterns: ContentPatterns,
    pub creator_insights: CreatorInsights,
    pub recommendations: Recommendations,
    /// Every video in the batch, sorted by engagement rate descending.
    pub all_videos: Vec<AnalyzedVideo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<NarrativeInsights>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_shares: u64,
    pub avg_views: u64,
    pub avg_likes: u64,
    pub avg_comments: u64,
    pub avg_shares: u64,
    pub avg_engagement_rate: f64,
    pub median_engagement_rate: f64,
    pub median_views: u64,
}

/// Four contiguous slices of the engagement-sorted video list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceTiers {
    pub viral: Vec<AnalyzedVideo>,
    pub high_performing: Vec<AnalyzedVideo>,
    pub average: Vec<AnalyzedVideo>,
    pub below_average: Vec<AnalyzedVideo>,
}

impl PerformanceTiers {
    #[must_use]
    pub fn total(&self) -> usize {
        self.viral.len()
            + self.high_performing.len()
            + self.average.len()
            + self.below_average.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashtagInsight {
    /// Normalized tag: lowercase, no leading `#`.
    pub tag: String,
    pub count: usize,
    pub avg_engagement: f64,
    pub avg_views: u64,
    pub top_video_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashtagCombo {
    /// The two tags sorted and joined with `" + "`.
    pub combo: String,
    pub tags: Vec<String>,
    pub count: usize,
    pub avg_engagement: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashtagInsights {
    pub top_hashtags: Vec<HashtagInsight>,
    pub hashtag_combos: Vec<HashtagCombo>,
    pub recommended_hashtags: Vec<HashtagInsight>,
}

/// A curated text pattern and where it was seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatch {
    pub pattern: String,
    pub count: usize,
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiCount {
    pub emoji: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPatterns {
    pub avg_description_length: usize,
    pub avg_hashtag_count: f64,
    pub common_phrases: Vec<PatternMatch>,
    pub call_to_actions: Vec<PatternMatch>,
    pub emoji_usage: Vec<EmojiCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorStats {
    pub author_id: String,
    pub author_name: String,
    pub video_count: usize,
    pub avg_engagement: f64,
    pub total_views: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorInsights {
    pub top_creators: Vec<CreatorStats>,
    pub unique_creators: usize,
}

/// Engagement-rate thresholds between tiers, preformatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementBenchmarks {
    pub viral: String,
    pub high_performing: String,
    pub average: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub optimal_hashtag_count: usize,
    pub suggested_hashtags: Vec<String>,
    pub content_tips: Vec<String>,
    pub engagement_benchmarks: EngagementBenchmarks,
}

/// Free-text enrichment produced by the narrative collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NarrativeInsights {
    pub summary: String,
    pub content_strategy: Vec<String>,
    pub hashtag_strategy: Vec<String>,
    pub caption_templates: Vec<String>,
    pub video_ideas: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_posting_advice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience_insights: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_prediction: Option<String>,
}

/// Compact statistics handed to the narrative collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub keyword: String,
    pub total_videos: usize,
    pub total_views: u64,
    pub avg_engagement_rate: f64,
    pub median_engagement_rate: f64,
    pub avg_description_length: usize,
    pub optimal_hashtag_count: usize,
    pub top_hashtags: Vec<SummaryHashtag>,
    pub top_combos: Vec<String>,
    pub top_phrases: Vec<String>,
    pub top_creators: Vec<String>,
    pub top_video_descriptions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryHashtag {
    pub tag: String,
    pub count: usize,
    pub avg_engagement: f64,
}

const SUMMARY_TOP_N: usize = 5;

impl TrendSummary {
    #[must_use]
    pub fn from_analysis(analysis: &KeywordAnalysis) -> Self {
        Self {
            keyword: analysis.keyword.clone(),
            total_videos: analysis.total_videos,
            total_views: analysis.aggregate_stats.total_views,
            avg_engagement_rate: analysis.aggregate_stats.avg_engagement_rate,
            median_engagement_rate: analysis.aggregate_stats.median_engagement_rate,
            avg_description_length: analysis.content_patterns.avg_description_length,
            optimal_hashtag_count: analysis.recommendations.optimal_hashtag_count,
            top_hashtags: analysis
                .hashtag_insights
                .top_hashtags
                .iter()
                .take(SUMMARY_TOP_N * 2)
                .map(|h| SummaryHashtag {
                    tag: h.tag.clone(),
                    count: h.count,
                    avg_engagement: h.avg_engagement,
                })
                .collect(),
            top_combos: analysis
                .hashtag_insights
                .hashtag_combos
                .iter()
                .take(SUMMARY_TOP_N)
                .map(|c| c.combo.clone())
                .collect(),
            top_phrases: analysis
                .content_patterns
                .common_phrases
                .iter()
                .take(SUMMARY_TOP_N)
                .map(|p| p.pattern.clone())
                .collect(),
            top_creators: analysis
                .creator_insights
                .top_creators
                .iter()
                .take(SUMMARY_TOP_N)
                .map(|c| c.author_name.clone())
                .collect(),
            top_video_descriptions: analysis
                .all_videos
                .iter()
                .take(SUMMARY_TOP_N)
                .map(|v| v.video.description.clone())
                .filter(|d| !d.trim().is_empty())
                .collect(),
        }
    }
}

/// Where a returned analysis came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Computed during this request.
    Fresh,
    /// Served from a cache entry inside the TTL window.
    Cached,
    /// Served from an expired cache entry because a refresh failed.
    Stale,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::Fresh => write!(f, "fresh"),
            Provenance::Cached => write!(f, "cached"),
            Provenance::Stale => write!(f, "stale"),
        }
    }
}

/// Per-keyword error stub returned when no analysis could be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordError {
    pub keyword: String,
    pub error: String,
    pub total_videos: usize,
}

impl KeywordError {
    #[must_use]
    pub fn new(keyword: &str, error: impl Into<String>) -> Self {
        Self {
            keyword: keyword.to_string(),
            error: error.into(),
            total_videos: 0,
        }
    }
}

/// One entry of a batch response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KeywordOutcome {
    Analyzed {
        #[serde(flatten)]
        analysis: Box<KeywordAnalysis>,
        provenance: Provenance,
    },
    Failed(KeywordError),
}

impl KeywordOutcome {
    #[must_use]
    pub fn analysis(&self) -> Option<&KeywordAnalysis> {
        match self {
            KeywordOutcome::Analyzed { analysis, .. } => Some(analysis),
            KeywordOutcome::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn provenance(&self) -> Option<Provenance> {
        match self {
            KeywordOutcome::Analyzed { provenance, .. } => Some(*provenance),
            KeywordOutcome::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&KeywordError> {
        match self {
            KeywordOutcome::Failed(err) => Some(err),
            KeywordOutcome::Analyzed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_error_serializes_with_zero_videos() {
        let outcome = KeywordOutcome::Failed(KeywordError::new("y", "fetch failed"));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"keyword": "y", "error": "fetch failed", "totalVideos": 0})
        );
    }

    #[test]
    fn narrative_insights_tolerate_partial_payloads() {
        let insights: NarrativeInsights =
            serde_json::from_str(r#"{"summary": "dance trends are up"}"#).unwrap();
        assert_eq!(insights.summary, "dance trends are up");
        assert!(insights.video_ideas.is_empty());
        assert!(insights.trend_prediction.is_none());
    }

    #[test]
    fn provenance_displays_lowercase() {
        assert_eq!(Provenance::Stale.to_string(), "stale");
        assert_eq!(
            serde_json::to_value(Provenance::Cached).unwrap(),
            serde_json::json!("cached")
        );
    }
}
