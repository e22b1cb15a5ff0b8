//! Trend analytics for short-form video batches.
//!
//! Turns one keyword's raw videos into a [`KeywordAnalysis`]: engagement
//! metrics, performance tiers, hashtag and caption patterns, creator
//! leaderboards, and recommendations. Everything here is pure; fetching and
//! caching live in `trendlens-engine`.
//!
//! [`KeywordAnalysis`]: trendlens_core::KeywordAnalysis

pub mod analyze;
pub mod hashtags;
pub mod metrics;
pub mod patterns;
pub mod recommend;
pub mod tiering;

pub use analyze::{build_keyword_analysis, rerank_analysis};
pub use hashtags::{aggregate_hashtags, hashtag_combos, normalized_tags, top_hashtags};
pub use metrics::{analyze_video, engagement_rate, like_to_view_ratio};
pub use patterns::{
    average_description_length, detect_call_to_actions, extract_common_phrases, extract_emojis,
};
pub use recommend::{
    content_tips, engagement_benchmarks, recommend_hashtags, suggested_hashtags, HashtagContext,
    TipInputs, HASHTAG_STRATEGIES,
};
pub use tiering::{
    aggregate_stats, creator_insights, optimal_hashtag_count, partition_tiers, rank_videos,
    TierBounds,
};
