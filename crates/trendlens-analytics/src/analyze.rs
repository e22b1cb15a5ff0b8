//! Keyword analysis orchestration.

use chrono::{DateTime, Utc};
use trendlens_core::{
    ContentPatterns, HashtagExclusions, HashtagInsights, KeywordAnalysis, RawVideo,
    Recommendations,
};

use crate::hashtags::{aggregate_hashtags, hashtag_combos, top_hashtags};
use crate::metrics::analyze_video;
use crate::patterns::{
    average_description_length, detect_call_to_actions, extract_common_phrases, extract_emojis,
};
use crate::recommend::{
    content_tips, engagement_benchmarks, recommend_hashtags, suggested_hashtags, HashtagContext,
    TipInputs,
};
use crate::tiering::{
    aggregate_stats, average_hashtag_count, creator_insights, optimal_hashtag_count,
    partition_tiers, rank_videos,
};

/// Build the full analysis for one keyword's batch.
///
/// 1. Compute per-video metrics.
/// 2. Rank by engagement rate and slice into tiers.
/// 3. Aggregate stats, hashtags, text patterns, and creators.
/// 4. Derive recommendations from the above.
///
/// Pure and deterministic for a given `now`. An empty batch yields a
/// zeroed analysis with every section present.
#[must_use]
pub fn build_keyword_analysis(
    keyword: &str,
    videos: Vec<RawVideo>,
    exclusions: &dyn HashtagExclusions,
    now: DateTime<Utc>,
) -> KeywordAnalysis {
    let ranked = rank_videos(videos.into_iter().map(analyze_video).collect());
    let performance_tiers = partition_tiers(&ranked);
    let aggregate = aggregate_stats(&ranked);

    let insights = aggregate_hashtags(&ranked, exclusions);
    let combos = hashtag_combos(&ranked, exclusions);
    let recommended = recommend_hashtags(&HashtagContext {
        insights: &insights,
        median_engagement: aggregate.median_engagement_rate,
        mean_engagement: aggregate.avg_engagement_rate,
    });

    let content_patterns = ContentPatterns {
        avg_description_length: average_description_length(&ranked),
        avg_hashtag_count: average_hashtag_count(&ranked),
        common_phrases: extract_common_phrases(&ranked),
        call_to_actions: detect_call_to_actions(&ranked),
        emoji_usage: extract_emojis(&ranked),
    };

    let recommendations = Recommendations {
        optimal_hashtag_count: optimal_hashtag_count(&performance_tiers, &ranked),
        suggested_hashtags: suggested_hashtags(&recommended),
        content_tips: content_tips(&TipInputs {
            viral: &performance_tiers.viral,
            combos: &combos,
            emojis: &content_patterns.emoji_usage,
            call_to_actions: &content_patterns.call_to_actions,
        }),
        engagement_benchmarks: engagement_benchmarks(
            &performance_tiers,
            aggregate.median_engagement_rate,
        ),
    };

    tracing::debug!(
        keyword,
        total_videos = ranked.len(),
        hashtags = insights.len(),
        combos = combos.len(),
        "keyword analysis built"
    );

    KeywordAnalysis {
        keyword: keyword.to_string(),
        total_videos: ranked.len(),
        analyzed_at: now,
        aggregate_stats: aggregate,
        performance_tiers,
        hashtag_insights: HashtagInsights {
            top_hashtags: top_hashtags(&insights),
            hashtag_combos: combos,
            recommended_hashtags: recommended,
        },
        content_patterns,
        creator_insights: creator_insights(&ranked),
        recommendations,
        all_videos: ranked,
        narrative: None,
    }
}

/// Re-rank `all_videos` and rebuild the tiers from it.
///
/// Used when an analysis is read back from storage, so ranks and tier
/// membership always agree with the stored engagement rates. Idempotent.
pub fn rerank_analysis(analysis: &mut KeywordAnalysis) {
    let videos = std::mem::take(&mut analysis.all_videos);
    let ranked = rank_videos(videos);
    analysis.performance_tiers = partition_tiers(&ranked);
    analysis.total_videos = ranked.len();
    analysis.all_videos = ranked;
}
