//! Hashtag recommendations, content tips, and engagement benchmarks.
//!
//! Hashtag selection is an ordered chain of strategies. The first strategy
//! that yields anything wins, so recommendations are only empty when the
//! batch has no usable hashtags at all.

use trendlens_core::{
    AnalyzedVideo, EmojiCount, EngagementBenchmarks, HashtagCombo, HashtagInsight, PatternMatch,
    PerformanceTiers,
};

use crate::patterns::average_description_length;

const MAX_RECOMMENDED: usize = 10;
const MIN_STRICT_COUNT: usize = 2;
const SHORT_CAPTION_CHARS: usize = 100;
const LONG_CAPTION_CHARS: usize = 200;
const TIP_EMOJIS: usize = 5;

/// Inputs shared by every hashtag strategy.
#[derive(Debug, Clone, Copy)]
pub struct HashtagContext<'a> {
    pub insights: &'a [HashtagInsight],
    pub median_engagement: f64,
    pub mean_engagement: f64,
}

pub type HashtagStrategy = fn(&HashtagContext<'_>) -> Vec<HashtagInsight>;

/// Strategies tried in order, with a name for logging.
pub const HASHTAG_STRATEGIES: &[(&str, HashtagStrategy)] = &[
    ("frequent_above_median", frequent_above_median),
    ("at_or_above_mean", at_or_above_mean),
    ("highest_engagement", highest_engagement),
];

/// Tags seen at least twice whose average engagement beats the median video.
#[must_use]
pub fn frequent_above_median(ctx: &HashtagContext<'_>) -> Vec<HashtagInsight> {
    let floor = ctx.median_engagement;
    rank_by_engagement(
        ctx.insights
            .iter()
            .filter(|h| h.count >= MIN_STRICT_COUNT && h.avg_engagement > floor),
    )
}

/// Tags whose average engagement is at least the batch mean, any count.
#[must_use]
pub fn at_or_above_mean(ctx: &HashtagContext<'_>) -> Vec<HashtagInsight> {
    rank_by_engagement(
        ctx.insights
            .iter()
            .filter(|h| h.avg_engagement >= ctx.mean_engagement),
    )
}

/// Top tags by average engagement, unfiltered.
#[must_use]
pub fn highest_engagement(ctx: &HashtagContext<'_>) -> Vec<HashtagInsight> {
    rank_by_engagement(ctx.insights.iter())
}

fn rank_by_engagement<'a>(
    insights: impl Iterator<Item = &'a HashtagInsight>,
) -> Vec<HashtagInsight> {
    let mut ranked: Vec<HashtagInsight> = insights.cloned().collect();
    ranked.sort_by(|a, b| b.avg_engagement.total_cmp(&a.avg_engagement));
    ranked.truncate(MAX_RECOMMENDED);
    ranked
}

/// Run the strategy chain and return the first non-empty result.
#[must_use]
pub fn recommend_hashtags(ctx: &HashtagContext<'_>) -> Vec<HashtagInsight> {
    for (name, strategy) in HASHTAG_STRATEGIES {
        let picked = strategy(ctx);
        if !picked.is_empty() {
            tracing::debug!(strategy = name, count = picked.len(), "hashtag strategy matched");
            return picked;
        }
    }
    Vec::new()
}

/// Inputs for caption and format advice.
#[derive(Debug, Clone, Copy)]
pub struct TipInputs<'a> {
    pub viral: &'a [AnalyzedVideo],
    pub combos: &'a [HashtagCombo],
    pub emojis: &'a [EmojiCount],
    pub call_to_actions: &'a [PatternMatch],
}

/// Heuristic content tips derived from what the top tier does.
#[must_use]
pub fn content_tips(inputs: &TipInputs<'_>) -> Vec<String> {
    let mut tips = Vec::new();

    if !inputs.viral.is_empty() {
        let viral_len = average_description_length(inputs.viral);
        if viral_len < SHORT_CAPTION_CHARS {
            tips.push(format!(
                "Keep captions short and punchy: viral videos average {viral_len} characters."
            ));
        } else if viral_len > LONG_CAPTION_CHARS {
            tips.push(format!(
                "Longer, story-style captions perform well: viral videos average \
                 {viral_len} characters."
            ));
        }
    }

    if let Some(combo) = inputs.combos.first() {
        let tags: Vec<String> = combo.tags.iter().map(|t| format!("#{t}")).collect();
        tips.push(format!(
            "Pair {}: used together in {} videos averaging {:.2}% engagement.",
            tags.join(" with "),
            combo.count,
            combo.avg_engagement
        ));
    }

    if !inputs.emojis.is_empty() {
        let glyphs: Vec<&str> = inputs
            .emojis
            .iter()
            .take(TIP_EMOJIS)
            .map(|e| e.emoji.as_str())
            .collect();
        tips.push(format!("Popular emojis in this niche: {}", glyphs.join(" ")));
    }

    if let Some(cta) = inputs.call_to_actions.first() {
        tips.push(format!(
            "Most used call to action: \"{}\" ({} videos).",
            cta.pattern, cta.count
        ));
    }

    tips
}

/// Engagement thresholds between tiers.
///
/// Viral and high-performing report the lowest rate inside that tier with a
/// `>` prefix; average reports the median rate.
#[must_use]
pub fn engagement_benchmarks(
    tiers: &PerformanceTiers,
    median_engagement: f64,
) -> EngagementBenchmarks {
    EngagementBenchmarks {
        viral: threshold(&tiers.viral),
        high_performing: threshold(&tiers.high_performing),
        average: format!("{median_engagement:.2}%"),
    }
}

fn threshold(tier: &[AnalyzedVideo]) -> String {
    let floor = tier.last().map_or(0.0, |v| v.engagement_rate);
    format!(">{floor:.2}%")
}

/// `#tag` strings for display.
#[must_use]
pub fn suggested_hashtags(recommended: &[HashtagInsight]) -> Vec<String> {
    recommended.iter().map(|h| format!("#{}", h.tag)).collect()
}
