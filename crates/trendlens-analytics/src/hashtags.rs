//! Hashtag aggregation and co-occurrence mining.

use std::collections::HashMap;

use trendlens_core::{
    normalize_hashtag, AnalyzedVideo, HashtagCombo, HashtagExclusions, HashtagInsight,
};

use crate::tiering::rounded_avg;

/// Tags per video considered for pair mining.
const MAX_TAGS_PER_VIDEO_FOR_COMBOS: usize = 5;
const MIN_COMBO_COUNT: usize = 2;
const MAX_COMBOS: usize = 10;
pub const MAX_TOP_HASHTAGS: usize = 20;

/// Normalized, deduplicated, non-excluded tags of one video, in original order.
#[must_use]
pub fn normalized_tags(video: &AnalyzedVideo, exclusions: &dyn HashtagExclusions) -> Vec<String> {
    let mut tags: Vec<String> = Vec::with_capacity(video.video.hashtags.len());
    for raw in &video.video.hashtags {
        let tag = normalize_hashtag(raw);
        if tag.is_empty() || exclusions.is_excluded(&tag) || tags.contains(&tag) {
            continue;
        }
        tags.push(tag);
    }
    tags
}

struct TagAccumulator {
    tag: String,
    count: usize,
    total_engagement: f64,
    total_views: u64,
    top_video_id: String,
    top_engagement: f64,
}

/// Aggregate per-tag statistics across the batch.
///
/// Returned in first-seen order; callers rank as needed. The top video for a
/// tag is the first video seen with the highest engagement rate.
#[must_use]
pub fn aggregate_hashtags(
    videos: &[AnalyzedVideo],
    exclusions: &dyn HashtagExclusions,
) -> Vec<HashtagInsight> {
    let mut accumulators: Vec<TagAccumulator> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for video in videos {
        for tag in normalized_tags(video, exclusions) {
            let i = *index.entry(tag.clone()).or_insert_with(|| {
                accumulators.push(TagAccumulator {
                    tag,
                    count: 0,
                    total_engagement: 0.0,
                    total_views: 0,
                    top_video_id: video.video.id.clone(),
                    top_engagement: video.engagement_rate,
                });
                accumulators.len() - 1
            });

            let acc = &mut accumulators[i];
            acc.count += 1;
            acc.total_engagement += video.engagement_rate;
            acc.total_views = acc.total_views.saturating_add(video.video.stats.play_count);
            if video.engagement_rate > acc.top_engagement {
                acc.top_engagement = video.engagement_rate;
                acc.top_video_id.clone_from(&video.video.id);
            }
        }
    }

    accumulators
        .into_iter()
        .map(|acc| {
            let count = acc.count.max(1);
            #[allow(clippy::cast_precision_loss)]
            let avg_engagement = acc.total_engagement / count as f64;
            HashtagInsight {
                tag: acc.tag,
                count: acc.count,
                avg_engagement,
                avg_views: rounded_avg(acc.total_views, count as u64),
                top_video_id: acc.top_video_id,
            }
        })
        .collect()
}

/// Most frequent tags; ties go to higher average engagement.
#[must_use]
pub fn top_hashtags(insights: &[HashtagInsight]) -> Vec<HashtagInsight> {
    let mut ranked = insights.to_vec();
    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.avg_engagement.total_cmp(&a.avg_engagement))
    });
    ranked.truncate(MAX_TOP_HASHTAGS);
    ranked
}

/// Count co-occurring tag pairs.
///
/// Each video contributes every unordered pair among its first five
/// normalized tags. Pairs seen at least twice are kept, ranked by average
/// engagement descending, top ten.
#[must_use]
pub fn hashtag_combos(
    videos: &[AnalyzedVideo],
    exclusions: &dyn HashtagExclusions,
) -> Vec<HashtagCombo> {
    let mut combos: Vec<(HashtagCombo, f64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for video in videos {
        let mut tags = normalized_tags(video, exclusions);
        tags.truncate(MAX_TAGS_PER_VIDEO_FOR_COMBOS);

        for i in 0..tags.len() {
            for j in (i + 1)..tags.len() {
                let mut pair = [tags[i].clone(), tags[j].clone()];
                pair.sort();
                let key = pair.join(" + ");

                let slot = *index.entry(key.clone()).or_insert_with(|| {
                    combos.push((
                        HashtagCombo {
                            combo: key,
                            tags: pair.to_vec(),
                            count: 0,
                            avg_engagement: 0.0,
                        },
                        0.0,
                    ));
                    combos.len() - 1
                });
                let (combo, total_engagement) = &mut combos[slot];
                combo.count += 1;
                *total_engagement += video.engagement_rate;
            }
        }
    }

    let mut kept: Vec<HashtagCombo> = combos
        .into_iter()
        .filter(|(combo, _)| combo.count >= MIN_COMBO_COUNT)
        .map(|(mut combo, total)| {
            #[allow(clippy::cast_precision_loss)]
            let avg = total / combo.count as f64;
            combo.avg_engagement = avg;
            combo
        })
        .collect();

    kept.sort_by(|a, b| b.avg_engagement.total_cmp(&a.avg_engagement));
    kept.truncate(MAX_COMBOS);
    kept
}
