//! Ranking, aggregate statistics, performance tiers, and creator leaderboards.

use std::collections::HashMap;

use trendlens_core::{
    AggregateStats, AnalyzedVideo, CreatorInsights, CreatorStats, PerformanceTiers,
};

const MAX_TOP_CREATORS: usize = 10;

/// Sort by engagement rate descending and assign 1-based ranks.
///
/// The sort is stable, so equal rates keep their input order.
#[must_use]
pub fn rank_videos(mut videos: Vec<AnalyzedVideo>) -> Vec<AnalyzedVideo> {
    videos.sort_by(|a, b| b.engagement_rate.total_cmp(&a.engagement_rate));
    for (i, video) in videos.iter_mut().enumerate() {
        video.rank = i + 1;
    }
    videos
}

/// Exclusive end indices of the first three tiers in an `n`-video list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierBounds {
    pub viral: usize,
    pub high: usize,
    pub average: usize,
}

impl TierBounds {
    /// `ceil(n × 0.1)`, `ceil(n × 0.3)`, `ceil(n × 0.7)`, computed in integers.
    #[must_use]
    pub fn for_len(n: usize) -> Self {
        Self {
            viral: n.div_ceil(10),
            high: (n * 3).div_ceil(10),
            average: (n * 7).div_ceil(10),
        }
    }
}

/// Slice an engagement-sorted list into the four contiguous tiers.
#[must_use]
pub fn partition_tiers(ranked: &[AnalyzedVideo]) -> PerformanceTiers {
    let bounds = TierBounds::for_len(ranked.len());
    PerformanceTiers {
        viral: ranked[..bounds.viral].to_vec(),
        high_performing: ranked[bounds.viral..bounds.high].to_vec(),
        average: ranked[bounds.high..bounds.average].to_vec(),
        below_average: ranked[bounds.average..].to_vec(),
    }
}

/// Totals, rounded averages, and lower-middle medians.
///
/// Medians take the element at `floor(n / 2)` of the ascending order with no
/// interpolation.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate_stats(videos: &[AnalyzedVideo]) -> AggregateStats {
    if videos.is_empty() {
        return AggregateStats::default();
    }

    let n = videos.len() as u64;
    let mut stats = AggregateStats::default();
    let mut total_engagement = 0.0;

    for video in videos {
        let s = &video.video.stats;
        stats.total_views = stats.total_views.saturating_add(s.play_count);
        stats.total_likes = stats.total_likes.saturating_add(s.like_count);
        stats.total_comments = stats.total_comments.saturating_add(s.comment_count);
        stats.total_shares = stats.total_shares.saturating_add(s.share_count);
        total_engagement += video.engagement_rate;
    }

    stats.avg_views = rounded_avg(stats.total_views, n);
    stats.avg_likes = rounded_avg(stats.total_likes, n);
    stats.avg_comments = rounded_avg(stats.total_comments, n);
    stats.avg_shares = rounded_avg(stats.total_shares, n);
    stats.avg_engagement_rate = total_engagement / videos.len() as f64;

    let mid = videos.len() / 2;

    let mut rates: Vec<f64> = videos.iter().map(|v| v.engagement_rate).collect();
    rates.sort_by(f64::total_cmp);
    stats.median_engagement_rate = rates[mid];

    let mut views: Vec<u64> = videos.iter().map(|v| v.video.stats.play_count).collect();
    views.sort_unstable();
    stats.median_views = views[mid];

    stats
}

/// Integer mean rounded half up.
pub(crate) fn rounded_avg(total: u64, n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    total / n + u64::from(total % n >= n.div_ceil(2))
}

struct CreatorAccumulator {
    author_id: String,
    author_name: String,
    video_count: usize,
    total_engagement: f64,
    total_views: u64,
}

/// Grouping key for a creator. Ids and names are separate namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CreatorKey<'a> {
    ById(&'a str),
    ByName(&'a str),
}

/// Group by author id and rank creators by average engagement.
///
/// Videos without an author id are grouped by author name instead.
#[must_use]
pub fn creator_insights(videos: &[AnalyzedVideo]) -> CreatorInsights {
    let mut groups: Vec<CreatorAccumulator> = Vec::new();
    let mut index: HashMap<CreatorKey<'_>, usize> = HashMap::new();

    for video in videos {
        let author = &video.video.author;
        let key = if author.id.is_empty() {
            CreatorKey::ByName(author.name.as_str())
        } else {
            CreatorKey::ById(author.id.as_str())
        };

        let i = *index.entry(key).or_insert_with(|| {
            groups.push(CreatorAccumulator {
                author_id: author.id.clone(),
                author_name: author.name.clone(),
                video_count: 0,
                total_engagement: 0.0,
                total_views: 0,
            });
            groups.len() - 1
        });

        let group = &mut groups[i];
        group.video_count += 1;
        group.total_engagement += video.engagement_rate;
        group.total_views = group.total_views.saturating_add(video.video.stats.play_count);
    }

    let unique_creators = groups.len();

    let mut top_creators: Vec<CreatorStats> = groups
        .into_iter()
        .map(|g| {
            #[allow(clippy::cast_precision_loss)]
            let avg_engagement = g.total_engagement / g.video_count.max(1) as f64;
            CreatorStats {
                author_id: g.author_id,
                author_name: g.author_name,
                video_count: g.video_count,
                avg_engagement,
                total_views: g.total_views,
            }
        })
        .collect();

    top_creators.sort_by(|a, b| b.avg_engagement.total_cmp(&a.avg_engagement));
    top_creators.truncate(MAX_TOP_CREATORS);

    CreatorInsights {
        top_creators,
        unique_creators,
    }
}

/// Average hashtag count of the viral tier, or of all videos when the viral
/// tier is empty, rounded to the nearest integer.
#[must_use]
pub fn optimal_hashtag_count(tiers: &PerformanceTiers, all: &[AnalyzedVideo]) -> usize {
    let source = if tiers.viral.is_empty() {
        all
    } else {
        &tiers.viral
    };
    round_to_count(average_hashtag_count(source))
}

/// Mean number of raw hashtags per video, `0.0` when empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_hashtag_count(videos: &[AnalyzedVideo]) -> f64 {
    if videos.is_empty() {
        return 0.0;
    }
    let total: usize = videos.iter().map(|v| v.video.hashtags.len()).sum();
    total as f64 / videos.len() as f64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_to_count(value: f64) -> usize {
    if value.is_finite() && value > 0.0 {
        value.round() as usize
    } else {
        0
    }
}
