//! Per-video engagement metrics.

use trendlens_core::{AnalyzedVideo, RawVideo, VideoStats};

/// Engagement rate as a percentage of views.
///
/// `(likes + comments + shares) / plays × 100`, or `0.0` when there are no
/// plays. Inputs are not validated.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn engagement_rate(stats: &VideoStats) -> f64 {
    if stats.play_count == 0 {
        return 0.0;
    }
    stats.interactions() as f64 / stats.play_count as f64 * 100.0
}

/// Likes as a percentage of views, `0.0` when there are no plays.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn like_to_view_ratio(stats: &VideoStats) -> f64 {
    if stats.play_count == 0 {
        return 0.0;
    }
    stats.like_count as f64 / stats.play_count as f64 * 100.0
}

/// Attach derived metrics to a raw video. `rank` stays `0` until the batch
/// is sorted.
#[must_use]
pub fn analyze_video(video: RawVideo) -> AnalyzedVideo {
    let engagement_rate = engagement_rate(&video.stats);
    let like_to_view_ratio = like_to_view_ratio(&video.stats);
    AnalyzedVideo {
        video,
        engagement_rate,
        like_to_view_ratio,
        rank: 0,
    }
}
