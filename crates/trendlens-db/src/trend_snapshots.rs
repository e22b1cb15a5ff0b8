//! Database operations for the `trend_snapshots` table.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::PgPool;
use trendlens_core::{CacheKey, DailySnapshot};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `trend_snapshots` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendSnapshotRow {
    pub id: i64,
    pub platform: String,
    pub keyword: String,
    pub snapshot_date: NaiveDate,
    pub total_videos: i32,
    pub avg_engagement_rate: f64,
    pub median_engagement_rate: f64,
    pub total_views: i64,
    pub payload: Value,
    pub captured_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrendSnapshotRow {
    /// Convert into the port-level snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::OutOfRange`] if a count column is negative.
    pub fn into_snapshot(self) -> Result<DailySnapshot, DbError> {
        let total_videos =
            usize::try_from(self.total_videos).map_err(|_| DbError::OutOfRange {
                field: "trend_snapshots.total_videos",
                value: self.total_videos.to_string(),
            })?;
        let total_views = u64::try_from(self.total_views).map_err(|_| DbError::OutOfRange {
            field: "trend_snapshots.total_views",
            value: self.total_views.to_string(),
        })?;
        Ok(DailySnapshot {
            key: CacheKey {
                platform: self.platform,
                keyword: self.keyword,
            },
            snapshot_date: self.snapshot_date,
            total_videos,
            avg_engagement_rate: self.avg_engagement_rate,
            median_engagement_rate: self.median_engagement_rate,
            total_views,
            payload: self.payload,
            captured_at: self.captured_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert or update the snapshot for `(platform, keyword, snapshot_date)`.
///
/// Repeated analyses on the same day overwrite the same row. Returns the
/// row id.
///
/// # Errors
///
/// Returns [`DbError::OutOfRange`] if a count does not fit its column, or
/// [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_trend_snapshot(
    pool: &PgPool,
    snapshot: &DailySnapshot,
) -> Result<i64, DbError> {
    let total_videos = i32::try_from(snapshot.total_videos).map_err(|_| DbError::OutOfRange {
        field: "trend_snapshots.total_videos",
        value: snapshot.total_videos.to_string(),
    })?;
    let total_views = i64::try_from(snapshot.total_views).map_err(|_| DbError::OutOfRange {
        field: "trend_snapshots.total_views",
        value: snapshot.total_views.to_string(),
    })?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO trend_snapshots \
             (platform, keyword, snapshot_date, total_videos, avg_engagement_rate, \
              median_engagement_rate, total_views, payload, captured_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (platform, keyword, snapshot_date) DO UPDATE SET \
             total_videos           = EXCLUDED.total_videos, \
             avg_engagement_rate    = EXCLUDED.avg_engagement_rate, \
             median_engagement_rate = EXCLUDED.median_engagement_rate, \
             total_views            = EXCLUDED.total_views, \
             payload                = EXCLUDED.payload, \
             captured_at            = EXCLUDED.captured_at, \
             updated_at             = NOW() \
         RETURNING id",
    )
    .bind(&snapshot.key.platform)
    .bind(&snapshot.key.keyword)
    .bind(snapshot.snapshot_date)
    .bind(total_videos)
    .bind(snapshot.avg_engagement_rate)
    .bind(snapshot.median_engagement_rate)
    .bind(total_views)
    .bind(&snapshot.payload)
    .bind(snapshot.captured_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// List the most recent snapshots for `(platform, keyword)`.
///
/// Ordered by `snapshot_date DESC`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_trend_snapshots(
    pool: &PgPool,
    platform: &str,
    keyword: &str,
    limit: i64,
) -> Result<Vec<TrendSnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendSnapshotRow>(
        "SELECT id, platform, keyword, snapshot_date, total_videos, avg_engagement_rate, \
                median_engagement_rate, total_views, payload, captured_at, created_at, updated_at \
         FROM trend_snapshots \
         WHERE platform = $1 AND keyword = $2 \
         ORDER BY snapshot_date DESC \
         LIMIT $3",
    )
    .bind(platform)
    .bind(keyword)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
