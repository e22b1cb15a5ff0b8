//! Database operations for the `trend_cache` table.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use trendlens_core::{CacheKey, StoredAnalysis};
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `trend_cache` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendCacheRow {
    pub id: i64,
    pub public_id: Uuid,
    pub platform: String,
    pub keyword: String,
    pub payload: Value,
    pub total_videos: i32,
    pub analyzed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrendCacheRow {
    /// Convert into the port-level record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::OutOfRange`] if `total_videos` is negative.
    pub fn into_stored(self) -> Result<StoredAnalysis, DbError> {
        let total_videos =
            usize::try_from(self.total_videos).map_err(|_| DbError::OutOfRange {
                field: "trend_cache.total_videos",
                value: self.total_videos.to_string(),
            })?;
        Ok(StoredAnalysis {
            key: CacheKey {
                platform: self.platform,
                keyword: self.keyword,
            },
            payload: self.payload,
            total_videos,
            analyzed_at: self.analyzed_at,
            expires_at: self.expires_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert or replace the cached analysis for `(platform, keyword)`.
///
/// Last write wins; `public_id` and `created_at` survive the update.
/// Returns the row id.
///
/// # Errors
///
/// Returns [`DbError::OutOfRange`] if `total_videos` exceeds `i32`, or
/// [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_trend_cache(pool: &PgPool, record: &StoredAnalysis) -> Result<i64, DbError> {
    let total_videos = i32::try_from(record.total_videos).map_err(|_| DbError::OutOfRange {
        field: "trend_cache.total_videos",
        value: record.total_videos.to_string(),
    })?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO trend_cache \
             (platform, keyword, payload, total_videos, analyzed_at, expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (platform, keyword) DO UPDATE SET \
             payload      = EXCLUDED.payload, \
             total_videos = EXCLUDED.total_videos, \
             analyzed_at  = EXCLUDED.analyzed_at, \
             expires_at   = EXCLUDED.expires_at, \
             updated_at   = NOW() \
         RETURNING id",
    )
    .bind(&record.key.platform)
    .bind(&record.key.keyword)
    .bind(&record.payload)
    .bind(total_videos)
    .bind(record.analyzed_at)
    .bind(record.expires_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Look up the cached analysis for `(platform, keyword)`, expired or not.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_trend_cache(
    pool: &PgPool,
    platform: &str,
    keyword: &str,
) -> Result<Option<TrendCacheRow>, DbError> {
    let row = sqlx::query_as::<_, TrendCacheRow>(
        "SELECT id, public_id, platform, keyword, payload, total_videos, analyzed_at, \
                expires_at, created_at, updated_at \
         FROM trend_cache \
         WHERE platform = $1 AND keyword = $2",
    )
    .bind(platform)
    .bind(keyword)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Delete cache rows that expired before `before`. Returns the number removed.
///
/// Expired rows are still useful as stale fallbacks, so callers choose a
/// cutoff well past the TTL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_expired_trend_cache(
    pool: &PgPool,
    before: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM trend_cache WHERE expires_at < $1")
        .bind(before)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
