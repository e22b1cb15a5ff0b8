//! Postgres-backed [`AnalysisStore`].

use sqlx::PgPool;
use trendlens_core::{AnalysisStore, CacheKey, DailySnapshot, StoreError, StoredAnalysis};

use crate::trend_cache::{get_trend_cache, upsert_trend_cache, TrendCacheRow};
use crate::trend_snapshots::{list_trend_snapshots, upsert_trend_snapshot};

#[derive(Debug, Clone)]
pub struct PgAnalysisStore {
    pool: PgPool,
}

impl PgAnalysisStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl AnalysisStore for PgAnalysisStore {
    async fn load(&self, key: &CacheKey) -> Result<Option<StoredAnalysis>, StoreError> {
        let row = get_trend_cache(&self.pool, &key.platform, &key.keyword).await?;
        Ok(row.map(TrendCacheRow::into_stored).transpose()?)
    }

    async fn save(&self, record: &StoredAnalysis) -> Result<(), StoreError> {
        upsert_trend_cache(&self.pool, record).await?;
        Ok(())
    }

    async fn upsert_snapshot(&self, snapshot: &DailySnapshot) -> Result<(), StoreError> {
        upsert_trend_snapshot(&self.pool, snapshot).await?;
        Ok(())
    }

    async fn list_snapshots(
        &self,
        key: &CacheKey,
        limit: usize,
    ) -> Result<Vec<DailySnapshot>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = list_trend_snapshots(&self.pool, &key.platform, &key.keyword, limit).await?;
        rows.into_iter()
            .map(|row| row.into_snapshot().map_err(StoreError::from))
            .collect()
    }
}
