//! Process-local [`AnalysisStore`], used when no database is configured and
//! in tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use trendlens_core::{AnalysisStore, CacheKey, DailySnapshot, StoreError, StoredAnalysis};

#[derive(Debug, Default)]
struct Tables {
    analyses: HashMap<CacheKey, StoredAnalysis>,
    snapshots: BTreeMap<(CacheKey, NaiveDate), DailySnapshot>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    /// Number of cached analyses.
    #[must_use]
    pub fn analysis_count(&self) -> usize {
        self.tables().map_or(0, |t| t.analyses.len())
    }

    /// Number of daily snapshot rows across all keys.
    #[must_use]
    pub fn snapshot_count(&self) -> usize {
        self.tables().map_or(0, |t| t.snapshots.len())
    }
}

impl AnalysisStore for InMemoryStore {
    async fn load(&self, key: &CacheKey) -> Result<Option<StoredAnalysis>, StoreError> {
        Ok(self.tables()?.analyses.get(key).cloned())
    }

    async fn save(&self, record: &StoredAnalysis) -> Result<(), StoreError> {
        self.tables()?
            .analyses
            .insert(record.key.clone(), record.clone());
        Ok(())
    }

    async fn upsert_snapshot(&self, snapshot: &DailySnapshot) -> Result<(), StoreError> {
        self.tables()?.snapshots.insert(
            (snapshot.key.clone(), snapshot.snapshot_date),
            snapshot.clone(),
        );
        Ok(())
    }

    async fn list_snapshots(
        &self,
        key: &CacheKey,
        limit: usize,
    ) -> Result<Vec<DailySnapshot>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .snapshots
            .iter()
            .rev()
            .filter(|((k, _), _)| k == key)
            .take(limit)
            .map(|(_, snapshot)| snapshot.clone())
            .collect())
    }
}
