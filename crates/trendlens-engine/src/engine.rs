//! Batch orchestration: cache check, fetch, analysis, enrichment, persistence.
//!
//! Every keyword in a batch is an independent unit of work. A failing keyword
//! degrades to a stale cached analysis or a [`KeywordError`] stub; it never
//! fails the batch.

use std::collections::{BTreeMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use trendlens_analytics::build_keyword_analysis;
use trendlens_core::{
    AnalysisStore, AppConfig, CacheKey, DailySnapshot, ExclusionList, HashtagExclusions,
    KeywordAnalysis, KeywordError, KeywordOutcome, NarrativeInsight, NarrativeInsights,
    NoNarrative, Provenance, RawVideo, TrendSummary, VideoSource,
};

use crate::cache::{cache_record, daily_snapshot, is_fresh, restore_analysis};
use crate::error::EngineError;

pub const DEFAULT_PLATFORM: &str = "tiktok";
pub const DEFAULT_CACHE_TTL_HOURS: i64 = 24;
pub const DEFAULT_MAX_KEYWORDS: usize = 3;
pub const DEFAULT_MAX_VIDEO_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Platform component of every cache key.
    pub platform: String,
    pub cache_ttl: Duration,
    pub max_keywords: usize,
    pub max_video_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            platform: DEFAULT_PLATFORM.to_string(),
            cache_ttl: Duration::hours(DEFAULT_CACHE_TTL_HOURS),
            max_keywords: DEFAULT_MAX_KEYWORDS,
            max_video_limit: DEFAULT_MAX_VIDEO_LIMIT,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            platform: config.platform.clone(),
            cache_ttl: Duration::hours(i64::from(config.cache_ttl_hours)),
            max_keywords: config.max_keywords,
            max_video_limit: config.max_video_limit,
        }
    }
}

/// Trend analysis engine over injected collaborators.
pub struct TrendEngine<V, S, N = NoNarrative> {
    source: V,
    store: S,
    narrative: N,
    exclusions: Box<dyn HashtagExclusions + Send + Sync>,
    config: EngineConfig,
}

impl<V, S> TrendEngine<V, S, NoNarrative> {
    /// Engine with the built-in exclusion list and no narrative enrichment.
    pub fn new(source: V, store: S, config: EngineConfig) -> Self {
        Self {
            source,
            store,
            narrative: NoNarrative,
            exclusions: Box::new(ExclusionList::default()),
            config,
        }
    }
}

impl<V, S, N> TrendEngine<V, S, N> {
    pub fn with_narrative<M>(self, narrative: M) -> TrendEngine<V, S, M> {
        TrendEngine {
            source: self.source,
            store: self.store,
            narrative,
            exclusions: self.exclusions,
            config: self.config,
        }
    }

    #[must_use]
    pub fn with_exclusions(
        mut self,
        exclusions: impl HashtagExclusions + Send + Sync + 'static,
    ) -> Self {
        self.exclusions = Box::new(exclusions);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn cache_key(&self, keyword: &str) -> CacheKey {
        CacheKey::new(&self.config.platform, keyword)
    }

    /// Trim, reject blanks, collapse case-insensitive duplicates (first
    /// spelling wins), and enforce the per-request keyword cap.
    fn normalize_keywords(&self, keywords: &[String]) -> Result<Vec<String>, EngineError> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(keywords.len());
        for raw in keywords {
            let keyword = raw.trim();
            if keyword.is_empty() {
                return Err(EngineError::InvalidRequest(
                    "keywords must not be blank".to_string(),
                ));
            }
            if seen.insert(keyword.to_lowercase()) {
                normalized.push(keyword.to_string());
            }
        }

        if normalized.is_empty() {
            return Err(EngineError::InvalidRequest(
                "at least one keyword is required".to_string(),
            ));
        }
        if normalized.len() > self.config.max_keywords {
            return Err(EngineError::InvalidRequest(format!(
                "at most {} keywords per request, got {}",
                self.config.max_keywords,
                normalized.len()
            )));
        }
        Ok(normalized)
    }

    fn clamp_limit(&self, limit: usize) -> usize {
        limit.clamp(1, self.config.max_video_limit.max(1))
    }

    /// Run the analysis pipeline under `catch_unwind` so a bug in one
    /// keyword's batch cannot take down its siblings.
    fn build_analysis(
        &self,
        keyword: &str,
        videos: Vec<RawVideo>,
        now: DateTime<Utc>,
    ) -> Result<KeywordAnalysis, EngineError> {
        let exclusions = &*self.exclusions;
        catch_unwind(AssertUnwindSafe(|| {
            build_keyword_analysis(keyword, videos, exclusions, now)
        }))
        .map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            EngineError::AnalysisPanicked(message)
        })
    }
}

impl<V, S, N> TrendEngine<V, S, N>
where
    V: VideoSource + Sync,
    S: AnalysisStore + Sync,
    N: NarrativeInsight + Sync,
{
    /// Analyze up to `max_keywords` keywords concurrently.
    ///
    /// Returns one entry per distinct keyword, keyed by its trimmed spelling.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRequest`] when the keyword list is
    /// empty, contains a blank keyword, or exceeds the cap. Per-keyword
    /// failures are reported inside the map instead.
    pub async fn analyze(
        &self,
        keywords: &[String],
        limit: usize,
        force_refresh: bool,
    ) -> Result<BTreeMap<String, KeywordOutcome>, EngineError> {
        self.analyze_at(keywords, limit, force_refresh, Utc::now())
            .await
    }

    /// [`analyze`](Self::analyze) with an explicit clock.
    ///
    /// # Errors
    ///
    /// Same as [`analyze`](Self::analyze).
    pub async fn analyze_at(
        &self,
        keywords: &[String],
        limit: usize,
        force_refresh: bool,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<String, KeywordOutcome>, EngineError> {
        let keywords = self.normalize_keywords(keywords)?;
        let limit = self.clamp_limit(limit);
        let concurrency = keywords.len();

        tracing::info!(
            keywords = keywords.len(),
            limit,
            force_refresh,
            "starting trend analysis batch"
        );

        let outcomes: Vec<(String, KeywordOutcome)> = stream::iter(keywords)
            .map(|keyword| async move {
                let outcome = self
                    .analyze_keyword(&keyword, limit, force_refresh, now)
                    .await;
                (keyword, outcome)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        Ok(outcomes.into_iter().collect())
    }

    /// Most recent daily snapshots for a keyword, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidRequest`] for a blank keyword and
    /// [`EngineError::Store`] when the store cannot be read.
    pub async fn history(
        &self,
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<DailySnapshot>, EngineError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(EngineError::InvalidRequest(
                "keyword must not be blank".to_string(),
            ));
        }
        let key = self.cache_key(keyword);
        Ok(self.store.list_snapshots(&key, limit.max(1)).await?)
    }

    async fn analyze_keyword(
        &self,
        keyword: &str,
        limit: usize,
        force_refresh: bool,
        now: DateTime<Utc>,
    ) -> KeywordOutcome {
        let key = self.cache_key(keyword);
        let cached = self.load_cached(&key).await;

        if !force_refresh {
            if let Some((analyzed_at, analysis)) = &cached {
                if is_fresh(*analyzed_at, now, self.config.cache_ttl) {
                    tracing::info!(
                        keyword,
                        total_videos = analysis.total_videos,
                        "serving cached analysis"
                    );
                    return analyzed(respelled(analysis.clone(), keyword), Provenance::Cached);
                }
            }
        }

        let err = match self.refresh(keyword, &key, limit, now).await {
            Ok(analysis) => {
                tracing::info!(
                    keyword,
                    total_videos = analysis.total_videos,
                    "fresh analysis complete"
                );
                return analyzed(analysis, Provenance::Fresh);
            }
            Err(err) => err,
        };

        if let Some((analyzed_at, analysis)) = cached {
            tracing::warn!(
                keyword,
                error = %err,
                analyzed_at = %analyzed_at,
                "refresh failed, serving stale analysis"
            );
            analyzed(respelled(analysis, keyword), Provenance::Stale)
        } else {
            tracing::error!(keyword, error = %err, "analysis failed with no cached fallback");
            KeywordOutcome::Failed(KeywordError::new(keyword, err.to_string()))
        }
    }

    /// Load and decode the stored analysis. Read and decode failures are
    /// logged and treated as a miss.
    async fn load_cached(&self, key: &CacheKey) -> Option<(DateTime<Utc>, KeywordAnalysis)> {
        let record = match self.store.load(key).await {
            Ok(record) => record?,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache lookup failed, treating as miss");
                return None;
            }
        };

        match restore_analysis(&record) {
            Ok(analysis) => Some((record.analyzed_at, analysis)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cached payload undecodable");
                None
            }
        }
    }

    async fn refresh(
        &self,
        keyword: &str,
        key: &CacheKey,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<KeywordAnalysis, EngineError> {
        let outcome = self
            .source
            .fetch(keyword, limit)
            .await
            .map_err(|e| EngineError::Fetch(Box::new(e)))?;

        if !outcome.success {
            return Err(EngineError::FetchUnsuccessful(
                outcome
                    .error
                    .unwrap_or_else(|| "video source returned no details".to_string()),
            ));
        }
        if outcome.videos.is_empty() {
            return Err(EngineError::NoVideos);
        }

        let videos: Vec<RawVideo> = outcome
            .videos
            .into_iter()
            .map(|mut video| {
                video.thumbnail = None;
                video
            })
            .collect();
        tracing::debug!(keyword, fetched = videos.len(), "videos fetched");

        let mut analysis = self.build_analysis(keyword, videos, now)?;
        analysis.narrative = self.enrich(keyword, &analysis).await;
        self.persist(key, &analysis).await;
        Ok(analysis)
    }

    async fn enrich(&self, keyword: &str, analysis: &KeywordAnalysis) -> Option<NarrativeInsights> {
        let summary = TrendSummary::from_analysis(analysis);
        match self.narrative.summarize(keyword, &summary).await {
            Ok(insights) => insights,
            Err(e) => {
                tracing::warn!(keyword, error = %e, "narrative enrichment failed");
                None
            }
        }
    }

    /// Best-effort writes of the cache record and the daily snapshot.
    async fn persist(&self, key: &CacheKey, analysis: &KeywordAnalysis) {
        match cache_record(key, analysis, self.config.cache_ttl) {
            Ok(record) => {
                if let Err(e) = self.store.save(&record).await {
                    tracing::warn!(key = %key, error = %e, "failed to cache analysis");
                }
            }
            Err(e) => tracing::warn!(key = %key, error = %e, "failed to encode analysis for cache"),
        }

        let snapshot = daily_snapshot(key, analysis);
        if let Err(e) = self.store.upsert_snapshot(&snapshot).await {
            tracing::warn!(
                key = %key,
                date = %snapshot.snapshot_date,
                error = %e,
                "failed to upsert daily snapshot"
            );
        }
    }
}

fn analyzed(analysis: KeywordAnalysis, provenance: Provenance) -> KeywordOutcome {
    KeywordOutcome::Analyzed {
        analysis: Box::new(analysis),
        provenance,
    }
}

/// Report a stored analysis under the spelling of the current request.
fn respelled(mut analysis: KeywordAnalysis, keyword: &str) -> KeywordAnalysis {
    keyword.clone_into(&mut analysis.keyword);
    analysis
}
