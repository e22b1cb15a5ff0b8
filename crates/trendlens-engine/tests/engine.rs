//! End-to-end engine behavior with scripted collaborators and the in-memory
//! store.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use trendlens_core::{
    AnalysisStore, Author, CacheKey, DailySnapshot, FetchOutcome, KeywordOutcome,
    NarrativeInsight, NarrativeInsights, Provenance, RawVideo, StoreError, StoredAnalysis,
    TrendSummary, VideoSource, VideoStats,
};
use trendlens_engine::{
    EngineConfig, EngineError, InMemoryStore, RetryPolicy, RetryingStore, TrendEngine,
};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Script {
    Videos(Vec<RawVideo>),
    Unsuccessful(&'static str),
    Error(&'static str),
}

#[derive(Default)]
struct SourceState {
    scripts: Mutex<HashMap<String, Script>>,
    calls: AtomicUsize,
    last_limit: AtomicUsize,
}

#[derive(Clone, Default)]
struct ScriptedSource {
    state: Arc<SourceState>,
}

impl ScriptedSource {
    fn script(&self, keyword: &str, script: Script) {
        self.state
            .scripts
            .lock()
            .unwrap()
            .insert(keyword.to_string(), script);
    }

    fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    fn last_limit(&self) -> usize {
        self.state.last_limit.load(Ordering::SeqCst)
    }
}

impl VideoSource for ScriptedSource {
    type Error = io::Error;

    async fn fetch(&self, keyword: &str, limit: usize) -> Result<FetchOutcome, io::Error> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        self.state.last_limit.store(limit, Ordering::SeqCst);
        let script = self.state.scripts.lock().unwrap().get(keyword).cloned();
        match script {
            Some(Script::Videos(videos)) => Ok(FetchOutcome::ok(videos)),
            Some(Script::Unsuccessful(message)) => Ok(FetchOutcome::failed(message)),
            Some(Script::Error(message)) => Err(io::Error::other(message)),
            None => Ok(FetchOutcome::ok(Vec::new())),
        }
    }
}

struct FailingNarrative;

impl NarrativeInsight for FailingNarrative {
    type Error = io::Error;

    async fn summarize(
        &self,
        _keyword: &str,
        _summary: &TrendSummary,
    ) -> Result<Option<NarrativeInsights>, io::Error> {
        Err(io::Error::other("model overloaded"))
    }
}

struct EchoNarrative;

impl NarrativeInsight for EchoNarrative {
    type Error = io::Error;

    async fn summarize(
        &self,
        keyword: &str,
        summary: &TrendSummary,
    ) -> Result<Option<NarrativeInsights>, io::Error> {
        Ok(Some(NarrativeInsights {
            summary: format!("{keyword}: {} videos", summary.total_videos),
            ..NarrativeInsights::default()
        }))
    }
}

/// Store whose writes fail `write_failures` times with the given error kind.
struct FlakyStore {
    inner: InMemoryStore,
    write_failures: AtomicUsize,
    transient: bool,
}

impl FlakyStore {
    fn new(write_failures: usize, transient: bool) -> Self {
        Self {
            inner: InMemoryStore::new(),
            write_failures: AtomicUsize::new(write_failures),
            transient,
        }
    }

    fn maybe_fail(&self) -> Result<(), StoreError> {
        let remaining = self.write_failures.load(Ordering::SeqCst);
        if remaining == 0 {
            return Ok(());
        }
        self.write_failures.store(remaining - 1, Ordering::SeqCst);
        if self.transient {
            Err(StoreError::Unavailable("connection reset".to_string()))
        } else {
            Err(StoreError::Backend("disk full".to_string()))
        }
    }
}

impl AnalysisStore for FlakyStore {
    async fn load(&self, key: &CacheKey) -> Result<Option<StoredAnalysis>, StoreError> {
        self.inner.load(key).await
    }

    async fn save(&self, record: &StoredAnalysis) -> Result<(), StoreError> {
        self.maybe_fail()?;
        self.inner.save(record).await
    }

    async fn upsert_snapshot(&self, snapshot: &DailySnapshot) -> Result<(), StoreError> {
        self.maybe_fail()?;
        self.inner.upsert_snapshot(snapshot).await
    }

    async fn list_snapshots(
        &self,
        key: &CacheKey,
        limit: usize,
    ) -> Result<Vec<DailySnapshot>, StoreError> {
        self.inner.list_snapshots(key, limit).await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap()
}

fn videos(prefix: &str, n: u64, tags: &[&str]) -> Vec<RawVideo> {
    (1..=n)
        .map(|i| RawVideo {
            id: format!("{prefix}-{i}"),
            description: format!("{prefix} clip {i} follow for more"),
            author: Author {
                id: format!("creator-{}", i % 3),
                name: format!("Creator {}", i % 3),
            },
            stats: VideoStats {
                play_count: 1_000,
                like_count: i * 10,
                comment_count: i,
                share_count: 1,
            },
            hashtags: tags.iter().map(ToString::to_string).collect(),
            thumbnail: Some(format!("https://cdn.example.com/{prefix}-{i}.jpg")),
        })
        .collect()
}

fn keywords(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

fn engine(source: &ScriptedSource) -> TrendEngine<ScriptedSource, InMemoryStore> {
    TrendEngine::new(source.clone(), InMemoryStore::new(), EngineConfig::default())
}

fn single(
    map: &std::collections::BTreeMap<String, KeywordOutcome>,
    keyword: &str,
) -> KeywordOutcome {
    map.get(keyword).cloned().expect("keyword present in result")
}

// ---------------------------------------------------------------------------
// Cache lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_then_cached_within_ttl_then_refetched_after() {
    let source = ScriptedSource::default();
    source.script("x", Script::Videos(videos("x", 10, &["kpop", "dance"])));
    let engine = engine(&source);

    let first = engine.analyze_at(&keywords(&["x"]), 30, false, t0()).await.unwrap();
    assert_eq!(single(&first, "x").provenance(), Some(Provenance::Fresh));
    assert_eq!(source.calls(), 1);

    let at_23h = t0() + Duration::hours(23);
    let second = engine.analyze_at(&keywords(&["x"]), 30, false, at_23h).await.unwrap();
    let cached = single(&second, "x");
    assert_eq!(cached.provenance(), Some(Provenance::Cached));
    assert_eq!(source.calls(), 1, "cache hit must not refetch");
    assert_eq!(
        cached.analysis().unwrap().analyzed_at,
        t0(),
        "cached result keeps its original timestamp"
    );

    let at_25h = t0() + Duration::hours(25);
    let third = engine.analyze_at(&keywords(&["x"]), 30, false, at_25h).await.unwrap();
    let refreshed = single(&third, "x");
    assert_eq!(refreshed.provenance(), Some(Provenance::Fresh));
    assert_eq!(refreshed.analysis().unwrap().analyzed_at, at_25h);
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn force_refresh_bypasses_fresh_cache() {
    let source = ScriptedSource::default();
    source.script("x", Script::Videos(videos("x", 5, &["kpop"])));
    let engine = engine(&source);

    engine.analyze_at(&keywords(&["x"]), 30, false, t0()).await.unwrap();
    let forced = engine
        .analyze_at(&keywords(&["x"]), 30, true, t0() + Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(single(&forced, "x").provenance(), Some(Provenance::Fresh));
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn cached_lookup_ignores_keyword_case() {
    let source = ScriptedSource::default();
    source.script("Kpop", Script::Videos(videos("k", 4, &["kpop"])));
    let engine = engine(&source);

    engine.analyze_at(&keywords(&["Kpop"]), 30, false, t0()).await.unwrap();
    let again = engine
        .analyze_at(&keywords(&["kpop"]), 30, false, t0() + Duration::hours(1))
        .await
        .unwrap();
    let cached = single(&again, "kpop");
    assert_eq!(cached.provenance(), Some(Provenance::Cached));
    assert_eq!(cached.analysis().unwrap().keyword, "kpop");
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn stale_result_reports_requested_spelling() {
    let source = ScriptedSource::default();
    source.script("Kpop", Script::Videos(videos("k", 4, &["kpop"])));
    let engine = engine(&source);
    engine.analyze_at(&keywords(&["Kpop"]), 30, false, t0()).await.unwrap();

    // "KPOP" is unscripted, so the refetch comes back empty.
    let later = engine
        .analyze_at(&keywords(&["KPOP"]), 30, false, t0() + Duration::days(2))
        .await
        .unwrap();
    let stale = single(&later, "KPOP");
    assert_eq!(stale.provenance(), Some(Provenance::Stale));
    assert_eq!(stale.analysis().unwrap().keyword, "KPOP");
}

#[tokio::test]
async fn stale_cache_served_when_refresh_fails() {
    let source = ScriptedSource::default();
    source.script("x", Script::Videos(videos("x", 6, &["kpop"])));
    let engine = engine(&source);
    engine.analyze_at(&keywords(&["x"]), 30, false, t0()).await.unwrap();

    source.script("x", Script::Error("upstream timed out"));
    let later = engine
        .analyze_at(&keywords(&["x"]), 30, false, t0() + Duration::days(3))
        .await
        .unwrap();
    let outcome = single(&later, "x");
    assert_eq!(outcome.provenance(), Some(Provenance::Stale));
    assert_eq!(outcome.analysis().unwrap().total_videos, 6);
    assert_eq!(outcome.analysis().unwrap().analyzed_at, t0());
}

#[tokio::test]
async fn empty_fetch_falls_back_to_stale_cache() {
    let source = ScriptedSource::default();
    source.script("x", Script::Videos(videos("x", 3, &["kpop"])));
    let engine = engine(&source);
    engine.analyze_at(&keywords(&["x"]), 30, false, t0()).await.unwrap();

    source.script("x", Script::Videos(Vec::new()));
    let later = engine
        .analyze_at(&keywords(&["x"]), 30, true, t0() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(single(&later, "x").provenance(), Some(Provenance::Stale));
}

#[tokio::test]
async fn cached_ranks_are_recomputed_on_load() {
    let source = ScriptedSource::default();
    source.script("x", Script::Videos(videos("x", 10, &["kpop"])));
    let engine = engine(&source);
    engine.analyze_at(&keywords(&["x"]), 30, false, t0()).await.unwrap();

    let key = CacheKey::new("tiktok", "x");
    let mut record = engine.store().load(&key).await.unwrap().unwrap();
    let stored = record.payload["allVideos"].as_array_mut().unwrap();
    stored.reverse();
    for video in stored.iter_mut() {
        video["rank"] = serde_json::json!(99);
    }
    engine.store().save(&record).await.unwrap();

    let mut previous: Option<Vec<usize>> = None;
    for _ in 0..2 {
        let map = engine
            .analyze_at(&keywords(&["x"]), 30, false, t0() + Duration::hours(1))
            .await
            .unwrap();
        let analysis = single(&map, "x").analysis().cloned().unwrap();
        let ranks: Vec<usize> = analysis.all_videos.iter().map(|v| v.rank).collect();
        assert_eq!(ranks, (1..=10).collect::<Vec<_>>());
        assert_eq!(analysis.performance_tiers.total(), 10);
        assert_eq!(analysis.performance_tiers.viral[0].video.id, "x-10");
        if let Some(prev) = &previous {
            assert_eq!(prev, &ranks, "rank reassignment is idempotent");
        }
        previous = Some(ranks);
    }
}

#[tokio::test]
async fn undecodable_cache_entry_is_treated_as_miss() {
    let source = ScriptedSource::default();
    source.script("x", Script::Videos(videos("x", 3, &["kpop"])));
    let engine = engine(&source);

    engine
        .store()
        .save(&StoredAnalysis {
            key: CacheKey::new("tiktok", "x"),
            payload: serde_json::json!({"garbage": true}),
            total_videos: 0,
            analyzed_at: t0(),
            expires_at: t0() + Duration::hours(24),
        })
        .await
        .unwrap();

    let map = engine
        .analyze_at(&keywords(&["x"]), 30, false, t0() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(single(&map, "x").provenance(), Some(Provenance::Fresh));
    assert_eq!(source.calls(), 1);
}

// ---------------------------------------------------------------------------
// Failure isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unsuccessful_fetch_without_cache_yields_error_stub() {
    let source = ScriptedSource::default();
    source.script("y", Script::Unsuccessful("rate limited"));
    let engine = engine(&source);

    let map = engine.analyze_at(&keywords(&["y"]), 30, false, t0()).await.unwrap();
    let outcome = single(&map, "y");
    let err = outcome.error().expect("error stub");
    assert_eq!(err.keyword, "y");
    assert_eq!(err.total_videos, 0);
    assert!(err.error.contains("rate limited"), "got {}", err.error);

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["keyword"], "y");
    assert_eq!(json["totalVideos"], 0);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn one_failing_keyword_does_not_affect_siblings() {
    let source = ScriptedSource::default();
    source.script("one", Script::Videos(videos("one", 8, &["a", "b"])));
    source.script("two", Script::Error("connection refused"));
    source.script("three", Script::Videos(videos("three", 5, &["c"])));
    let engine = engine(&source);

    let map = engine
        .analyze_at(&keywords(&["one", "two", "three"]), 30, false, t0())
        .await
        .unwrap();

    assert_eq!(map.len(), 3);
    assert_eq!(single(&map, "one").analysis().unwrap().total_videos, 8);
    assert_eq!(single(&map, "three").analysis().unwrap().total_videos, 5);
    let stub = single(&map, "two");
    assert!(stub.analysis().is_none());
    assert!(stub.error().unwrap().error.contains("connection refused"));
}

#[tokio::test]
async fn empty_result_without_cache_is_an_error_stub() {
    let source = ScriptedSource::default();
    let engine = engine(&source);

    let map = engine.analyze_at(&keywords(&["nothing"]), 30, false, t0()).await.unwrap();
    let err = single(&map, "nothing").error().cloned().unwrap();
    assert_eq!(err.error, EngineError::NoVideos.to_string());
}

#[tokio::test]
async fn panicking_analysis_is_isolated_to_its_keyword() {
    let source = ScriptedSource::default();
    source.script("ok", Script::Videos(videos("ok", 4, &["fine"])));
    source.script("bad", Script::Videos(videos("bad", 4, &["boom"])));
    let engine = engine(&source).with_exclusions(|tag: &str| {
        assert_ne!(tag, "boom", "exclusion predicate exploded");
        false
    });

    let map = engine
        .analyze_at(&keywords(&["ok", "bad"]), 30, false, t0())
        .await
        .unwrap();

    assert!(single(&map, "ok").analysis().is_some());
    let err = single(&map, "bad").error().cloned().unwrap();
    assert!(err.error.contains("panicked"), "got {}", err.error);
}

#[tokio::test]
async fn narrative_failure_is_absorbed() {
    let source = ScriptedSource::default();
    source.script("x", Script::Videos(videos("x", 4, &["kpop"])));
    let engine = engine(&source).with_narrative(FailingNarrative);

    let map = engine.analyze_at(&keywords(&["x"]), 30, false, t0()).await.unwrap();
    let analysis = single(&map, "x").analysis().cloned().unwrap();
    assert!(analysis.narrative.is_none());
    assert_eq!(analysis.total_videos, 4);
}

#[tokio::test]
async fn narrative_insights_are_attached_and_cached() {
    let source = ScriptedSource::default();
    source.script("x", Script::Videos(videos("x", 4, &["kpop"])));
    let engine = engine(&source).with_narrative(EchoNarrative);

    let map = engine.analyze_at(&keywords(&["x"]), 30, false, t0()).await.unwrap();
    let narrative = single(&map, "x").analysis().unwrap().narrative.clone().unwrap();
    assert_eq!(narrative.summary, "x: 4 videos");

    let cached = engine
        .analyze_at(&keywords(&["x"]), 30, false, t0() + Duration::hours(2))
        .await
        .unwrap();
    let outcome = single(&cached, "x");
    assert_eq!(outcome.provenance(), Some(Provenance::Cached));
    assert_eq!(outcome.analysis().unwrap().narrative, Some(narrative));
}

#[tokio::test]
async fn persistence_failure_still_returns_fresh_result() {
    let source = ScriptedSource::default();
    source.script("x", Script::Videos(videos("x", 4, &["kpop"])));
    let engine = TrendEngine::new(
        source.clone(),
        FlakyStore::new(usize::MAX, false),
        EngineConfig::default(),
    );

    let map = engine.analyze_at(&keywords(&["x"]), 30, false, t0()).await.unwrap();
    assert_eq!(single(&map, "x").provenance(), Some(Provenance::Fresh));
    assert_eq!(engine.store().inner.analysis_count(), 0);
    assert_eq!(engine.store().inner.snapshot_count(), 0);
}

#[tokio::test]
async fn retrying_store_rides_out_transient_write_failures() {
    let source = ScriptedSource::default();
    source.script("x", Script::Videos(videos("x", 4, &["kpop"])));
    let store = RetryingStore::new(
        FlakyStore::new(2, true),
        RetryPolicy {
            max_retries: 3,
            backoff_base_ms: 0,
        },
    );
    let engine = TrendEngine::new(source.clone(), store, EngineConfig::default());

    engine.analyze_at(&keywords(&["x"]), 30, false, t0()).await.unwrap();
    assert_eq!(engine.store().inner().inner.analysis_count(), 1);
    assert_eq!(engine.store().inner().inner.snapshot_count(), 1);
}

// ---------------------------------------------------------------------------
// Snapshots and history
// ---------------------------------------------------------------------------

#[tokio::test]
async fn daily_snapshot_upsert_is_idempotent_per_day() {
    let source = ScriptedSource::default();
    source.script("x", Script::Videos(videos("x", 4, &["kpop"])));
    let engine = engine(&source);

    engine.analyze_at(&keywords(&["x"]), 30, true, t0()).await.unwrap();
    engine
        .analyze_at(&keywords(&["x"]), 30, true, t0() + Duration::hours(2))
        .await
        .unwrap();
    assert_eq!(engine.store().snapshot_count(), 1);

    source.script("x", Script::Videos(videos("x", 7, &["kpop"])));
    engine
        .analyze_at(&keywords(&["x"]), 30, true, t0() + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(engine.store().snapshot_count(), 2);

    let history = engine.history("X", 10).await.unwrap();
    let sizes: Vec<usize> = history.iter().map(|s| s.total_videos).collect();
    assert_eq!(sizes, vec![7, 4], "newest first");
    assert_eq!(history[1].captured_at, t0() + Duration::hours(2), "same-day write wins");
}

#[tokio::test]
async fn history_rejects_blank_keyword() {
    let engine = engine(&ScriptedSource::default());
    assert!(matches!(
        engine.history("  ", 5).await,
        Err(EngineError::InvalidRequest(_))
    ));
}

// ---------------------------------------------------------------------------
// Request handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn request_validation() {
    let engine = engine(&ScriptedSource::default());

    for bad in [
        keywords(&[]),
        keywords(&["a", "b", "c", "d"]),
        keywords(&["ok", "   "]),
    ] {
        let result = engine.analyze_at(&bad, 30, false, t0()).await;
        assert!(
            matches!(result, Err(EngineError::InvalidRequest(_))),
            "{bad:?} should be rejected"
        );
    }
}

#[tokio::test]
async fn duplicate_keywords_collapse_to_first_spelling() {
    let source = ScriptedSource::default();
    source.script("Dance", Script::Videos(videos("d", 3, &["dance"])));
    let engine = engine(&source);

    let map = engine
        .analyze_at(&keywords(&[" Dance ", "dance", "DANCE", "Dance"]), 30, false, t0())
        .await
        .unwrap();
    assert_eq!(map.len(), 1);
    assert!(map.contains_key("Dance"));
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn limit_is_clamped_to_configured_range() {
    let source = ScriptedSource::default();
    source.script("x", Script::Videos(videos("x", 2, &["kpop"])));
    let engine = engine(&source);

    engine.analyze_at(&keywords(&["x"]), 500, true, t0()).await.unwrap();
    assert_eq!(source.last_limit(), 100);
    engine.analyze_at(&keywords(&["x"]), 0, true, t0()).await.unwrap();
    assert_eq!(source.last_limit(), 1);
}

#[tokio::test]
async fn thumbnails_are_stripped_before_analysis_and_storage() {
    let source = ScriptedSource::default();
    source.script("x", Script::Videos(videos("x", 3, &["kpop"])));
    let engine = engine(&source);

    let map = engine.analyze_at(&keywords(&["x"]), 30, false, t0()).await.unwrap();
    let analysis = single(&map, "x").analysis().cloned().unwrap();
    assert!(analysis.all_videos.iter().all(|v| v.video.thumbnail.is_none()));

    let record = engine
        .store()
        .load(&CacheKey::new("tiktok", "x"))
        .await
        .unwrap()
        .unwrap();
    assert!(!record.payload.to_string().contains("cdn.example.com"));
    assert_eq!(record.expires_at, t0() + Duration::hours(24));
}
