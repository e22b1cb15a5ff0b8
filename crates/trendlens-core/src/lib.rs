//! Domain types, collaborator ports, and configuration for trendlens.

pub mod analysis;
pub mod app_config;
pub mod config;
pub mod error;
pub mod exclusions;
pub mod ports;
pub mod video;

pub use analysis::{
    AggregateStats, ContentPatterns, CreatorInsights, CreatorStats, EmojiCount,
    EngagementBenchmarks, HashtagCombo, HashtagInsight, HashtagInsights, KeywordAnalysis,
    KeywordError, KeywordOutcome, NarrativeInsights, PatternMatch, PerformanceTiers, Provenance,
    Recommendations, SummaryHashtag, TrendSummary,
};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, StoreError};
pub use exclusions::{
    load_exclusions, normalize_hashtag, parse_exclusions, ExclusionList, HashtagExclusions,
    DEFAULT_EXCLUDED_HASHTAGS,
};
pub use ports::{
    AnalysisStore, CacheKey, DailySnapshot, FetchOutcome, NarrativeInsight, NoNarrative,
    StoredAnalysis, VideoSource,
};
pub use video::{AnalyzedVideo, Author, RawVideo, VideoStats, MISSING_STAT_DEFAULT};
