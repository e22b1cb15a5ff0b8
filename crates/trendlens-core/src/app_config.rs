use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub platform: String,
    pub cache_ttl_hours: u32,
    pub max_keywords: usize,
    pub max_video_limit: usize,
    pub default_video_limit: usize,
    pub exclusions_path: Option<PathBuf>,
    pub video_source_url: Option<String>,
    pub narrative_url: Option<String>,
    pub http_timeout_secs: u64,
    pub http_max_retries: u32,
    pub http_retry_backoff_base_ms: u64,
    pub store_max_retries: u32,
    pub store_retry_backoff_base_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("platform", &self.platform)
            .field("cache_ttl_hours", &self.cache_ttl_hours)
            .field("max_keywords", &self.max_keywords)
            .field("max_video_limit", &self.max_video_limit)
            .field("default_video_limit", &self.default_video_limit)
            .field("exclusions_path", &self.exclusions_path)
            .field("video_source_url", &self.video_source_url)
            .field("narrative_url", &self.narrative_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("http_max_retries", &self.http_max_retries)
            .field(
                "http_retry_backoff_base_ms",
                &self.http_retry_backoff_base_ms,
            )
            .field("store_max_retries", &self.store_max_retries)
            .field(
                "store_retry_backoff_base_ms",
                &self.store_retry_backoff_base_ms,
            )
            .finish()
    }
}
