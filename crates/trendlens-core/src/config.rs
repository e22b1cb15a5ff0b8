use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("TRENDLENS_ENV", "development"));
    let log_level = or_default("TRENDLENS_LOG_LEVEL", "info");
    let database_url = optional("DATABASE_URL");

    let db_max_connections = parse_u32("TRENDLENS_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("TRENDLENS_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("TRENDLENS_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let platform = or_default("TRENDLENS_PLATFORM", "tiktok").to_lowercase();
    let cache_ttl_hours = parse_u32("TRENDLENS_CACHE_TTL_HOURS", "24")?;
    if cache_ttl_hours == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "TRENDLENS_CACHE_TTL_HOURS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let max_keywords = parse_usize("TRENDLENS_MAX_KEYWORDS", "3")?.max(1);
    let max_video_limit = parse_usize("TRENDLENS_MAX_VIDEO_LIMIT", "100")?.max(1);
    let default_video_limit =
        parse_usize("TRENDLENS_DEFAULT_VIDEO_LIMIT", "30")?.clamp(1, max_video_limit);

    let exclusions_path = optional("TRENDLENS_EXCLUSIONS_PATH").map(PathBuf::from);
    let video_source_url = optional("TRENDLENS_VIDEO_SOURCE_URL");
    let narrative_url = optional("TRENDLENS_NARRATIVE_URL");

    let http_timeout_secs = parse_u64("TRENDLENS_HTTP_TIMEOUT_SECS", "30")?;
    let http_max_retries = parse_u32("TRENDLENS_HTTP_MAX_RETRIES", "3")?;
    let http_retry_backoff_base_ms = parse_u64("TRENDLENS_HTTP_RETRY_BACKOFF_BASE_MS", "500")?;
    let store_max_retries = parse_u32("TRENDLENS_STORE_MAX_RETRIES", "2")?;
    let store_retry_backoff_base_ms = parse_u64("TRENDLENS_STORE_RETRY_BACKOFF_BASE_MS", "200")?;

    Ok(AppConfig {
        env,
        log_level,
        database_url,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        platform,
        cache_ttl_hours,
        max_keywords,
        max_video_limit,
        default_video_limit,
        exclusions_path,
        video_source_url,
        narrative_url,
        http_timeout_secs,
        http_max_retries,
        http_retry_backoff_base_ms,
        store_max_retries,
        store_retry_backoff_base_ms,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s.trim().to_lowercase().as_str() {
        "production" | "prod" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
