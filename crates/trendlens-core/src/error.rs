use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read exclusions file {path}: {source}")]
    ExclusionsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse exclusions file: {0}")]
    ExclusionsFileParse(#[source] serde_yaml::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Failure reported by an [`AnalysisStore`](crate::AnalysisStore) back end.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The back end could not be reached or timed out; worth retrying.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The back end rejected the operation; retrying will not help.
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
