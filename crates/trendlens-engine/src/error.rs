use thiserror::Error;
use trendlens_core::StoreError;

/// Boxed collaborator error, so the engine stays agnostic of adapter types.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The batch request itself was malformed; nothing was attempted.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("video fetch failed: {0}")]
    Fetch(#[source] BoxError),

    /// The source answered but reported `success = false`.
    #[error("video source reported failure: {0}")]
    FetchUnsuccessful(String),

    #[error("no videos found for keyword")]
    NoVideos,

    #[error("analysis panicked: {0}")]
    AnalysisPanicked(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
