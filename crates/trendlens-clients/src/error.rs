use thiserror::Error;

/// Errors returned by the HTTP collaborator adapters.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or TLS failure, timeout, or non-2xx status from the underlying
    /// HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL could not be parsed or joined.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
