//! HTTP [`VideoSource`] backed by a short-form video search service.

use trendlens_core::{FetchOutcome, VideoSource};

use crate::client::{ApiClient, HttpSettings};
use crate::error::ClientError;

const SEARCH_PATH: &str = "videos/search";

/// Fetches videos with `GET {base}/videos/search?keyword=..&limit=..`.
///
/// The service answers with the [`FetchOutcome`] envelope. An envelope with
/// `success: false` is returned as-is; the engine decides what it means.
#[derive(Debug, Clone)]
pub struct HttpVideoSource {
    api: ApiClient,
}

impl HttpVideoSource {
    /// # Errors
    ///
    /// Returns [`ClientError`] if the base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, settings: HttpSettings) -> Result<Self, ClientError> {
        Ok(Self {
            api: ApiClient::new(base_url, settings)?,
        })
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

impl VideoSource for HttpVideoSource {
    type Error = ClientError;

    async fn fetch(&self, keyword: &str, limit: usize) -> Result<FetchOutcome, ClientError> {
        let limit = limit.to_string();
        let url = self
            .api
            .endpoint(SEARCH_PATH, &[("keyword", keyword), ("limit", &limit)])?;
        let body = self.api.get_json(&url).await?;
        let outcome: FetchOutcome =
            serde_json::from_value(body).map_err(|source| ClientError::Deserialize {
                context: format!("{SEARCH_PATH}(keyword={keyword})"),
                source,
            })?;
        tracing::debug!(
            keyword,
            success = outcome.success,
            videos = outcome.videos.len(),
            "video source responded"
        );
        Ok(outcome)
    }
}
