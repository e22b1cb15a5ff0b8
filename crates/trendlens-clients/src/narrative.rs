//! HTTP [`NarrativeInsight`] backed by a text-generation service.

use serde::Serialize;
use trendlens_core::{NarrativeInsight, NarrativeInsights, TrendSummary};

use crate::client::{ApiClient, HttpSettings};
use crate::error::ClientError;

const INSIGHTS_PATH: &str = "insights";

#[derive(Debug, Serialize)]
struct InsightRequest<'a> {
    keyword: &'a str,
    summary: &'a TrendSummary,
}

/// Requests insights with `POST {base}/insights`.
///
/// A `204`, an empty body, or `null` means the service had nothing to add.
#[derive(Debug, Clone)]
pub struct HttpNarrativeClient {
    api: ApiClient,
}

impl HttpNarrativeClient {
    /// # Errors
    ///
    /// Returns [`ClientError`] if the base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, settings: HttpSettings) -> Result<Self, ClientError> {
        Ok(Self {
            api: ApiClient::new(base_url, settings)?,
        })
    }
}

impl NarrativeInsight for HttpNarrativeClient {
    type Error = ClientError;

    async fn summarize(
        &self,
        keyword: &str,
        summary: &TrendSummary,
    ) -> Result<Option<NarrativeInsights>, ClientError> {
        let url = self.api.endpoint(INSIGHTS_PATH, &[])?;
        let request = InsightRequest { keyword, summary };
        let Some(body) = self.api.post_json(&url, &request).await? else {
            return Ok(None);
        };
        serde_json::from_value(body)
            .map(Some)
            .map_err(|source| ClientError::Deserialize {
                context: format!("{INSIGHTS_PATH}(keyword={keyword})"),
                source,
            })
    }
}
