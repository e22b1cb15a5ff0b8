//! Shared HTTP plumbing for the collaborator adapters.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use trendlens_core::AppConfig;

use crate::error::ClientError;
use crate::retry::retry_with_backoff;

const USER_AGENT: &str = concat!("trendlens/", env!("CARGO_PKG_VERSION"));

/// Timeout and retry settings shared by every adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            backoff_base_ms: 500,
        }
    }
}

impl HttpSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.http_timeout_secs,
            max_retries: config.http_max_retries,
            backoff_base_ms: config.http_retry_backoff_base_ms,
        }
    }
}

/// JSON-over-HTTP client rooted at a base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    settings: HttpSettings,
}

impl ApiClient {
    /// Build a client for `base_url`.
    ///
    /// A trailing slash is added when missing so relative endpoints extend the
    /// base path instead of replacing its last segment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if `base_url` does not parse, or
    /// [`ClientError::Http`] if the underlying client cannot be built.
    pub fn new(base_url: &str, settings: HttpSettings) -> Result<Self, ClientError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_owned()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url,
            settings,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn settings(&self) -> HttpSettings {
        self.settings
    }

    /// Resolve `path` against the base URL and append `query`.
    pub(crate) fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ClientError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// GET `url` and decode the body as JSON, retrying transient failures.
    pub(crate) async fn get_json(&self, url: &Url) -> Result<Value, ClientError> {
        retry_with_backoff(
            url.path(),
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || self.get_once(url),
        )
        .await
    }

    /// POST `body` as JSON to `url`, retrying transient failures.
    ///
    /// `204 No Content`, an empty body, and a literal `null` all yield `None`.
    pub(crate) async fn post_json<B>(
        &self,
        url: &Url,
        body: &B,
    ) -> Result<Option<Value>, ClientError>
    where
        B: Serialize + Sync + ?Sized,
    {
        retry_with_backoff(
            url.path(),
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || self.post_once(url, body),
        )
        .await
    }

    async fn get_once(&self, url: &Url) -> Result<Value, ClientError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;
        let text = response.text().await?;
        decode(url, &text)
    }

    async fn post_once<B>(&self, url: &Url, body: &B) -> Result<Option<Value>, ClientError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        match decode(url, &text)? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }
}

fn decode(url: &Url, text: &str) -> Result<Value, ClientError> {
    serde_json::from_str(text).map_err(|source| ClientError::Deserialize {
        context: url.path().to_owned(),
        source,
    })
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
