//! ActiveData query client.

use crate::error::{Error, Result};
use adr_core::config::{AdrConfig, ClientConfig};
use adr_core::query::{Query, QueryClient, QueryResult};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::time::Duration;

const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);
const MAX_ERROR_TEXT: usize = 300;

/// Sends recipe queries to an ActiveData endpoint over HTTP.
///
/// Each query body is POSTed as JSON. Transient failures (timeouts, connect
/// errors, 429 and 5xx responses) are retried with exponential backoff up
/// to `max_retries` times.
#[derive(Debug, Clone)]
pub struct ActiveDataClient {
    http: reqwest::Client,
    url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl ActiveDataClient {
    /// Creates a client for `url` with the given settings.
    pub fn new(url: impl Into<String>, settings: &ClientConfig) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(Error::Config("query URL is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            url,
            max_retries: settings.max_retries,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Creates a client from the `url` and `[client]` sections of a config.
    pub fn from_config(config: &AdrConfig) -> Result<Self> {
        Self::new(config.url.clone(), &config.client)
    }

    /// Sets the initial backoff delay between retries.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// The endpoint queries are sent to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Runs a query, retrying transient failures.
    pub async fn execute(&self, query: &Query) -> Result<QueryResult> {
        tracing::debug!(query = %query.name, url = %self.url, "Sending query");

        let attempt = || self.send_once(query);
        let result = attempt
            .retry(self.backoff())
            .sleep(tokio::time::sleep)
            .when(Error::is_retryable)
            .notify(|err: &Error, delay: Duration| {
                tracing::warn!(
                    query = %query.name,
                    error = %err,
                    retry_in_ms = delay.as_millis() as u64,
                    "Query failed, retrying"
                );
            })
            .await;

        match &result {
            Ok(_) => tracing::debug!(query = %query.name, "Query succeeded"),
            Err(e) => tracing::error!(query = %query.name, error = %e, "Query failed"),
        }
        result
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.retry_delay)
            .with_max_delay(MAX_RETRY_DELAY)
            .with_max_times(self.max_retries as usize)
    }

    async fn send_once(&self, query: &Query) -> Result<QueryResult> {
        let response = self.http.post(&self.url).json(&query.body).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                message: backend_error_text(&body, status.canonical_reason()),
            });
        }

        serde_json::from_str(&body).map_err(Error::Decode)
    }
}

#[async_trait]
impl QueryClient for ActiveDataClient {
    async fn run(&self, query: &Query) -> adr_core::Result<QueryResult> {
        Ok(self.execute(query).await?)
    }
}

/// Extracts a readable message from an error response body.
///
/// ActiveData reports failures as JSON with a `template` field; other
/// services use `error` or `message`. Anything else is returned as trimmed
/// text.
fn backend_error_text(body: &str, reason: Option<&str>) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["template", "error", "message"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }

    let text = body.trim();
    if text.is_empty() {
        return reason.unwrap_or("no response body").to_string();
    }
    if text.chars().count() > MAX_ERROR_TEXT {
        let truncated: String = text.chars().take(MAX_ERROR_TEXT).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}
