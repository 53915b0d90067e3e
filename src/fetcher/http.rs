//! HTTP client for the API-Sports football API
//!
//! Thin wrapper around a shared `reqwest::Client` that attaches the API key
//! header, retries transient transport failures with exponential backoff, and
//! decodes the upstream response envelope into [`PagedResponse`] after
//! classifying its error payload.

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::fetcher::{check_api_errors, ApiEnvelope, FetcherError, FetcherResult, PagedResponse};
use crate::populate::config::{calculate_backoff, MAX_RETRIES};

/// HTTP connect timeout (seconds)
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// HTTP request timeout (seconds)
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for all upstream API interactions
pub struct FootballHttpClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FootballHttpClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - API base URL (e.g. "<https://v3.football.api-sports.io>")
    /// * `api_key` - API-Sports key, sent as `x-apisports-key`
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> FetcherResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetcherError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Fetch one page of a paginated resource.
    ///
    /// Classifies the upstream error payload before returning: a `rateLimit`
    /// or `requests` error surfaces as [`FetcherError::RateLimitExceeded`],
    /// everything else as a fatal error.
    pub async fn get_paged<T>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> FetcherResult<PagedResponse<T>>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        debug!(%url, params = params.len(), "requesting upstream page");

        let envelope: ApiEnvelope<T> = self.request_with_retry(&url, params).await?;
        check_api_errors(&envelope.errors)?;

        Ok(PagedResponse {
            response: envelope.response,
            paging: envelope.paging,
            results: envelope.results,
        })
    }

    /// Execute the request, retrying transient failures.
    ///
    /// Retries network errors and 5xx responses with exponential backoff.
    /// HTTP 429 maps straight to a rate-limit error: the run suspends rather
    /// than burning retries against a closed window. Other 4xx are fatal.
    async fn request_with_retry<T>(&self, url: &str, params: &[(&str, String)]) -> FetcherResult<T>
    where
        T: DeserializeOwned,
    {
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            let response = match self
                .client
                .get(url)
                .header("x-apisports-key", &self.api_key)
                .query(params)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    warn!(
                        attempt = attempt + 1,
                        max = MAX_RETRIES + 1,
                        error = %e,
                        "network error"
                    );
                    last_error = Some(FetcherError::Network(e.to_string()));
                    if attempt < MAX_RETRIES {
                        let backoff = calculate_backoff(attempt);
                        debug!(?backoff, "retrying");
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    break;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 {
                return Err(FetcherError::RateLimitExceeded(format!(
                    "HTTP 429 from {url}"
                )));
            }

            if status.is_server_error() {
                warn!(
                    attempt = attempt + 1,
                    max = MAX_RETRIES + 1,
                    %status,
                    "server error"
                );
                last_error = Some(FetcherError::Http(format!("server error: {status}")));
                if attempt < MAX_RETRIES {
                    let backoff = calculate_backoff(attempt);
                    debug!(?backoff, "retrying");
                    tokio::time::sleep(backoff).await;
                    continue;
                }
                break;
            }

            if status.is_client_error() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "unknown error".to_string());
                return Err(FetcherError::Http(format!("client error {status}: {body}")));
            }

            return match response.json::<T>().await {
                Ok(data) => {
                    debug!(attempt = attempt + 1, "request succeeded");
                    Ok(data)
                }
                Err(e) => Err(FetcherError::Parse(format!(
                    "failed to deserialize response: {e}"
                ))),
            };
        }

        Err(last_error.unwrap_or_else(|| FetcherError::Network("all retries exhausted".to_string())))
    }
}
