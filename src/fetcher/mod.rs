//! Upstream API access
//!
//! The single most important contract in this module is error classification:
//! every retry/resume decision downstream hinges on distinguishing "rate
//! limited, can resume later" from "broken, must stop". The upstream reports
//! errors inside an HTTP 200 payload, either as a list of strings or as a
//! string-keyed map; both shapes decode into [`ApiErrors`] and classify
//! through [`check_api_errors`].

use serde::Deserialize;
use std::collections::BTreeMap;

pub mod http;
pub mod players;
pub mod teams;

pub use http::FootballHttpClient;
pub use players::HttpPlayerApi;
pub use teams::HttpTeamApi;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// HTTP-level error (non-retryable status)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Network error (timeout, connection refused)
    #[error("network error: {0}")]
    Network(String),

    /// Response parse error; malformed payloads are fatal
    #[error("parse error: {0}")]
    Parse(String),

    /// Error reported by the upstream API payload
    #[error("API error: {0}")]
    Api(String),

    /// Upstream rate limit reached; recoverable by suspending the run
    #[error("rate limit exceeded: {0}")]
    RateLimitExceeded(String),
}

impl FetcherError {
    /// Whether this error suspends the run instead of failing it
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, FetcherError::RateLimitExceeded(_))
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Pagination cursor returned with every upstream response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Paging {
    /// Page just returned, 1-based
    pub current: u32,
    /// Total number of pages
    pub total: u32,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            current: 1,
            total: 1,
        }
    }
}

/// One successfully fetched page of upstream records
#[derive(Debug, Clone)]
pub struct PagedResponse<T> {
    /// Records in this page
    pub response: Vec<T>,
    /// Pagination cursor
    pub paging: Paging,
    /// Record count reported by the upstream
    pub results: u32,
}

/// Error payload shapes the upstream produces.
///
/// Decoded explicitly instead of inspected at runtime: a successful response
/// carries an empty list (or no errors at all), a failed one carries either a
/// list of messages or a map of error-kind to message.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiErrors {
    /// Plain list of error messages
    List(Vec<String>),
    /// Error-kind to message map; `rateLimit` and `requests` keys mark
    /// throttling
    Map(BTreeMap<String, String>),
}

impl Default for ApiErrors {
    fn default() -> Self {
        ApiErrors::List(Vec::new())
    }
}

/// Raw envelope every upstream endpoint responds with
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    #[serde(default)]
    pub errors: ApiErrors,
    #[serde(default)]
    pub results: u32,
    #[serde(default)]
    pub paging: Paging,
    #[serde(default = "Vec::new")]
    pub response: Vec<T>,
}

/// Classify an upstream error payload.
///
/// - non-empty list of strings: generic fetch failure, fatal
/// - map with a `rateLimit` or `requests` key: rate limit, recoverable
/// - any other non-empty map: generic fetch failure, fatal
/// - empty list or map: success
pub fn check_api_errors(errors: &ApiErrors) -> FetcherResult<()> {
    match errors {
        ApiErrors::List(messages) => {
            if messages.is_empty() {
                Ok(())
            } else {
                Err(FetcherError::Api(format!(
                    "error when fetching data: {}",
                    messages.join(", ")
                )))
            }
        }
        ApiErrors::Map(map) => {
            if map.is_empty() {
                return Ok(());
            }
            if let Some(message) = map.get("rateLimit").or_else(|| map.get("requests")) {
                return Err(FetcherError::RateLimitExceeded(message.clone()));
            }
            let detail: String = map
                .iter()
                .map(|(key, value)| format!("- {key}: {value}\n"))
                .collect();
            Err(FetcherError::Api(format!(
                "error when fetching data:\n{detail}"
            )))
        }
    }
}
