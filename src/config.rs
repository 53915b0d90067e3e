//! Process configuration
//!
//! All environment access happens here, once, at startup. Core logic receives
//! the resulting [`AppConfig`] (or pieces of it) by value and never reads
//! environment state directly.

use std::path::PathBuf;

/// Default upstream API base URL
pub const DEFAULT_BASE_URL: &str = "https://v3.football.api-sports.io";

/// Default league to populate (UEFA Champions League)
pub const DEFAULT_LEAGUE_ID: u32 = 2;

/// Default directory for durable state (stores and job ledger)
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Startup configuration, populated from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// API-Sports key, sent as the `x-apisports-key` header
    pub api_key: String,
    /// Upstream API base URL
    pub base_url: String,
    /// Directory holding all durable state
    pub data_dir: PathBuf,
    /// League whose teams are populated
    pub league_id: u32,
}

impl AppConfig {
    /// Build the configuration from environment variables.
    ///
    /// `APISPORTS_KEY` is required. `FOOTBALL_API_BASE_URL`, `DATA_DIR` and
    /// `LEAGUE_ID` fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = require_env("APISPORTS_KEY")?;
        let base_url =
            std::env::var("FOOTBALL_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        let league_id = match std::env::var("LEAGUE_ID") {
            Ok(raw) => raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
                key: "LEAGUE_ID".to_string(),
                reason: e.to_string(),
            })?,
            Err(_) => DEFAULT_LEAGUE_ID,
        };

        Ok(Self {
            api_key,
            base_url,
            data_dir,
            league_id,
        })
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::Missing(key.to_string()))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("missing required environment variable: {0}")]
    Missing(String),

    /// An environment variable has an unusable value
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Variable name
        key: String,
        /// Why the value was rejected
        reason: String,
    },
}
