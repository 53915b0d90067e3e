//! Command-line interface
//!
//! Two subcommands: `populate` runs one population pass (full refresh or
//! incremental resume), `transform` re-aggregates the raw fetched players.
//! Both read process configuration from the environment and wire the file
//! stores and the HTTP adapters into the job contexts.

use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{AppConfig, ConfigError};
use crate::fetcher::{FetcherError, FootballHttpClient, HttpPlayerApi, HttpTeamApi};
use crate::ledger::JobLedger;
use crate::populate::{
    run_population, run_transform, Mode, PopulateContext, PopulateError, PopulateOptions,
    PopulateOutcome, TransformContext,
};
use crate::store::{OpenPolicy, StoreError};
use crate::Season;

/// Errors surfaced to the CLI entry point
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Process configuration failed
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP client setup failed
    #[error("fetcher error: {0}")]
    Fetcher(#[from] FetcherError),

    /// Durable state setup failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The job itself failed
    #[error("{0}")]
    Populate(#[from] PopulateError),
}

/// Football statistics population pipeline
#[derive(Debug, Parser)]
#[command(name = "football-data-populator")]
#[command(about = "Fetch, store and aggregate football player statistics")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch teams and player statistics for a season
    Populate(PopulateArgs),
    /// Aggregate previously fetched raw players
    Transform(TransformArgs),
}

/// Arguments for the `populate` subcommand
#[derive(Debug, Args)]
pub struct PopulateArgs {
    /// Season year (e.g. 2020)
    #[arg(long)]
    pub season: u16,

    /// Population mode
    #[arg(long, value_enum, default_value_t = Mode::Incremental)]
    pub mode: Mode,

    /// Seconds to pause between teams, to stay under the upstream quota
    #[arg(long)]
    pub throttle: Option<u64>,
}

impl PopulateArgs {
    /// Run one population pass
    pub async fn execute(&self) -> Result<(), CliError> {
        let config = AppConfig::from_env()?;
        let policy = OpenPolicy::default();

        let http = Arc::new(FootballHttpClient::new(&config.base_url, &config.api_key)?);
        let job_api = Arc::new(JobLedger::open(&config.data_dir, &policy)?);
        let team_api = Arc::new(HttpTeamApi::new(
            http.clone(),
            config.data_dir.clone(),
            policy.clone(),
            config.league_id,
        ));
        let player_api = Arc::new(HttpPlayerApi::new(
            http,
            config.data_dir.clone(),
            policy,
        ));

        let ctx = PopulateContext {
            season: Season::new(self.season),
            job_api,
            team_api,
            player_api,
            options: PopulateOptions {
                mode: self.mode,
                throttle: self.throttle,
            },
        };

        match run_population(&ctx).await? {
            PopulateOutcome::Completed => {
                info!(season = self.season, "population completed");
            }
            PopulateOutcome::Suspended { team_id } => {
                warn!(
                    season = self.season,
                    team_id,
                    "population suspended on rate limit, rerun in incremental mode to resume"
                );
            }
        }
        Ok(())
    }
}

/// Arguments for the `transform` subcommand
#[derive(Debug, Args)]
pub struct TransformArgs {
    /// Season year (e.g. 2020)
    #[arg(long)]
    pub season: u16,
}

impl TransformArgs {
    /// Run the transform job
    pub async fn execute(&self) -> Result<(), CliError> {
        let config = AppConfig::from_env()?;
        let policy = OpenPolicy::default();

        let http = Arc::new(FootballHttpClient::new(&config.base_url, &config.api_key)?);
        let players_api = Arc::new(HttpPlayerApi::new(http, config.data_dir.clone(), policy));

        let ctx = TransformContext {
            season: Season::new(self.season),
            players_api,
        };
        run_transform(&ctx).await?;
        info!(season = self.season, "transform completed");
        Ok(())
    }
}
