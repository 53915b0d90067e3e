//! Population orchestration and the decoupled transform job
//!
//! # Overview
//!
//! [`run_population`] drives one population run:
//!
//! 1. **Job resolution**: a fresh job in full-refresh mode, the last
//!    suspended job (or a fresh one) in incremental mode
//! 2. **Team set**: freshly fetched ids on full refresh or an empty store,
//!    otherwise the stored ids sliced at the suspended team's position
//! 3. **Per-team streaming fetch**: player pages persisted as they arrive
//! 4. **Suspension**: a rate limit records the current team on the job and
//!    ends the run as [`PopulateOutcome::Suspended`]; any other error
//!    propagates with the job left as-is
//!
//! [`run_transform`] re-reads the raw fetched players in fixed-size batches
//! and emits aggregated [`crate::Player`] records; it is idempotent per
//! batch (upsert by id) and runs independently of population.

pub mod config;
pub mod context;
pub mod orchestrator;
pub mod transform;

pub use context::{
    JobApi, PlayerApi, PlayerReadApi, PopulateContext, PopulateOptions, TeamApi, TransformContext,
};
pub use orchestrator::{run_population, PopulateOutcome};
pub use transform::run_transform;

use crate::fetcher::FetcherError;
use crate::store::StoreError;

/// Population mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Always start a fresh job and re-fetch the team list
    FullRefresh,
    /// Resume from the last suspended job over the stored team list
    Incremental,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::FullRefresh => write!(f, "full-refresh"),
            Mode::Incremental => write!(f, "incremental"),
        }
    }
}

/// Errors surfaced by the population and transform jobs.
///
/// Only a rate limit is recoverable, and it never surfaces as an error:
/// the orchestrator converts it into a suspension. Everything here is fatal.
#[derive(Debug, thiserror::Error)]
pub enum PopulateError {
    /// Upstream fetch failure
    #[error("fetch error: {0}")]
    Fetch(#[from] FetcherError),

    /// Storage failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The paging cursor stopped advancing for a team
    #[error("page limit exceeded while fetching players for team {team_id}")]
    PageOverflow {
        /// Team being fetched
        team_id: u32,
    },
}

impl PopulateError {
    /// Whether this is the recoverable rate-limit case
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, PopulateError::Fetch(e) if e.is_rate_limit())
    }
}

/// Result type for population operations
pub type PopulateResult<T> = Result<T, PopulateError>;
