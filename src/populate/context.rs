//! Injected collaborator interfaces
//!
//! The orchestrator and transform job see their collaborators only through
//! these traits; production wires them to the HTTP adapters and the file
//! stores, tests to in-memory stubs.

use async_trait::async_trait;
use std::sync::Arc;

use crate::fetcher::PagedResponse;
use crate::ledger::Job;
use crate::populate::{Mode, PopulateResult};
use crate::{Player, RawPlayer, Season, TeamEntry};

/// Job ledger operations
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Create a new running job
    async fn init_job(&self) -> PopulateResult<Job>;

    /// Most recently suspended job, if any
    async fn find_last_job(&self) -> PopulateResult<Option<Job>>;

    /// Suspend a job at the given team, recording the resume position
    async fn update_job_with_current_team(&self, job_id: &str, team_id: u32)
        -> PopulateResult<()>;

    /// Mark a job completed
    async fn complete_job(&self, job_id: &str) -> PopulateResult<()>;
}

/// Team fetch-and-store operations
#[async_trait]
pub trait TeamApi: Send + Sync {
    /// Fetch the season's team list from the upstream API
    async fn fetch_teams(&self, season: Season) -> PopulateResult<PagedResponse<TeamEntry>>;

    /// Upsert teams into the season's store
    async fn save_teams(&self, season: Season, teams: &[TeamEntry]) -> PopulateResult<()>;

    /// Stored team ids in ascending order
    async fn get_team_ids(&self, season: Season) -> PopulateResult<Vec<u32>>;
}

/// Player fetch-and-store operations
#[async_trait]
pub trait PlayerApi: Send + Sync {
    /// Fetch one page of a team's players
    async fn fetch_players(
        &self,
        season: Season,
        team_id: u32,
        page: u32,
    ) -> PopulateResult<PagedResponse<RawPlayer>>;

    /// Upsert raw players into the season's store
    async fn save_players(&self, season: Season, players: &[RawPlayer]) -> PopulateResult<()>;
}

/// Read side of the raw player store plus the aggregated sink, used by the
/// transform job
#[async_trait]
pub trait PlayerReadApi: Send + Sync {
    /// Read a batch of raw players ordered by id
    async fn read_raw_players(
        &self,
        season: Season,
        limit: usize,
        offset: usize,
    ) -> PopulateResult<Vec<RawPlayer>>;

    /// Upsert aggregated players into the season's store
    async fn save_aggregated(&self, season: Season, players: &[Player]) -> PopulateResult<()>;
}

/// Run options for one population run
#[derive(Debug, Clone)]
pub struct PopulateOptions {
    /// Population mode
    pub mode: Mode,
    /// Seconds to pause between successfully processed teams
    pub throttle: Option<u64>,
}

/// Everything a population run needs, injected at call time
#[derive(Clone)]
pub struct PopulateContext {
    /// Season being populated
    pub season: Season,
    /// Job ledger
    pub job_api: Arc<dyn JobApi>,
    /// Team fetch-and-store
    pub team_api: Arc<dyn TeamApi>,
    /// Player fetch-and-store
    pub player_api: Arc<dyn PlayerApi>,
    /// Run options
    pub options: PopulateOptions,
}

/// Everything a transform run needs
#[derive(Clone)]
pub struct TransformContext {
    /// Season being transformed
    pub season: Season,
    /// Raw player source and aggregated sink
    pub players_api: Arc<dyn PlayerReadApi>,
}
