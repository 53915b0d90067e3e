//! Player fetch-and-store adapter
//!
//! Implements both sides of the player flow: the write path used by
//! population (`players_raw_{season}`) and the read/aggregate path used by
//! the transform job (`players_{season}`).

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::fetcher::{FootballHttpClient, PagedResponse};
use crate::populate::{PlayerApi, PlayerReadApi, PopulateResult};
use crate::store::{Collection, OpenPolicy};
use crate::{Player, RawPlayer, Season};

/// [`PlayerApi`] and [`PlayerReadApi`] backed by the upstream HTTP client
/// and per-season file collections
pub struct HttpPlayerApi {
    http: Arc<FootballHttpClient>,
    data_dir: PathBuf,
    policy: OpenPolicy,
}

impl HttpPlayerApi {
    /// Create the adapter
    pub fn new(http: Arc<FootballHttpClient>, data_dir: PathBuf, policy: OpenPolicy) -> Self {
        Self {
            http,
            data_dir,
            policy,
        }
    }

    fn raw_collection(&self, season: Season) -> PopulateResult<Collection<RawPlayer>> {
        let name = format!("players_raw_{season}");
        Ok(Collection::open(&self.data_dir, &name, &self.policy)?)
    }

    fn aggregated_collection(&self, season: Season) -> PopulateResult<Collection<Player>> {
        let name = format!("players_{season}");
        Ok(Collection::open(&self.data_dir, &name, &self.policy)?)
    }
}

#[async_trait]
impl PlayerApi for HttpPlayerApi {
    async fn fetch_players(
        &self,
        season: Season,
        team_id: u32,
        page: u32,
    ) -> PopulateResult<PagedResponse<RawPlayer>> {
        debug!(season = %season, team_id, page, "fetching players");
        let response = self
            .http
            .get_paged(
                "players",
                &[
                    ("season", season.to_string()),
                    ("team", team_id.to_string()),
                    ("page", page.to_string()),
                ],
            )
            .await?;
        Ok(response)
    }

    async fn save_players(&self, season: Season, players: &[RawPlayer]) -> PopulateResult<()> {
        self.raw_collection(season)?.upsert_all(players)?;
        Ok(())
    }
}

#[async_trait]
impl PlayerReadApi for HttpPlayerApi {
    async fn read_raw_players(
        &self,
        season: Season,
        limit: usize,
        offset: usize,
    ) -> PopulateResult<Vec<RawPlayer>> {
        Ok(self.raw_collection(season)?.find_range(limit, offset)?)
    }

    async fn save_aggregated(&self, season: Season, players: &[Player]) -> PopulateResult<()> {
        self.aggregated_collection(season)?.upsert_all(players)?;
        Ok(())
    }
}
