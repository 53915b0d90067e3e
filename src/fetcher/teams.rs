//! Team fetch-and-store adapter

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::fetcher::{FootballHttpClient, PagedResponse};
use crate::populate::{PopulateResult, TeamApi};
use crate::store::{Collection, OpenPolicy};
use crate::{Season, TeamEntry, TeamRecord};

/// [`TeamApi`] backed by the upstream HTTP client and a per-season
/// file collection (`teams_{season}`)
pub struct HttpTeamApi {
    http: Arc<FootballHttpClient>,
    data_dir: PathBuf,
    policy: OpenPolicy,
    league_id: u32,
}

impl HttpTeamApi {
    /// Create the adapter for the given league
    pub fn new(
        http: Arc<FootballHttpClient>,
        data_dir: PathBuf,
        policy: OpenPolicy,
        league_id: u32,
    ) -> Self {
        Self {
            http,
            data_dir,
            policy,
            league_id,
        }
    }

    fn collection(&self, season: Season) -> PopulateResult<Collection<TeamRecord>> {
        let name = format!("teams_{season}");
        Ok(Collection::open(&self.data_dir, &name, &self.policy)?)
    }
}

#[async_trait]
impl TeamApi for HttpTeamApi {
    async fn fetch_teams(&self, season: Season) -> PopulateResult<PagedResponse<TeamEntry>> {
        debug!(league = self.league_id, season = %season, "fetching teams");
        let response = self
            .http
            .get_paged(
                "teams",
                &[
                    ("league", self.league_id.to_string()),
                    ("season", season.to_string()),
                ],
            )
            .await?;
        Ok(response)
    }

    async fn save_teams(&self, season: Season, teams: &[TeamEntry]) -> PopulateResult<()> {
        let records: Vec<TeamRecord> = teams.iter().cloned().map(TeamRecord::from).collect();
        self.collection(season)?.upsert_all(&records)?;
        Ok(())
    }

    async fn get_team_ids(&self, season: Season) -> PopulateResult<Vec<u32>> {
        let ids = self.collection(season)?.ids()?;
        Ok(ids.into_iter().map(|id| id as u32).collect())
    }
}
