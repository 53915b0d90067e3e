//! In-memory collaborator stubs and fixtures shared by the integration tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use football_data_populator::fetcher::{FetcherError, PagedResponse, Paging};
use football_data_populator::ledger::{Job, JobStatus};
use football_data_populator::populate::{
    JobApi, PlayerApi, PlayerReadApi, PopulateError, PopulateResult, TeamApi,
};
use football_data_populator::{
    Cards, Dribbles, Duels, Fouls, Games, Goals, LeagueRef, Passes, Penalty, Player, PlayerInfo,
    RawPlayer, Season, Shots, Statistics, Substitutes, Tackles, Team, TeamEntry, TeamRecord,
    TeamRef, Venue,
};

/// In-memory job ledger
pub struct InMemoryJobApi {
    jobs: Mutex<Vec<Job>>,
    counter: AtomicU64,
}

impl InMemoryJobApi {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            counter: AtomicU64::new(0),
        }
    }

    /// Seed a suspended job with a resume position, as a previous run would
    /// have left it
    pub fn with_suspended_job(self, team_id: u32) -> Self {
        let mut job = Job::new("job-previous".to_string());
        job.suspend(team_id);
        self.jobs.lock().unwrap().push(job);
        self
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.jobs.lock().unwrap().clone()
    }

    /// The single job matching `status`, panicking if there is not exactly one
    pub fn only_job_with_status(&self, status: JobStatus) -> Job {
        let jobs = self.jobs();
        let matching: Vec<&Job> = jobs.iter().filter(|j| j.status == status).collect();
        assert_eq!(matching.len(), 1, "expected one {status:?} job in {jobs:?}");
        matching[0].clone()
    }
}

#[async_trait]
impl JobApi for InMemoryJobApi {
    async fn init_job(&self) -> PopulateResult<Job> {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let job = Job::new(format!("job-{seq:04}"));
        self.jobs.lock().unwrap().push(job.clone());
        Ok(job)
    }

    async fn find_last_job(&self) -> PopulateResult<Option<Job>> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.status == JobStatus::Suspended)
            .max_by_key(|j| j.end_date)
            .cloned())
    }

    async fn update_job_with_current_team(&self, job_id: &str, team_id: u32) -> PopulateResult<()> {
        if let Some(job) = self.jobs.lock().unwrap().iter_mut().find(|j| j.id == job_id) {
            job.suspend(team_id);
        }
        Ok(())
    }

    async fn complete_job(&self, job_id: &str) -> PopulateResult<()> {
        if let Some(job) = self.jobs.lock().unwrap().iter_mut().find(|j| j.id == job_id) {
            job.complete();
        }
        Ok(())
    }
}

/// In-memory team fetch-and-store
pub struct InMemoryTeamApi {
    upstream: Vec<TeamEntry>,
    stored: Mutex<Vec<TeamRecord>>,
    fetch_calls: AtomicU64,
}

impl InMemoryTeamApi {
    pub fn new(upstream: Vec<TeamEntry>) -> Self {
        Self {
            upstream,
            stored: Mutex::new(Vec::new()),
            fetch_calls: AtomicU64::new(0),
        }
    }

    /// Seed the store, as a previous run would have left it
    pub fn with_stored(self, teams: &[TeamEntry]) -> Self {
        {
            let mut stored = self.stored.lock().unwrap();
            *stored = teams.iter().cloned().map(TeamRecord::from).collect();
        }
        self
    }

    pub fn fetch_calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::Relaxed)
    }

    pub fn stored_ids(&self) -> Vec<u32> {
        self.stored.lock().unwrap().iter().map(|r| r.team.id).collect()
    }
}

#[async_trait]
impl TeamApi for InMemoryTeamApi {
    async fn fetch_teams(&self, _season: Season) -> PopulateResult<PagedResponse<TeamEntry>> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        Ok(PagedResponse {
            response: self.upstream.clone(),
            paging: Paging::default(),
            results: self.upstream.len() as u32,
        })
    }

    async fn save_teams(&self, _season: Season, teams: &[TeamEntry]) -> PopulateResult<()> {
        let mut stored = self.stored.lock().unwrap();
        for entry in teams {
            let record = TeamRecord::from(entry.clone());
            match stored.iter_mut().find(|r| r.team.id == record.team.id) {
                Some(existing) => *existing = record,
                None => stored.push(record),
            }
        }
        stored.sort_by_key(|r| r.team.id);
        Ok(())
    }

    async fn get_team_ids(&self, _season: Season) -> PopulateResult<Vec<u32>> {
        Ok(self.stored_ids())
    }
}

/// What the player stub does when asked for a team's players
pub enum TeamFetchBehavior {
    /// Serve the given pages (index 0 is page 1)
    Pages(Vec<Vec<RawPlayer>>),
    /// Report an upstream rate limit
    RateLimited,
    /// Fail with a fatal upstream error
    Broken,
}

/// In-memory player fetch-and-store with scripted per-team behavior
pub struct InMemoryPlayerApi {
    behaviors: Vec<(u32, TeamFetchBehavior)>,
    saved: Mutex<Vec<RawPlayer>>,
    requests: Mutex<Vec<(u32, u32)>>,
}

impl InMemoryPlayerApi {
    pub fn new(behaviors: Vec<(u32, TeamFetchBehavior)>) -> Self {
        Self {
            behaviors,
            saved: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// `(team_id, page)` pairs in request order
    pub fn requests(&self) -> Vec<(u32, u32)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn saved_ids(&self) -> Vec<u32> {
        self.saved.lock().unwrap().iter().map(|p| p.player.id).collect()
    }
}

#[async_trait]
impl PlayerApi for InMemoryPlayerApi {
    async fn fetch_players(
        &self,
        _season: Season,
        team_id: u32,
        page: u32,
    ) -> PopulateResult<PagedResponse<RawPlayer>> {
        self.requests.lock().unwrap().push((team_id, page));

        let behavior = self
            .behaviors
            .iter()
            .find(|(id, _)| *id == team_id)
            .map(|(_, b)| b);
        match behavior {
            Some(TeamFetchBehavior::Pages(pages)) => {
                let total = pages.len().max(1) as u32;
                let response = pages
                    .get(page as usize - 1)
                    .cloned()
                    .unwrap_or_default();
                Ok(PagedResponse {
                    results: response.len() as u32,
                    response,
                    paging: Paging {
                        current: page,
                        total,
                    },
                })
            }
            Some(TeamFetchBehavior::RateLimited) => {
                Err(PopulateError::Fetch(FetcherError::RateLimitExceeded(
                    "Too many requests. Your rate limit is 10 requests per minute.".to_string(),
                )))
            }
            Some(TeamFetchBehavior::Broken) => Err(PopulateError::Fetch(FetcherError::Api(
                "error when fetching data: unexpected upstream failure".to_string(),
            ))),
            None => Ok(PagedResponse {
                response: Vec::new(),
                paging: Paging::default(),
                results: 0,
            }),
        }
    }

    async fn save_players(&self, _season: Season, players: &[RawPlayer]) -> PopulateResult<()> {
        let mut saved = self.saved.lock().unwrap();
        for player in players {
            match saved.iter_mut().find(|p| p.player.id == player.player.id) {
                Some(existing) => *existing = player.clone(),
                None => saved.push(player.clone()),
            }
        }
        Ok(())
    }
}

/// In-memory raw player source and aggregated sink for the transform job
pub struct InMemoryPlayerReadApi {
    raw: Vec<RawPlayer>,
    aggregated: Mutex<Vec<Player>>,
    reads: Mutex<Vec<(usize, usize)>>,
}

impl InMemoryPlayerReadApi {
    pub fn new(raw: Vec<RawPlayer>) -> Self {
        Self {
            raw,
            aggregated: Mutex::new(Vec::new()),
            reads: Mutex::new(Vec::new()),
        }
    }

    /// `(limit, offset)` pairs in read order
    pub fn reads(&self) -> Vec<(usize, usize)> {
        self.reads.lock().unwrap().clone()
    }

    pub fn aggregated(&self) -> Vec<Player> {
        self.aggregated.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlayerReadApi for InMemoryPlayerReadApi {
    async fn read_raw_players(
        &self,
        _season: Season,
        limit: usize,
        offset: usize,
    ) -> PopulateResult<Vec<RawPlayer>> {
        self.reads.lock().unwrap().push((limit, offset));
        let start = offset.min(self.raw.len());
        let end = (offset + limit).min(self.raw.len());
        Ok(self.raw[start..end].to_vec())
    }

    async fn save_aggregated(&self, _season: Season, players: &[Player]) -> PopulateResult<()> {
        let mut aggregated = self.aggregated.lock().unwrap();
        for player in players {
            match aggregated.iter_mut().find(|p| p.id == player.id) {
                Some(existing) => *existing = player.clone(),
                None => aggregated.push(player.clone()),
            }
        }
        Ok(())
    }
}

pub fn team_entry(id: u32, name: &str) -> TeamEntry {
    TeamEntry {
        team: Team {
            id,
            name: name.to_string(),
            country: "England".to_string(),
            founded: Some(1880),
            national: false,
            logo: format!("https://media.api-sports.io/football/teams/{id}.png"),
        },
        venue: Venue {
            id: Some(id + 500),
            name: Some(format!("{name} Stadium")),
            address: None,
            city: Some("London".to_string()),
            capacity: Some(60000),
            surface: Some("grass".to_string()),
            image: None,
        },
    }
}

/// The four English teams of the 2020/21 Champions League group stage
pub fn english_teams() -> Vec<TeamEntry> {
    vec![
        team_entry(33, "Manchester United"),
        team_entry(40, "Liverpool"),
        team_entry(49, "Chelsea"),
        team_entry(50, "Manchester City"),
    ]
}

pub fn stats_line(team_id: u32, rating: Option<f64>) -> Statistics {
    Statistics {
        team: TeamRef {
            id: team_id,
            name: format!("Team {team_id}"),
            logo: format!("https://media.api-sports.io/football/teams/{team_id}.png"),
        },
        league: LeagueRef {
            id: 2,
            name: "UEFA Champions League".to_string(),
            country: Some("World".to_string()),
            logo: None,
            flag: None,
            season: 2020,
        },
        games: Games {
            appearences: 6,
            lineups: 5,
            minutes: 450,
            number: Some(10),
            position: "Midfielder".to_string(),
            rating,
            captain: false,
        },
        substitutes: Substitutes {
            r#in: Some(1),
            out: Some(2),
            bench: Some(1),
        },
        shots: Shots {
            total: Some(9),
            on: Some(4),
        },
        goals: Goals {
            total: Some(2),
            conceded: None,
            assists: Some(3),
            saves: None,
        },
        passes: Passes {
            total: Some(310),
            key: Some(14),
            accuracy: Some(87),
        },
        tackles: Tackles {
            total: Some(8),
            blocks: None,
            interceptions: Some(5),
        },
        duels: Duels {
            total: Some(60),
            won: Some(34),
        },
        dribbles: Dribbles {
            attempts: Some(20),
            success: Some(12),
            past: None,
        },
        fouls: Fouls {
            drawn: Some(7),
            committed: Some(5),
        },
        cards: Cards {
            yellow: Some(1),
            yellowred: None,
            red: None,
        },
        penalty: Penalty {
            won: None,
            commited: None,
            scored: Some(1),
            missed: None,
            saved: None,
        },
    }
}

pub fn raw_player(id: u32, name: &str, statistics: Vec<Statistics>) -> RawPlayer {
    RawPlayer {
        player: PlayerInfo {
            id,
            name: name.to_string(),
            firstname: None,
            lastname: None,
            age: Some(27),
            nationality: Some("England".to_string()),
            height: Some("180 cm".to_string()),
            weight: Some("75 kg".to_string()),
            injured: false,
            photo: format!("https://media.api-sports.io/football/players/{id}.png"),
        },
        statistics,
    }
}
