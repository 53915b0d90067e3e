//! # Football Data Populator Library
//!
//! Batch jobs that ingest football statistics from the API-Sports football API,
//! persist them locally, and aggregate per-player season totals for a voting
//! application.
//!
//! ## Features
//!
//! - **Resumable Population**: a durable job ledger records progress so a run
//!   interrupted by an upstream rate limit can resume at the exact team
//! - **Rate Limit Classification**: upstream error payloads are decoded into an
//!   explicit taxonomy separating "throttled, resume later" from "broken, stop"
//! - **Streaming Pagination**: player pages are persisted as they arrive, one
//!   page at a time
//! - **Pure Aggregation**: per-competition stat lines merge into season totals
//!   with nullable-aware addition and an incremental rating average
//! - **Decoupled Transformation**: aggregation runs as a separate idempotent
//!   batch job over previously fetched raw records
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use football_data_populator::populate::{
//!     run_population, Mode, PopulateContext, PopulateOptions,
//! };
//! use football_data_populator::Season;
//!
//! # async fn example(
//! #     job_api: Arc<dyn football_data_populator::populate::JobApi>,
//! #     team_api: Arc<dyn football_data_populator::populate::TeamApi>,
//! #     player_api: Arc<dyn football_data_populator::populate::PlayerApi>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = PopulateContext {
//!     season: Season::new(2020),
//!     job_api,
//!     team_api,
//!     player_api,
//!     options: PopulateOptions {
//!         mode: Mode::Incremental,
//!         throttle: Some(20),
//!     },
//! };
//! let outcome = run_population(&ctx).await?;
//! println!("outcome: {outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several core modules:
//!
//! - [`fetcher`] - Rate-limit-aware HTTP client for the upstream API
//! - [`store`] - File-backed key-by-id upsert stores
//! - [`ledger`] - Durable job ledger (the only cross-run state)
//! - [`aggregate`] - Pure statistics aggregation
//! - [`populate`] - Population orchestrator and transform job
//! - [`cli`] - Command implementations
//!
//! ## Data Types
//!
//! - [`TeamEntry`] - Team plus venue as returned by the upstream API
//! - [`RawPlayer`] - A player with one [`Statistics`] line per competition
//! - [`Player`] - Aggregated entity with derived season totals

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod fetcher;
pub mod ledger;
pub mod populate;
pub mod store;

/// A football season, identified by its starting year (e.g. 2020 for 2020/21).
///
/// Scopes every stored collection: `teams_{season}`, `players_raw_{season}`,
/// `players_{season}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Season(u16);

impl Season {
    /// Create a season from its starting year
    pub fn new(year: u16) -> Self {
        Self(year)
    }

    /// Get the starting year
    pub fn year(&self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable team reference data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Upstream team id
    pub id: u32,
    /// Team name
    pub name: String,
    /// Country the team plays in
    pub country: String,
    /// Foundation year
    pub founded: Option<u32>,
    /// Whether this is a national team
    pub national: bool,
    /// Logo URL
    pub logo: String,
}

/// Stadium information attached to a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    /// Upstream venue id
    pub id: Option<u32>,
    /// Venue name
    pub name: Option<String>,
    /// Street address
    pub address: Option<String>,
    /// City
    pub city: Option<String>,
    /// Seating capacity
    pub capacity: Option<u32>,
    /// Playing surface
    pub surface: Option<String>,
    /// Photo URL
    pub image: Option<String>,
}

/// Team plus venue, the unit returned by the upstream `teams` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamEntry {
    /// Team reference data
    pub team: Team,
    /// Home venue
    pub venue: Venue,
}

/// Flattened team record as persisted, keyed by team id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    /// Team reference data
    #[serde(flatten)]
    pub team: Team,
    /// Home venue
    pub venue: Venue,
}

impl From<TeamEntry> for TeamRecord {
    fn from(entry: TeamEntry) -> Self {
        Self {
            team: entry.team,
            venue: entry.venue,
        }
    }
}

/// Biographical player data as returned by the upstream API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// Upstream player id
    pub id: u32,
    /// Display name
    pub name: String,
    /// First name
    pub firstname: Option<String>,
    /// Last name
    pub lastname: Option<String>,
    /// Age in years
    pub age: Option<u32>,
    /// Nationality
    pub nationality: Option<String>,
    /// Height, free-form (e.g. "180 cm")
    pub height: Option<String>,
    /// Weight, free-form (e.g. "70 kg")
    pub weight: Option<String>,
    /// Whether the player is currently injured
    pub injured: bool,
    /// Photo URL
    pub photo: String,
}

/// Biographical player data without the id, embedded in [`Player`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    /// Display name
    pub name: String,
    /// First name
    pub firstname: Option<String>,
    /// Last name
    pub lastname: Option<String>,
    /// Age in years
    pub age: Option<u32>,
    /// Nationality
    pub nationality: Option<String>,
    /// Height, free-form
    pub height: Option<String>,
    /// Weight, free-form
    pub weight: Option<String>,
    /// Whether the player is currently injured
    pub injured: bool,
    /// Photo URL
    pub photo: String,
}

impl From<&PlayerInfo> for PersonalInfo {
    fn from(info: &PlayerInfo) -> Self {
        Self {
            name: info.name.clone(),
            firstname: info.firstname.clone(),
            lastname: info.lastname.clone(),
            age: info.age,
            nationality: info.nationality.clone(),
            height: info.height.clone(),
            weight: info.weight.clone(),
            injured: info.injured,
            photo: info.photo.clone(),
        }
    }
}

/// A nullable stat counter. Absence of an event category is distinct from zero.
pub type StatValue = Option<i64>;

/// Team reference inside a statistics line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRef {
    /// Upstream team id
    pub id: u32,
    /// Team name
    pub name: String,
    /// Logo URL
    pub logo: String,
}

/// Competition reference inside a statistics line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueRef {
    /// Upstream league id
    pub id: u32,
    /// League name
    pub name: String,
    /// Country the league belongs to
    pub country: Option<String>,
    /// Logo URL
    pub logo: Option<String>,
    /// Flag URL
    pub flag: Option<String>,
    /// Season year
    pub season: u16,
}

/// Playing-time figures for one competition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Games {
    /// Matches the player appeared in
    pub appearences: u32,
    /// Matches started
    pub lineups: u32,
    /// Minutes played
    pub minutes: u32,
    /// Shirt number
    pub number: Option<u32>,
    /// Field position
    pub position: String,
    /// Average match rating; the wire carries it as a decimal string
    #[serde(deserialize_with = "de_rating", default)]
    pub rating: Option<f64>,
    /// Whether the player captained the team
    pub captain: bool,
}

/// Substitution counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitutes {
    /// Times subbed in
    #[serde(rename = "in")]
    pub r#in: StatValue,
    /// Times subbed out
    pub out: StatValue,
    /// Times on the bench
    pub bench: StatValue,
}

/// Shot counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shots {
    /// Total shots
    pub total: StatValue,
    /// Shots on target
    pub on: StatValue,
}

/// Goal counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goals {
    /// Goals scored
    pub total: StatValue,
    /// Goals conceded (goalkeepers)
    pub conceded: StatValue,
    /// Assists
    pub assists: StatValue,
    /// Saves (goalkeepers)
    pub saves: StatValue,
}

/// Passing counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passes {
    /// Total passes
    pub total: StatValue,
    /// Key passes
    pub key: StatValue,
    /// Pass accuracy percentage
    pub accuracy: StatValue,
}

/// Tackling counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tackles {
    /// Total tackles
    pub total: StatValue,
    /// Blocks
    pub blocks: StatValue,
    /// Interceptions
    pub interceptions: StatValue,
}

/// Duel counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duels {
    /// Duels contested
    pub total: StatValue,
    /// Duels won
    pub won: StatValue,
}

/// Dribbling counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dribbles {
    /// Dribbles attempted
    pub attempts: StatValue,
    /// Dribbles completed
    pub success: StatValue,
    /// Times dribbled past
    pub past: StatValue,
}

/// Foul counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fouls {
    /// Fouls drawn
    pub drawn: StatValue,
    /// Fouls committed
    pub committed: StatValue,
}

/// Card counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cards {
    /// Yellow cards
    pub yellow: StatValue,
    /// Second yellows
    pub yellowred: StatValue,
    /// Red cards
    pub red: StatValue,
}

/// Penalty counters. Field spelling follows the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
    /// Penalties won
    pub won: StatValue,
    /// Penalties conceded
    pub commited: StatValue,
    /// Penalties scored
    pub scored: StatValue,
    /// Penalties missed
    pub missed: StatValue,
    /// Penalties saved (goalkeepers)
    pub saved: StatValue,
}

/// One competition-scoped statistics line for a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Team the line was recorded for
    pub team: TeamRef,
    /// Competition the line was recorded in
    pub league: LeagueRef,
    /// Playing-time figures
    pub games: Games,
    /// Substitution counters
    pub substitutes: Substitutes,
    /// Shot counters
    pub shots: Shots,
    /// Goal counters
    pub goals: Goals,
    /// Passing counters
    pub passes: Passes,
    /// Tackling counters
    pub tackles: Tackles,
    /// Duel counters
    pub duels: Duels,
    /// Dribbling counters
    pub dribbles: Dribbles,
    /// Foul counters
    pub fouls: Fouls,
    /// Card counters
    pub cards: Cards,
    /// Penalty counters
    pub penalty: Penalty,
}

/// Raw fetch unit: a player with one statistics line per competition.
///
/// Persisted exactly as fetched; aggregation happens in the decoupled
/// transform job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPlayer {
    /// Biographical data
    pub player: PlayerInfo,
    /// Per-competition statistics, possibly empty
    pub statistics: Vec<Statistics>,
}

/// Aggregated player entity served to the voting application.
///
/// `total` is derived from `statistics` and never stored as independent
/// truth. `statistics` is non-empty by construction: players with no stat
/// lines are filtered out during transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Upstream player id
    pub id: u32,
    /// Biographical data
    #[serde(rename = "personalInfo")]
    pub personal_info: PersonalInfo,
    /// Season totals across all competitions
    pub total: Statistics,
    /// Per-competition statistics, non-empty
    pub statistics: Vec<Statistics>,
    /// Vote count, mutated only by the voting subsystem
    #[serde(default)]
    pub votes: u64,
}

/// Deserialize a rating that the wire may carry as a decimal string, a
/// number, or null.
fn de_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(f64),
        Str(String),
    }

    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Repr::Num(n)) => Ok(Some(n)),
        Some(Repr::Str(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid rating '{s}': {e}"))),
    }
}
