//! Job entity and its state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a population run.
///
/// `Running → Suspended` on rate limit, `Running → Completed` on success.
/// `Suspended` and `Completed` are terminal within one run; a suspended job
/// is picked up again by the next incremental run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Run in progress (or aborted by a fatal error before reaching a
    /// terminal state)
    Running,
    /// Rate limited; `team_id` holds the resume position
    Suspended,
    /// All teams processed
    Completed,
}

/// One population run.
///
/// Invariant: `team_id` is set if and only if `status == Suspended`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Opaque identifier, assigned at creation
    pub id: String,
    /// When the run started
    pub start_date: DateTime<Utc>,
    /// When the run reached a terminal state
    pub end_date: Option<DateTime<Utc>>,
    /// Lifecycle state
    pub status: JobStatus,
    /// Team being processed when the run was suspended
    pub team_id: Option<u32>,
}

impl Job {
    /// Create a fresh running job
    pub fn new(id: String) -> Self {
        Self {
            id,
            start_date: Utc::now(),
            end_date: None,
            status: JobStatus::Running,
            team_id: None,
        }
    }

    /// Suspend the job at `team_id`, recording the resume position
    pub fn suspend(&mut self, team_id: u32) {
        self.status = JobStatus::Suspended;
        self.team_id = Some(team_id);
        self.end_date = Some(Utc::now());
    }

    /// Mark the job completed, clearing any resume position
    pub fn complete(&mut self) {
        self.status = JobStatus::Completed;
        self.team_id = None;
        self.end_date = Some(Utc::now());
    }
}
