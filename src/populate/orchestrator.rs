//! Population orchestrator
//!
//! The state machine tying ledger, fetchers and throttle together:
//! `(no job) → RUNNING → SUSPENDED` on rate limit (resumable), `→ COMPLETED`
//! on success, or terminated with the job left `RUNNING` on a fatal error
//! (not resumable from a team position).

use std::time::Duration;
use tracing::{error, info, warn};

use crate::ledger::Job;
use crate::populate::config::MAX_PAGES;
use crate::populate::{Mode, PopulateContext, PopulateError, PopulateResult};

/// How a population run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulateOutcome {
    /// Every team was processed and the job is completed
    Completed,
    /// The upstream rate limit was hit; the job is suspended at `team_id`
    /// and the next incremental run resumes there
    Suspended {
        /// Team whose fetch was throttled
        team_id: u32,
    },
}

/// Run one population pass.
///
/// Teams are processed strictly sequentially, each team's player pages
/// persisted as they arrive. A rate limit suspends the job with the current
/// team as resume position and ends the run normally; any other error
/// propagates immediately with the job state left as-is.
pub async fn run_population(ctx: &PopulateContext) -> PopulateResult<PopulateOutcome> {
    info!(
        season = %ctx.season,
        mode = %ctx.options.mode,
        throttle = ?ctx.options.throttle,
        "starting player population"
    );

    let job = resolve_job(ctx).await?;
    info!(job_id = %job.id, "active job");

    let team_ids = teams_to_process(ctx, &job).await?;
    info!(teams = team_ids.len(), "teams to process");

    for team_id in team_ids {
        info!(team_id, "processing team");
        match fetch_team_players(ctx, team_id).await {
            Ok(()) => info!(team_id, "team processed"),
            Err(err) if err.is_rate_limit() => {
                warn!(team_id, error = %err, "rate limit reached, suspending job");
                ctx.job_api
                    .update_job_with_current_team(&job.id, team_id)
                    .await?;
                info!(job_id = %job.id, team_id, "resume position saved");
                return Ok(PopulateOutcome::Suspended { team_id });
            }
            Err(err) => {
                error!(team_id, error = %err, "error while fetching team");
                return Err(err);
            }
        }
        if let Some(secs) = ctx.options.throttle {
            tokio::time::sleep(Duration::from_secs(secs)).await;
        }
    }

    ctx.job_api.complete_job(&job.id).await?;
    info!(job_id = %job.id, "player population completed");
    Ok(PopulateOutcome::Completed)
}

/// Determine the active job: always fresh on full refresh, the last
/// suspended job (or fresh if none) on incremental.
async fn resolve_job(ctx: &PopulateContext) -> PopulateResult<Job> {
    match ctx.options.mode {
        Mode::FullRefresh => ctx.job_api.init_job().await,
        Mode::Incremental => match ctx.job_api.find_last_job().await? {
            Some(job) => Ok(job),
            None => ctx.job_api.init_job().await,
        },
    }
}

/// Determine the ordered team ids for this run.
///
/// Full refresh, or an empty team store, re-fetches and persists the team
/// list; the freshly fetched ids become authoritative. Otherwise the stored
/// ids are used, sliced at the suspended team's position (inclusive) when
/// the job carries one; an unknown resume id falls back to the full stored
/// list.
async fn teams_to_process(ctx: &PopulateContext, job: &Job) -> PopulateResult<Vec<u32>> {
    let stored_ids = ctx.team_api.get_team_ids(ctx.season).await?;
    if ctx.options.mode == Mode::FullRefresh || stored_ids.is_empty() {
        info!("fetching teams");
        let teams = ctx.team_api.fetch_teams(ctx.season).await?;
        info!(results = teams.results, "teams fetched");
        ctx.team_api.save_teams(ctx.season, &teams.response).await?;
        return Ok(teams.response.iter().map(|entry| entry.team.id).collect());
    }

    match job.team_id {
        None => Ok(stored_ids),
        Some(resume_id) => match stored_ids.iter().position(|&id| id == resume_id) {
            Some(position) => Ok(stored_ids[position..].to_vec()),
            None => {
                warn!(resume_id, "suspended team not in stored set, processing all teams");
                Ok(stored_ids)
            }
        },
    }
}

/// Page through one team's players, persisting each page before requesting
/// the next. A suspended team is retried from page 1 on the next run; there
/// is no mid-team checkpoint.
async fn fetch_team_players(ctx: &PopulateContext, team_id: u32) -> PopulateResult<()> {
    let mut page = 1u32;
    for _ in 0..MAX_PAGES {
        let players = ctx.player_api.fetch_players(ctx.season, team_id, page).await?;
        ctx.player_api
            .save_players(ctx.season, &players.response)
            .await?;
        if players.paging.current == players.paging.total {
            return Ok(());
        }
        page = players.paging.current + 1;
    }
    Err(PopulateError::PageOverflow { team_id })
}
