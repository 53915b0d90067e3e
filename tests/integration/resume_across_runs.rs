//! End-to-end suspension and resume across process restarts, using the real
//! file-backed job ledger

use std::sync::Arc;
use tempfile::TempDir;

use football_data_populator::ledger::JobLedger;
use football_data_populator::populate::{
    run_population, Mode, PopulateContext, PopulateOptions, PopulateOutcome,
};
use football_data_populator::store::OpenPolicy;
use football_data_populator::Season;

use crate::common::stubs::{
    english_teams, raw_player, stats_line, InMemoryPlayerApi, InMemoryTeamApi, TeamFetchBehavior,
};

fn team_pages(team_id: u32, player_ids: &[u32]) -> (u32, TeamFetchBehavior) {
    let players = player_ids
        .iter()
        .map(|&id| raw_player(id, &format!("Player {id}"), vec![stats_line(team_id, Some(6.5))]))
        .collect();
    (team_id, TeamFetchBehavior::Pages(vec![players]))
}

#[tokio::test]
async fn test_rate_limited_run_resumes_where_it_stopped() {
    let dir = TempDir::new().unwrap();
    let teams = english_teams();

    // First run: teams 33 and 40 succeed, 49 hits the rate limit
    {
        let ledger = Arc::new(JobLedger::open(dir.path(), &OpenPolicy::default()).unwrap());
        let team_api = Arc::new(InMemoryTeamApi::new(teams.clone()));
        let player_api = Arc::new(InMemoryPlayerApi::new(vec![
            team_pages(33, &[101]),
            team_pages(40, &[201]),
            (49, TeamFetchBehavior::RateLimited),
        ]));

        let ctx = PopulateContext {
            season: Season::new(2020),
            job_api: ledger,
            team_api,
            player_api: player_api.clone(),
            options: PopulateOptions {
                mode: Mode::FullRefresh,
                throttle: None,
            },
        };
        let outcome = run_population(&ctx).await.unwrap();
        assert_eq!(outcome, PopulateOutcome::Suspended { team_id: 49 });
        assert_eq!(player_api.saved_ids(), vec![101, 201]);
    }

    // Second run: fresh ledger handle over the same directory, limit lifted
    {
        let ledger = Arc::new(JobLedger::open(dir.path(), &OpenPolicy::default()).unwrap());
        let team_api = Arc::new(InMemoryTeamApi::new(Vec::new()).with_stored(&teams));
        let player_api = Arc::new(InMemoryPlayerApi::new(vec![
            team_pages(49, &[301]),
            team_pages(50, &[401]),
        ]));

        let ctx = PopulateContext {
            season: Season::new(2020),
            job_api: ledger.clone(),
            team_api,
            player_api: player_api.clone(),
            options: PopulateOptions {
                mode: Mode::Incremental,
                throttle: None,
            },
        };
        let outcome = run_population(&ctx).await.unwrap();
        assert_eq!(outcome, PopulateOutcome::Completed);

        // Resumed at the suspended team, not from the start
        let teams_requested: Vec<u32> = player_api.requests().iter().map(|(t, _)| *t).collect();
        assert_eq!(teams_requested, vec![49, 50]);
        // Nothing left to resume
        assert!(ledger.find_last_job().unwrap().is_none());
    }
}
