//! Batch transformation over previously fetched raw players

use std::sync::Arc;

use football_data_populator::populate::{run_transform, TransformContext};
use football_data_populator::Season;

use crate::common::stubs::{raw_player, stats_line, InMemoryPlayerReadApi};

fn context(api: Arc<InMemoryPlayerReadApi>) -> TransformContext {
    TransformContext {
        season: Season::new(2020),
        players_api: api,
    }
}

#[tokio::test]
async fn test_transform_aggregates_and_drops_statless_players() {
    let api = Arc::new(InMemoryPlayerReadApi::new(vec![
        raw_player(1, "One", vec![stats_line(33, Some(7.0)), stats_line(40, Some(8.0))]),
        raw_player(2, "Two", Vec::new()),
        raw_player(3, "Three", vec![stats_line(33, None)]),
    ]));

    run_transform(&context(api.clone())).await.unwrap();

    let aggregated = api.aggregated();
    let ids: Vec<u32> = aggregated.iter().map(|p| p.id).collect();
    // Player 2 has no stat lines and is dropped, not stored with zeros
    assert_eq!(ids, vec![1, 3]);

    let one = &aggregated[0];
    assert_eq!(one.personal_info.name, "One");
    assert_eq!(one.statistics.len(), 2);
    assert_eq!(one.total.games.appearences, 12);
    assert_eq!(one.total.goals.total, Some(4));
    assert_eq!(one.votes, 0);
}

#[tokio::test]
async fn test_transform_walks_batches_until_short_read() {
    // 120 players: full batches at offsets 0 and 50, a short one at 100
    let raw: Vec<_> = (1..=120)
        .map(|id| raw_player(id, &format!("Player {id}"), vec![stats_line(33, None)]))
        .collect();
    let api = Arc::new(InMemoryPlayerReadApi::new(raw));

    run_transform(&context(api.clone())).await.unwrap();

    assert_eq!(api.reads(), vec![(50, 0), (50, 50), (50, 100)]);
    assert_eq!(api.aggregated().len(), 120);
}

#[tokio::test]
async fn test_transform_stops_after_exact_multiple_of_batch() {
    let raw: Vec<_> = (1..=50)
        .map(|id| raw_player(id, &format!("Player {id}"), vec![stats_line(33, None)]))
        .collect();
    let api = Arc::new(InMemoryPlayerReadApi::new(raw));

    run_transform(&context(api.clone())).await.unwrap();

    // A full batch forces one more read, which comes back empty
    assert_eq!(api.reads(), vec![(50, 0), (50, 50)]);
    assert_eq!(api.aggregated().len(), 50);
}

#[tokio::test]
async fn test_transform_of_empty_store_is_a_noop() {
    let api = Arc::new(InMemoryPlayerReadApi::new(Vec::new()));
    run_transform(&context(api.clone())).await.unwrap();
    assert_eq!(api.reads(), vec![(50, 0)]);
    assert!(api.aggregated().is_empty());
}

#[tokio::test]
async fn test_transform_is_idempotent() {
    let api = Arc::new(InMemoryPlayerReadApi::new(vec![
        raw_player(1, "One", vec![stats_line(33, Some(7.2))]),
        raw_player(2, "Two", vec![stats_line(40, Some(6.4))]),
    ]));
    let ctx = context(api.clone());

    run_transform(&ctx).await.unwrap();
    let first = api.aggregated();
    run_transform(&ctx).await.unwrap();
    let second = api.aggregated();

    assert_eq!(first, second);
}
