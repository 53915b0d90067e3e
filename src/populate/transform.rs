//! Decoupled batch aggregation job
//!
//! Reads previously fetched raw players in fixed-size batches and re-emits
//! aggregated [`crate::Player`] entities. Purely sequential and idempotent:
//! each batch upserts by id, so re-running over the same data converges to
//! the same store.

use tracing::{debug, info};

use crate::aggregate::transform_player;
use crate::populate::config::TRANSFORM_BATCH_SIZE;
use crate::populate::{PopulateResult, TransformContext};
use crate::Player;

/// Run the transform job to completion.
///
/// Batches advance by a fixed offset until one comes back smaller than the
/// batch size. Players with no stat lines are dropped, never stored as a
/// zero-stat entity.
pub async fn run_transform(ctx: &TransformContext) -> PopulateResult<()> {
    let batch = TRANSFORM_BATCH_SIZE;
    info!(season = %ctx.season, batch, "starting player transformation");

    let mut offset = 0usize;
    loop {
        let raw = ctx
            .players_api
            .read_raw_players(ctx.season, batch, offset)
            .await?;
        if raw.is_empty() {
            break;
        }

        let players: Vec<Player> = raw.iter().filter_map(transform_player).collect();
        debug!(
            offset,
            read = raw.len(),
            aggregated = players.len(),
            "transforming batch"
        );
        if !players.is_empty() {
            ctx.players_api.save_aggregated(ctx.season, &players).await?;
        }

        if raw.len() < batch {
            break;
        }
        offset += batch;
    }

    info!(season = %ctx.season, "player transformation completed");
    Ok(())
}
