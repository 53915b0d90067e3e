//! Population and transform configuration constants

use std::time::Duration;

/// Maximum number of transport-level retries for a single request.
/// 5 retries with exponential backoff rides out transient network issues
/// without looping forever on persistent failures.
pub const MAX_RETRIES: u32 = 5;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum backoff delay in milliseconds.
/// Caps exponential growth so a retry burst never waits more than 30s.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Upper bound on pages requested for one team.
/// The upstream caps player pages per team far below this; hitting the bound
/// means the paging cursor stopped advancing.
pub const MAX_PAGES: u32 = 100;

/// Number of raw players read per transform batch.
/// Matches the page size the voting application was tuned against; small
/// enough to keep each upsert cheap, large enough to finish a squad in one
/// or two batches.
pub const TRANSFORM_BATCH_SIZE: usize = 50;

/// Calculate exponential backoff delay for a retry attempt
pub fn calculate_backoff(retry_count: u32) -> Duration {
    let delay_ms = INITIAL_BACKOFF_MS.saturating_mul(2u64.saturating_pow(retry_count));
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
}
