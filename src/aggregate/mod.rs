//! Pure statistics aggregation
//!
//! Merges a player's per-competition stat lines into one season total.
//! Deterministic, and order-sensitive only through the incremental rating
//! average: every merge step divides by the same fixed count (the number of
//! stat lines), not the running count, so the result is not a plain
//! arithmetic mean.

use crate::{
    Cards, Dribbles, Duels, Fouls, Games, Goals, Passes, Penalty, PersonalInfo, Player, RawPlayer,
    Shots, StatValue, Statistics, Substitutes, Tackles,
};

/// Nullable-aware addition.
///
/// Absence is never coerced to zero: a category the player has no events in
/// stays absent unless the other line has a value for it.
pub fn merge_stat(a: StatValue, b: StatValue) -> StatValue {
    match (a, b) {
        (None, b) => b,
        (a, None) => a,
        (Some(a), Some(b)) => Some(a + b),
    }
}

/// One step of the incremental average: `current + (next - current) / count`.
///
/// `count` is the total number of stat lines, fixed across all steps.
pub fn moving_average(count: usize, current: f64, next: f64) -> f64 {
    current + (next - current) / count as f64
}

trait MergeStats {
    fn merge(&self, other: &Self) -> Self;
}

macro_rules! impl_merge_stats {
    ($ty:ident { $($field:ident),+ $(,)? }) => {
        impl MergeStats for $ty {
            fn merge(&self, other: &Self) -> Self {
                $ty {
                    $($field: merge_stat(self.$field, other.$field),)+
                }
            }
        }
    };
}

impl_merge_stats!(Substitutes { r#in, out, bench });
impl_merge_stats!(Shots { total, on });
impl_merge_stats!(Goals { total, conceded, assists, saves });
impl_merge_stats!(Passes { total, key, accuracy });
impl_merge_stats!(Tackles { total, blocks, interceptions });
impl_merge_stats!(Duels { total, won });
impl_merge_stats!(Dribbles { attempts, success, past });
impl_merge_stats!(Fouls { drawn, committed });
impl_merge_stats!(Cards { yellow, yellowred, red });
impl_merge_stats!(Penalty { won, commited, scored, missed, saved });

/// Merge a non-empty sequence of per-competition stat lines into one total.
///
/// The first line seeds the accumulator; `team`, `league` and the
/// non-additive `games` fields (`number`, `position`, `captain`) carry the
/// primary context from it unchanged. Returns `None` for an empty input.
pub fn accumulate_stats(statistics: &[Statistics]) -> Option<Statistics> {
    let (head, tail) = statistics.split_first()?;
    let count = statistics.len();
    let mut acc = head.clone();
    for next in tail {
        acc = merge_entry(&acc, next, count);
    }
    Some(acc)
}

fn merge_entry(acc: &Statistics, next: &Statistics, count: usize) -> Statistics {
    // An absent accumulator rating propagates; an absent rating on the other
    // line leaves the running average untouched.
    let rating = match (acc.games.rating, next.games.rating) {
        (Some(current), Some(other)) => Some(moving_average(count, current, other)),
        (Some(current), None) => Some(current),
        (None, _) => None,
    };

    Statistics {
        team: acc.team.clone(),
        league: acc.league.clone(),
        games: Games {
            appearences: acc.games.appearences + next.games.appearences,
            lineups: acc.games.lineups + next.games.lineups,
            minutes: acc.games.minutes + next.games.minutes,
            number: acc.games.number,
            position: acc.games.position.clone(),
            rating,
            captain: acc.games.captain,
        },
        substitutes: acc.substitutes.merge(&next.substitutes),
        shots: acc.shots.merge(&next.shots),
        goals: acc.goals.merge(&next.goals),
        passes: acc.passes.merge(&next.passes),
        tackles: acc.tackles.merge(&next.tackles),
        duels: acc.duels.merge(&next.duels),
        dribbles: acc.dribbles.merge(&next.dribbles),
        fouls: acc.fouls.merge(&next.fouls),
        cards: acc.cards.merge(&next.cards),
        penalty: acc.penalty.merge(&next.penalty),
    }
}

/// Turn a raw fetched player into the aggregated entity.
///
/// Players with no stat lines are dropped entirely; they never appear as a
/// zero-stat player.
pub fn transform_player(raw: &RawPlayer) -> Option<Player> {
    let total = accumulate_stats(&raw.statistics)?;
    Some(Player {
        id: raw.player.id,
        personal_info: PersonalInfo::from(&raw.player),
        total,
        statistics: raw.statistics.clone(),
        votes: 0,
    })
}
