//! Best near-miss per (count, value) bucket.
//!
//! Ordering: count descending, then value descending. One entry per bucket,
//! at most `LEADERBOARD_CAPACITY` entries, perfect draws never enter.

use crate::types::{LeaderboardEntry, StreakScore, LEADERBOARD_CAPACITY};
use std::cmp::Ordering;

/// What `update` did with a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateResult {
    /// Perfect match (count >= draw size); tracked as a win instead.
    Excluded,
    /// Bucket already present; its combo now holds the newer draw.
    Refreshed,
    /// New bucket appended and ranked (it may have been cut by truncation).
    Inserted,
}

pub fn update(
    board: &mut Vec<LeaderboardEntry>,
    candidate: StreakScore,
    combo: &[i64],
    draw_size: u32,
) -> UpdateResult {
    if candidate.count >= draw_size {
        return UpdateResult::Excluded;
    }

    if let Some(entry) = board
        .iter_mut()
        .find(|e| e.count == candidate.count && e.value == candidate.value)
    {
        // Sort keys are unchanged, so the ranking stays valid.
        entry.combo = combo.to_vec();
        return UpdateResult::Refreshed;
    }

    board.push(LeaderboardEntry {
        count: candidate.count,
        value: candidate.value,
        combo: combo.to_vec(),
    });
    board.sort_by(rank);
    board.truncate(LEADERBOARD_CAPACITY);
    UpdateResult::Inserted
}

/// Restore the board invariants on entries of unknown provenance: drops
/// perfect entries, keeps the first entry of each bucket, sorts, truncates.
pub fn sanitize(board: Vec<LeaderboardEntry>, draw_size: u32) -> Vec<LeaderboardEntry> {
    let mut clean: Vec<LeaderboardEntry> = Vec::with_capacity(board.len());
    for entry in board {
        if entry.count >= draw_size {
            continue;
        }
        if clean.iter().any(|e| e.count == entry.count && e.value == entry.value) {
            continue;
        }
        clean.push(entry);
    }
    clean.sort_by(rank);
    clean.truncate(LEADERBOARD_CAPACITY);
    clean
}

/// True when `board` satisfies every leaderboard invariant for `draw_size`.
#[cfg(test)]
pub fn is_well_formed(board: &[LeaderboardEntry], draw_size: u32) -> bool {
    board.len() <= LEADERBOARD_CAPACITY
        && board.iter().all(|e| e.count < draw_size)
        && board.windows(2).all(|w| rank(&w[0], &w[1]) == Ordering::Less)
}

fn rank(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.count.cmp(&a.count).then(b.value.cmp(&a.value))
}
