use crate::draw::EntropySource;
use crate::game;
use crate::types::{CatchUpOutcome, GameState, MAX_CATCHUP_TICKS};

/// Replay up to `requested` ticks in one call.
///
/// The request is clamped to `[0, MAX_CATCHUP_TICKS]`; anything beyond the
/// ceiling or after a win is dropped, not deferred. Returns `Ok(None)` when
/// the run is not in progress. Each step is a plain `game::tick`.
pub fn catchup<E: EntropySource + ?Sized>(
    state: &mut GameState,
    requested: i64,
    source: &mut E,
    now_ms: u64,
) -> Result<Option<CatchUpOutcome>, String> {
    if state.won || !state.running {
        return Ok(None);
    }

    let budget = clamp_ticks(requested);
    let mut outcome = CatchUpOutcome::default();

    while outcome.processed < budget {
        let Some(step) = game::tick(state, source, now_ms)? else {
            break;
        };
        outcome.processed += 1;
        outcome.win = step.win;
        outcome.best = Some(step.best);
        outcome.numbers = Some(step.numbers);
        if outcome.win {
            break;
        }
    }

    Ok(Some(outcome))
}

pub fn clamp_ticks(requested: i64) -> u64 {
    requested.clamp(0, MAX_CATCHUP_TICKS as i64) as u64
}

/// Ticks a consumer missed while away for `away_ms` at `rate_per_sec`.
pub fn ticks_owed(away_ms: u64, rate_per_sec: u32) -> u64 {
    ((away_ms as u128 * rate_per_sec as u128) / 1_000).min(u64::MAX as u128) as u64
}

/// Ticks still owed after a batch. A win settles the whole debt.
pub fn remaining_after(owed: u64, outcome: &CatchUpOutcome) -> u64 {
    if outcome.win {
        0
    } else {
        owed.saturating_sub(outcome.processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{ChaChaSource, FailingSource};
    use crate::types::RawConfig;

    fn running(count: i64, min: i64, max: i64) -> GameState {
        let mut state = GameState::default();
        game::new_game(
            &mut state,
            &RawConfig { count: Some(count), min: Some(min), max: Some(max), rate: None },
            0,
        );
        state
    }

    #[test]
    fn test_clamp_ticks() {
        assert_eq!(clamp_ticks(-5), 0);
        assert_eq!(clamp_ticks(0), 0);
        assert_eq!(clamp_ticks(1_234), 1_234);
        assert_eq!(clamp_ticks(50_000), 20_000);
    }

    #[test]
    fn test_ceiling_enforced() {
        let mut state = running(40, -999_999, 999_999);
        let mut rng = ChaChaSource::seeded(11);
        let out = catchup(&mut state, 50_000, &mut rng, 0).unwrap().unwrap();
        assert_eq!(out.processed, 20_000);
        assert_eq!(state.tries, 20_000);
    }

    #[test]
    fn test_stops_at_first_win() {
        let mut state = running(9, 0, 0);
        let out = catchup(&mut state, 500, &mut FailingSource, 10).unwrap().unwrap();
        assert_eq!(out.processed, 1);
        assert!(out.win);
        assert_eq!(state.tries, 1);
        assert!(state.won);
    }

    #[test]
    fn test_zero_ticks_reports_nothing_drawn() {
        let mut state = running(5, 0, 9);
        let out = catchup(&mut state, 0, &mut FailingSource, 10).unwrap().unwrap();
        assert_eq!(out, CatchUpOutcome::default());
    }

    #[test]
    fn test_noop_when_not_running() {
        let mut state = running(5, 0, 9);
        game::stop(&mut state, 5);
        assert!(catchup(&mut state, 10, &mut FailingSource, 10).unwrap().is_none());
    }

    #[test]
    fn test_ticks_owed() {
        assert_eq!(ticks_owed(0, 10), 0);
        assert_eq!(ticks_owed(999, 1), 0);
        assert_eq!(ticks_owed(1_000, 1), 1);
        assert_eq!(ticks_owed(90_500, 10), 905);
        assert_eq!(ticks_owed(u64::MAX, 60), 1_106_804_644_422_573_096);
    }

    #[test]
    fn test_remaining_after() {
        let partial = CatchUpOutcome { processed: 20_000, win: false, ..Default::default() };
        assert_eq!(remaining_after(25_000, &partial), 5_000);
        let won = CatchUpOutcome { processed: 12, win: true, ..Default::default() };
        assert_eq!(remaining_after(25_000, &won), 0);
    }
}
