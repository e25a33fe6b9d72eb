//! Match engine: the per-player state machine.
//!
//! Every operation takes the player's `GameState` explicitly; the engine holds
//! nothing between calls. `tick` is the only operation with a random outcome
//! and the only one that can fail (when entropy is unavailable).
//!
//! Phases: Setup -> (new_game) -> Running <-> Stopped, Running -> Won on a
//! perfect draw, Won -> (start) -> Running with a cleared leaderboard.

use crate::clock;
use crate::config;
use crate::draw::{self, EntropySource};
use crate::leaderboard;
use crate::streak;
use crate::types::{Config, GameState, MatchPhase, RawConfig, Snapshot, TickOutcome};

// =============================================================================
// STATE VIEWS
// =============================================================================

impl GameState {
    pub fn phase(&self) -> MatchPhase {
        if self.won {
            MatchPhase::Won
        } else if self.running {
            MatchPhase::Running
        } else if self.tries == 0 && self.elapsed_ms == 0 && self.last_draw.is_none() {
            MatchPhase::Setup
        } else {
            MatchPhase::Stopped
        }
    }

    pub fn snapshot(&self, now_ms: u64) -> Snapshot {
        Snapshot {
            ok: true,
            cfg: self.cfg.clone(),
            running: self.running,
            won: self.won,
            tries: self.tries,
            elapsed_ms: clock::elapsed(self, now_ms),
            last_numbers: self.last_draw.clone(),
            top3: self.leaderboard.clone(),
            win_numbers: self.win_draw.clone(),
        }
    }

    /// Rebuild a state from a snapshot, repairing anything that violates the
    /// state invariants. A running snapshot resumes its clock at `now_ms`
    /// with the snapshot's elapsed time already banked.
    ///
    /// Draws that could not come from `cfg` are dropped. A win survives only
    /// with a perfect winning draw; otherwise the run comes back stopped.
    pub fn from_snapshot(snapshot: &Snapshot, now_ms: u64) -> GameState {
        let cfg = config::renormalize(&snapshot.cfg);

        let last_draw = snapshot.last_numbers.clone().filter(|d| fits_config(d, &cfg));
        let win_draw = snapshot
            .win_numbers
            .clone()
            .filter(|d| snapshot.won && fits_config(d, &cfg))
            .filter(|d| streak::is_perfect(&streak::score(d), cfg.count));
        let won = win_draw.is_some();
        let running = snapshot.running && !snapshot.won;

        GameState {
            leaderboard: leaderboard::sanitize(snapshot.top3.clone(), cfg.count),
            cfg,
            tries: snapshot.tries,
            elapsed_ms: snapshot.elapsed_ms,
            start_ms: running.then_some(now_ms),
            running,
            last_draw,
            won,
            win_draw,
        }
    }
}

fn fits_config(draw: &[i64], cfg: &Config) -> bool {
    draw.len() == cfg.count as usize && draw.iter().all(|n| (cfg.min..=cfg.max).contains(n))
}

// =============================================================================
// TRANSITIONS
// =============================================================================

/// Replace the whole run (config included) and start it.
pub fn new_game(state: &mut GameState, raw: &RawConfig, now_ms: u64) {
    *state = GameState {
        cfg: config::normalize(raw),
        ..GameState::default()
    };
    clock::start(state, now_ms);
}

/// Resume (or start) the run.
///
/// Resuming after a win always wipes the leaderboard and the win; resuming
/// after a stop wipes it only when `reset_top3` is set. Already running is a
/// no-op. Returns whether the leaderboard was cleared.
pub fn start(state: &mut GameState, reset_top3: bool, now_ms: u64) -> bool {
    let cleared = match state.phase() {
        MatchPhase::Running => return false,
        MatchPhase::Won => {
            state.won = false;
            state.win_draw = None;
            true
        }
        MatchPhase::Setup | MatchPhase::Stopped => reset_top3,
    };

    if cleared {
        state.leaderboard.clear();
    }
    clock::start(state, now_ms);
    cleared
}

/// Pause the run; tries and leaderboard are kept.
pub fn stop(state: &mut GameState, now_ms: u64) {
    clock::stop(state, now_ms);
}

/// Clear the run but keep the config.
pub fn reset(state: &mut GameState, now_ms: u64) {
    clock::stop(state, now_ms);
    *state = GameState {
        cfg: state.cfg.clone(),
        ..GameState::default()
    };
}

/// Change the tick rate. A missing rate keeps the current one.
pub fn set_rate(state: &mut GameState, rate: Option<i64>) {
    state.cfg.rate_per_sec = config::normalize_rate(rate, state.cfg.rate_per_sec);
}

/// One simulation step. Returns `Ok(None)` when the run is not in progress.
///
/// The draw is taken before anything is mutated, so an entropy failure
/// leaves the state exactly as it was.
pub fn tick<E: EntropySource + ?Sized>(
    state: &mut GameState,
    source: &mut E,
    now_ms: u64,
) -> Result<Option<TickOutcome>, String> {
    if state.won || !state.running {
        return Ok(None);
    }

    let numbers = draw::draw(&state.cfg, source)?;
    let best = streak::score(&numbers);
    let win = streak::is_perfect(&best, state.cfg.count);

    state.tries += 1;
    leaderboard::update(&mut state.leaderboard, best, &numbers, state.cfg.count);
    state.last_draw = Some(numbers.clone());

    if win {
        state.won = true;
        state.win_draw = Some(numbers.clone());
        clock::stop(state, now_ms);
    }

    Ok(Some(TickOutcome { numbers, best, win }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{ChaChaSource, FailingSource};
    use crate::types::{Config, LeaderboardEntry};

    fn running_game(count: i64, min: i64, max: i64) -> GameState {
        let mut state = GameState::default();
        new_game(
            &mut state,
            &RawConfig { count: Some(count), min: Some(min), max: Some(max), rate: Some(10) },
            0,
        );
        state
    }

    #[test]
    fn test_new_game_starts_clean_and_running() {
        let mut state = running_game(4, 0, 3);
        state.tries = 17;
        new_game(&mut state, &RawConfig::default(), 2_000);

        assert_eq!(state.cfg, Config::default());
        assert_eq!(state.tries, 0);
        assert!(state.running);
        assert_eq!(state.start_ms, Some(2_000));
        assert_eq!(state.phase(), MatchPhase::Running);
    }

    #[test]
    fn test_tick_noop_when_stopped() {
        let mut state = running_game(4, 0, 3);
        stop(&mut state, 10);
        let out = tick(&mut state, &mut FailingSource, 20).unwrap();
        assert!(out.is_none());
        assert_eq!(state.tries, 0);
    }

    #[test]
    fn test_entropy_failure_leaves_state_untouched() {
        let mut state = running_game(4, 0, 3);
        let before = state.clone();
        assert!(tick(&mut state, &mut FailingSource, 50).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_win_freezes_run() {
        let mut state = running_game(9, 0, 0);
        let out = tick(&mut state, &mut FailingSource, 1_500).unwrap().unwrap();

        assert!(out.win);
        assert_eq!(out.best.count, 9);
        assert!(state.won);
        assert!(!state.running);
        assert_eq!(state.start_ms, None);
        assert_eq!(state.elapsed_ms, 1_500);
        assert_eq!(state.win_draw, Some(vec![0; 9]));
        assert!(state.leaderboard.is_empty());
        assert_eq!(state.phase(), MatchPhase::Won);

        // frozen: further ticks do nothing
        assert!(tick(&mut state, &mut FailingSource, 3_000).unwrap().is_none());
        assert_eq!(state.tries, 1);
    }

    #[test]
    fn test_start_from_stopped_respects_flag() {
        let mut state = running_game(6, 0, 9);
        let mut rng = ChaChaSource::seeded(3);
        for t in 0..20 {
            tick(&mut state, &mut rng, t).unwrap();
        }
        let board = state.leaderboard.clone();
        assert!(!board.is_empty());

        stop(&mut state, 100);
        assert!(!start(&mut state, false, 200));
        assert_eq!(state.leaderboard, board);

        stop(&mut state, 300);
        assert!(start(&mut state, true, 400));
        assert!(state.leaderboard.is_empty());
    }

    #[test]
    fn test_start_while_running_is_noop() {
        let mut state = running_game(6, 0, 9);
        state.leaderboard.push(LeaderboardEntry { count: 2, value: 1, combo: vec![1, 1, 0, 2, 3, 4] });
        assert!(!start(&mut state, true, 999));
        assert_eq!(state.start_ms, Some(0));
        assert_eq!(state.leaderboard.len(), 1);
    }

    #[test]
    fn test_set_rate_only_touches_rate() {
        let mut state = running_game(6, 0, 9);
        let before = state.clone();
        set_rate(&mut state, Some(99));
        assert_eq!(state.cfg.rate_per_sec, 60);
        set_rate(&mut state, None);
        assert_eq!(state.cfg.rate_per_sec, 60);

        state.cfg.rate_per_sec = before.cfg.rate_per_sec;
        assert_eq!(state, before);
    }

    #[test]
    fn test_phase_of_fresh_and_reset_state() {
        let mut state = GameState::default();
        assert_eq!(state.phase(), MatchPhase::Setup);

        state = running_game(5, 0, 9);
        stop(&mut state, 40);
        assert_eq!(state.phase(), MatchPhase::Stopped);

        reset(&mut state, 50);
        assert_eq!(state.phase(), MatchPhase::Setup);
    }

    fn won_snapshot(win_numbers: Option<Vec<i64>>) -> Snapshot {
        let mut state = running_game(3, 0, 0);
        tick(&mut state, &mut FailingSource, 100).unwrap();
        Snapshot { win_numbers, ..state.snapshot(100) }
    }

    #[test]
    fn test_from_snapshot_keeps_genuine_win() {
        let state = GameState::from_snapshot(&won_snapshot(Some(vec![0, 0, 0])), 500);
        assert!(state.won);
        assert!(!state.running);
        assert_eq!(state.win_draw, Some(vec![0, 0, 0]));
        assert_eq!(state.phase(), MatchPhase::Won);
    }

    #[test]
    fn test_from_snapshot_drops_bogus_win() {
        for bogus in [None, Some(vec![0, 0]), Some(vec![0, 0, 0, 0]), Some(vec![5, 5, 5])] {
            let state = GameState::from_snapshot(&won_snapshot(bogus), 500);
            assert!(!state.won);
            assert!(!state.running);
            assert_eq!(state.win_draw, None);
            assert_eq!(state.phase(), MatchPhase::Stopped);
        }

        // mixed values inside the range are not a win either
        let state = running_game(3, 0, 1);
        let snapshot = Snapshot { won: true, win_numbers: Some(vec![0, 1, 0]), ..state.snapshot(0) };
        assert!(!GameState::from_snapshot(&snapshot, 0).won);
    }

    #[test]
    fn test_from_snapshot_drops_last_draw_outside_config() {
        let state = running_game(3, 0, 9);
        let snapshot = Snapshot { last_numbers: Some(vec![1, 2, 30]), ..state.snapshot(10) };
        assert_eq!(GameState::from_snapshot(&snapshot, 10).last_draw, None);

        let snapshot = Snapshot { last_numbers: Some(vec![1, 2, 3]), ..state.snapshot(10) };
        assert_eq!(GameState::from_snapshot(&snapshot, 10).last_draw, Some(vec![1, 2, 3]));
    }
}
