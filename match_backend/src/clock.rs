//! Running-time accounting without a live counter between commands.
//!
//! Time is stored as an accumulated total plus the start of the current run.
//! Callers pass `now_ms` in; a clock that goes backwards contributes nothing.

use crate::types::GameState;

/// Total running time: accumulated time plus the current run, if any.
pub fn elapsed(state: &GameState, now_ms: u64) -> u64 {
    state.elapsed_ms.saturating_add(current_run(state, now_ms))
}

/// Begin a run. No-op while already running.
pub fn start(state: &mut GameState, now_ms: u64) {
    if state.running {
        return;
    }
    state.running = true;
    state.start_ms = Some(now_ms);
}

/// End the current run, folding it into the accumulated total. No-op when
/// not running.
pub fn stop(state: &mut GameState, now_ms: u64) {
    if !state.running {
        return;
    }
    state.elapsed_ms = state.elapsed_ms.saturating_add(current_run(state, now_ms));
    state.running = false;
    state.start_ms = None;
}

fn current_run(state: &GameState, now_ms: u64) -> u64 {
    match (state.running, state.start_ms) {
        (true, Some(start)) => now_ms.saturating_sub(start),
        _ => 0,
    }
}
