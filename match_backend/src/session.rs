//! Per-player GameState storage.
//!
//! Each principal owns one independent state. A command loads the state,
//! mutates a copy and writes it back only when the command succeeded, so a
//! failed tick or catchup never leaves a half-applied state behind.

use crate::memory_ids::SESSIONS_MEMORY_ID;
use crate::types::{GameState, StoredSession, NANOS_PER_MILLI, SESSION_IDLE_TTL_MS};
use crate::Memory;
use candid::Principal;
use ic_stable_structures::memory_manager::MemoryId;
use ic_stable_structures::StableBTreeMap;
use std::cell::RefCell;
use std::time::Duration;

const PURGE_INTERVAL_SECS: u64 = 86_400;

thread_local! {
    static SESSIONS: RefCell<StableBTreeMap<Principal, StoredSession, Memory>> = RefCell::new(
        StableBTreeMap::init(
            crate::MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(SESSIONS_MEMORY_ID)))
        )
    );
}

/// The player's state, or a fresh default state if none is stored.
pub fn load(player: Principal) -> GameState {
    SESSIONS.with(|s| s.borrow().get(&player).map(|stored| stored.state).unwrap_or_default())
}

/// Run a read-only view over the player's state without persisting anything.
pub fn read_session<T>(player: Principal, f: impl FnOnce(&GameState) -> T) -> T {
    f(&load(player))
}

/// Run a command against the player's state and persist the result on success.
pub fn update_session<T>(
    player: Principal,
    now_ms: u64,
    f: impl FnOnce(&mut GameState) -> Result<T, String>,
) -> Result<T, String> {
    let mut state = load(player);
    let out = f(&mut state)?;
    SESSIONS.with(|s| {
        s.borrow_mut().insert(player, StoredSession { state, touched_ms: now_ms });
    });
    Ok(out)
}

/// Forget the player's state. Returns whether anything was stored.
pub fn end_session(player: Principal) -> bool {
    SESSIONS.with(|s| s.borrow_mut().remove(&player).is_some())
}

pub fn session_count() -> u64 {
    SESSIONS.with(|s| s.borrow().len())
}

/// Drop every session not touched within `ttl_ms` of `now_ms`.
pub fn purge_idle_sessions(now_ms: u64, ttl_ms: u64) -> u64 {
    let stale: Vec<Principal> = SESSIONS.with(|s| {
        s.borrow()
            .iter()
            .filter(|entry| now_ms.saturating_sub(entry.value().touched_ms) >= ttl_ms)
            .map(|entry| *entry.key())
            .collect()
    });

    SESSIONS.with(|s| {
        let mut sessions = s.borrow_mut();
        for player in &stale {
            sessions.remove(player);
        }
    });

    stale.len() as u64
}

/// Daily sweep of sessions idle for longer than `SESSION_IDLE_TTL_MS`.
pub fn start_purge_timer() {
    ic_cdk_timers::set_timer_interval(Duration::from_secs(PURGE_INTERVAL_SECS), || async {
        let now_ms = ic_cdk::api::time() / NANOS_PER_MILLI;
        let purged = purge_idle_sessions(now_ms, SESSION_IDLE_TTL_MS);
        if purged > 0 {
            ic_cdk::println!("Purged {} idle sessions", purged);
        }
    });
}
