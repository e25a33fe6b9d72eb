//! Random Match Backend
//!
//! **Game:**
//! Every tick draws `count` integers uniformly from `[min, max]` and scores
//! the draw by its most frequent value. Near misses are ranked on a 30-entry
//! leaderboard; a perfect draw (all values equal) freezes the run until the
//! player resumes it.
//!
//! **Sessions:**
//! Each caller principal owns one independent GameState in stable memory.
//! Commands are serialized per principal and persist only when they succeed.
//!
//! **Randomness:**
//! IC VRF (raw_rand) seeds a SHA-256 stream; one nonce per draw command.
//! Draw commands fail (state untouched) until the first seed is installed.

use candid::Principal;
use ic_cdk::{init, post_upgrade, pre_upgrade, query, update};
use ic_stable_structures::memory_manager::{MemoryManager, VirtualMemory};
use ic_stable_structures::DefaultMemoryImpl;
use std::cell::RefCell;

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================

pub mod catchup;
pub mod clock;
pub mod command;
pub mod config;
pub mod draw;
pub mod game;
pub mod guard;
pub mod leaderboard;
pub mod memory_ids;
pub mod seed;
pub mod session;
pub mod streak;
pub mod types;

#[cfg(test)]
mod tests;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use command::Command;
pub use types::{CommandReply, Config, GameState, LeaderboardEntry, RawConfig, Snapshot, StreakScore};

// =============================================================================
// MEMORY MANAGEMENT
// =============================================================================

pub type Memory = VirtualMemory<DefaultMemoryImpl>;

thread_local! {
    pub static MEMORY_MANAGER: RefCell<MemoryManager<DefaultMemoryImpl>> =
        RefCell::new(MemoryManager::init(DefaultMemoryImpl::default()));
}

// =============================================================================
// LIFECYCLE HOOKS
// =============================================================================

#[init]
fn init() {
    ic_cdk::println!("Random Match Backend Initialized");
    session::start_purge_timer();

    // Seed the draw stream right away so the first tick does not have to wait
    ic_cdk_timers::set_timer(std::time::Duration::ZERO, async {
        seed::initialize_seed().await;
    });
}

#[pre_upgrade]
fn pre_upgrade() {
    ic_cdk::println!("Pre-upgrade: sessions and seed persist in stable memory");
}

#[post_upgrade]
fn post_upgrade() {
    seed::restore_seed_state();
    session::start_purge_timer();

    // No-op when a seed was restored
    ic_cdk_timers::set_timer(std::time::Duration::ZERO, async {
        seed::initialize_seed().await;
    });

    ic_cdk::println!("Post-upgrade: seed restored, timers restarted");
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

fn now_ms() -> u64 {
    ic_cdk::api::time() / types::NANOS_PER_MILLI
}

async fn run(command: Command) -> Result<CommandReply, String> {
    let caller = ic_cdk::api::msg_caller();
    let _guard = guard::SessionGuard::new(caller)?;

    if command.draws() {
        seed::initialize_seed().await;
        seed::maybe_schedule_seed_rotation();
    }

    let now = now_ms();
    let mut source = seed::LazyStream::default();

    if command.is_read_only() {
        let mut state = session::load(caller);
        return command::execute(&mut state, &command, &mut source, now);
    }

    let reply = session::update_session(caller, now, |state| {
        command::execute(state, &command, &mut source, now)
    })?;

    log_outcome(caller, &reply);
    Ok(reply)
}

fn log_outcome(caller: Principal, reply: &CommandReply) {
    if reply.win == Some(true) {
        ic_cdk::println!(
            "Perfect match for {} after {} tries ({} ms)",
            caller, reply.tries, reply.elapsed_ms
        );
    }
    if reply.processed == Some(types::MAX_CATCHUP_TICKS) {
        ic_cdk::println!("Catch-up for {} hit the {} tick ceiling", caller, types::MAX_CATCHUP_TICKS);
    }
}

// =============================================================================
// GAME ENDPOINTS
// =============================================================================

#[query]
fn status() -> CommandReply {
    let caller = ic_cdk::api::msg_caller();
    session::read_session(caller, |state| CommandReply::from(state.snapshot(now_ms())))
}

#[update]
async fn new_game(cfg: RawConfig) -> Result<CommandReply, String> {
    run(Command::NewGame(cfg)).await
}

#[update]
async fn set_rate(rate: Option<i64>) -> Result<CommandReply, String> {
    run(Command::SetRate(rate)).await
}

/// Resume the run. `reset_top3` defaults to true when omitted.
#[update]
async fn start(reset_top3: Option<bool>) -> Result<CommandReply, String> {
    run(Command::Start { reset_top3: reset_top3.unwrap_or(true) }).await
}

#[update]
async fn stop() -> Result<CommandReply, String> {
    run(Command::Stop).await
}

#[update]
async fn reset() -> Result<CommandReply, String> {
    run(Command::Reset).await
}

#[update]
async fn tick() -> Result<CommandReply, String> {
    run(Command::Tick).await
}

#[update]
async fn catchup(ticks: i64) -> Result<CommandReply, String> {
    run(Command::CatchUp { ticks }).await
}

#[update]
async fn catchup_for_elapsed(away_ms: u64) -> Result<CommandReply, String> {
    run(Command::CatchUpElapsed { away_ms }).await
}

/// Generic entry point: action name plus string parameters, parsed leniently.
#[update]
async fn command(action: String, params: Vec<(String, String)>) -> Result<CommandReply, String> {
    run(Command::parse(&action, &params)).await
}

// =============================================================================
// SESSION ENDPOINTS
// =============================================================================

/// Replace the caller's state with one rebuilt from a snapshot.
#[update]
fn import_snapshot(snapshot: Snapshot) -> Result<CommandReply, String> {
    let caller = ic_cdk::api::msg_caller();
    let _guard = guard::SessionGuard::new(caller)?;
    let now = now_ms();

    session::update_session(caller, now, |state| {
        *state = GameState::from_snapshot(&snapshot, now);
        Ok(CommandReply::from(state.snapshot(now)))
    })
}

#[update]
fn end_session() -> Result<bool, String> {
    let caller = ic_cdk::api::msg_caller();
    let _guard = guard::SessionGuard::new(caller)?;
    Ok(session::end_session(caller))
}

#[query]
fn get_session_count() -> u64 {
    session::session_count()
}

// =============================================================================
// RANDOMNESS ENDPOINTS
// =============================================================================

#[query]
fn get_seed_info() -> Option<types::SeedInfo> {
    seed::get_seed_info()
}
