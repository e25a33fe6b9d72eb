use crate::draw::EntropySource;
use crate::memory_ids::{LAST_ROTATION_MEMORY_ID, SEED_STATE_MEMORY_ID};
use crate::types::{RandomnessSeed, SeedInfo};
use crate::Memory;
use ic_cdk::management_canister::raw_rand;
use ic_stable_structures::memory_manager::MemoryId;
use ic_stable_structures::StableCell;
use sha2::{Digest, Sha256};
use std::cell::RefCell;

// =============================================================================
// CONSTANTS
// =============================================================================

pub const SEED_ROTATION_INTERVAL_NS: u64 = 300_000_000_000; // 5 minutes in nanoseconds
pub const MAX_GAMES_PER_SEED: u64 = 10_000; // Rotate after 10k draw commands
pub const MIN_ROTATION_GAP_NS: u64 = 10_000_000_000; // 10 seconds between rotations

pub const SEED_NOT_READY: &str = "Randomness seed initializing, please retry in a moment";

// =============================================================================
// THREAD-LOCAL STORAGE
// =============================================================================

thread_local! {
    static SEED_STATE: RefCell<Option<RandomnessSeed>> = const { RefCell::new(None) };
    static SEED_INIT_LOCK: RefCell<bool> = const { RefCell::new(false) };

    static SEED_CELL: RefCell<StableCell<RandomnessSeed, Memory>> = RefCell::new(
        StableCell::init(
            crate::MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(SEED_STATE_MEMORY_ID))),
            RandomnessSeed::default()
        )
    );

    static LAST_ROTATION_CELL: RefCell<StableCell<u64, Memory>> = RefCell::new(
        StableCell::init(
            crate::MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(LAST_ROTATION_MEMORY_ID))),
            0u64
        )
    );
}

// =============================================================================
// SEED LIFECYCLE
// =============================================================================

/// Fetch VRF bytes and install the first seed. Concurrent callers return
/// immediately; a failed `raw_rand` leaves the seed unset so the next draw
/// command schedules another attempt.
pub async fn initialize_seed() {
    if SEED_INIT_LOCK.with(|lock| *lock.borrow()) {
        return;
    }
    if SEED_STATE.with(|s| s.borrow().is_some()) {
        return;
    }
    SEED_INIT_LOCK.with(|lock| *lock.borrow_mut() = true);

    match raw_rand().await {
        Ok(bytes) => {
            let now = ic_cdk::api::time();
            install_seed(seed_from_entropy(&bytes, now), now);
            ic_cdk::println!("Randomness seed initialized at {}", now);
        }
        Err(e) => ic_cdk::println!("Seed initialization failed: {:?}", e),
    }

    SEED_INIT_LOCK.with(|lock| *lock.borrow_mut() = false);
}

/// Restore seed state from stable storage (called in post_upgrade).
pub fn restore_seed_state() {
    let seed = SEED_CELL.with(|cell| cell.borrow().get().clone());
    if seed.creation_time > 0 {
        SEED_STATE.with(|s| *s.borrow_mut() = Some(seed));
    }
}

/// Make `seed` the active seed, persisting it and the rotation timestamp.
pub fn install_seed(seed: RandomnessSeed, now: u64) {
    SEED_STATE.with(|s| *s.borrow_mut() = Some(seed.clone()));
    SEED_CELL.with(|cell| {
        cell.borrow_mut().set(seed);
    });
    LAST_ROTATION_CELL.with(|cell| {
        cell.borrow_mut().set(now);
    });
}

pub fn seed_from_entropy(random_bytes: &[u8], now: u64) -> RandomnessSeed {
    let mut hasher = Sha256::new();
    hasher.update(random_bytes);
    RandomnessSeed {
        current_seed: hasher.finalize().into(),
        creation_time: now,
        games_used: 0,
        max_games: MAX_GAMES_PER_SEED,
        nonce: 0,
    }
}

pub fn needs_rotation(seed: &RandomnessSeed, now: u64) -> bool {
    seed.games_used >= seed.max_games
        || now.saturating_sub(seed.creation_time) >= SEED_ROTATION_INTERVAL_NS
}

/// Check if the seed is missing or stale and schedule the fix if so.
pub fn maybe_schedule_seed_rotation() {
    let needs_init = SEED_STATE.with(|s| s.borrow().is_none());
    if needs_init {
        ic_cdk::futures::spawn(async {
            initialize_seed().await;
        });
        return;
    }

    let now = ic_cdk::api::time();
    let should_rotate = SEED_STATE.with(|s| {
        s.borrow().as_ref().map(|seed| needs_rotation(seed, now)).unwrap_or(false)
    });

    if should_rotate {
        ic_cdk::futures::spawn(async {
            rotate_seed_async().await;
        });
    }
}

pub async fn rotate_seed_async() {
    let last_rotation = LAST_ROTATION_CELL.with(|cell| *cell.borrow().get());
    let now = ic_cdk::api::time();
    if now.saturating_sub(last_rotation) < MIN_ROTATION_GAP_NS {
        return;
    }

    match raw_rand().await {
        Ok(bytes) => {
            let now = ic_cdk::api::time();
            install_seed(seed_from_entropy(&bytes, now), now);
            ic_cdk::println!("Seed rotated successfully at {}", now);
        }
        // Keep drawing from the current seed; the next command retries.
        Err(e) => ic_cdk::println!("Seed rotation failed: {:?}", e),
    }
}

// =============================================================================
// DRAW STREAMS
// =============================================================================

/// Reserve a fresh nonce on the active seed and return the entropy stream for
/// one command. Fails while no seed has been installed.
pub fn open_stream() -> Result<SeedStream, String> {
    let (seed, nonce) = SEED_STATE.with(|s| {
        let mut state = s.borrow_mut();
        let seed_state = state.as_mut().ok_or(SEED_NOT_READY)?;

        seed_state.nonce += 1;
        seed_state.games_used += 1;

        SEED_CELL.with(|cell| {
            cell.borrow_mut().set(seed_state.clone());
        });

        Ok::<_, String>((seed_state.current_seed, seed_state.nonce))
    })?;

    Ok(SeedStream::new(seed, nonce))
}

/// Deterministic word stream: SHA-256(seed || nonce || block), four words per
/// block. Distinct nonces give independent streams under one seed.
pub struct SeedStream {
    seed: [u8; 32],
    nonce: u64,
    block: u64,
    buf: [u8; 32],
    pos: usize,
}

impl SeedStream {
    pub fn new(seed: [u8; 32], nonce: u64) -> Self {
        Self { seed, nonce, block: 0, buf: [0u8; 32], pos: 32 }
    }

    fn refill(&mut self) {
        let mut hasher = Sha256::new();
        hasher.update(self.seed);
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(self.block.to_be_bytes());
        self.buf = hasher.finalize().into();
        self.block += 1;
        self.pos = 0;
    }
}

impl EntropySource for SeedStream {
    fn next_u64(&mut self) -> Result<u64, String> {
        if self.pos + 8 > self.buf.len() {
            self.refill();
        }
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.buf[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(u64::from_be_bytes(word))
    }
}

/// Opens a `SeedStream` on the first word requested, so commands that end up
/// drawing nothing (stopped runs, single-value ranges) never touch the seed.
#[derive(Default)]
pub struct LazyStream {
    inner: Option<SeedStream>,
}

impl EntropySource for LazyStream {
    fn next_u64(&mut self) -> Result<u64, String> {
        if self.inner.is_none() {
            self.inner = Some(open_stream()?);
        }
        match self.inner.as_mut() {
            Some(stream) => stream.next_u64(),
            None => Err(SEED_NOT_READY.to_string()),
        }
    }
}

// =============================================================================
// QUERIES
// =============================================================================

/// Public fingerprint of the active seed. The seed itself never leaves the
/// canister, so upcoming draws cannot be computed by a client.
pub fn get_seed_info() -> Option<SeedInfo> {
    SEED_STATE.with(|s| {
        s.borrow().as_ref().map(|seed| {
            let mut hasher = Sha256::new();
            hasher.update(seed.current_seed);
            SeedInfo {
                seed_hash: hex::encode(hasher.finalize()),
                games_used: seed.games_used,
                creation_time: seed.creation_time,
            }
        })
    })
}
