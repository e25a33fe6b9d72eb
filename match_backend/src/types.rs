use candid::{CandidType, Deserialize};
use ic_stable_structures::storable::Bound;
use ic_stable_structures::Storable;
use serde::Serialize;
use std::borrow::Cow;

// =============================================================================
// CONSTANTS
// =============================================================================

pub const DEFAULT_COUNT: u32 = 9;
pub const DEFAULT_MIN: i64 = 0;
pub const DEFAULT_MAX: i64 = 9;
pub const DEFAULT_RATE_PER_SEC: u32 = 10;

pub const MIN_COUNT: u32 = 1;
pub const MAX_COUNT: u32 = 50;
pub const VALUE_LIMIT: i64 = 999_999; // min/max live in [-VALUE_LIMIT, VALUE_LIMIT]
pub const MIN_RATE_PER_SEC: u32 = 1;
pub const MAX_RATE_PER_SEC: u32 = 60;

pub const LEADERBOARD_CAPACITY: usize = 30;
pub const MAX_CATCHUP_TICKS: u64 = 20_000; // hard ceiling per catchup call

pub const NANOS_PER_MILLI: u64 = 1_000_000;
pub const SESSION_IDLE_TTL_MS: u64 = 30 * 24 * 60 * 60 * 1_000; // 30 days

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Canonical, always-valid game configuration. Only produced by
/// `config::normalize` (or `config::normalize_rate` for the rate field).
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub count: u32,
    pub min: i64,
    pub max: i64,
    pub rate_per_sec: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
            rate_per_sec: DEFAULT_RATE_PER_SEC,
        }
    }
}

/// Unvalidated configuration as it arrives from a caller. `None` means the
/// parameter was missing or could not be parsed as a number.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RawConfig {
    pub count: Option<i64>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub rate: Option<i64>,
}

// =============================================================================
// DRAW SCORING & LEADERBOARD
// =============================================================================

/// Best same-value run of a draw: how often the most frequent value occurs.
#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreakScore {
    pub count: u32,
    pub value: i64,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub count: u32,
    pub value: i64,
    pub combo: Vec<i64>, // most recent draw that produced this (count, value)
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Everything one player's simulation needs between commands.
///
/// Invariants kept by `game` and `clock`:
/// - `start_ms.is_some() == running`
/// - `won` implies `!running`
/// - `leaderboard` is sorted, deduplicated per (count, value), at most
///   `LEADERBOARD_CAPACITY` long and never holds a perfect match
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct GameState {
    pub cfg: Config,
    pub tries: u64,
    pub elapsed_ms: u64, // accumulated while stopped; live part derives from start_ms
    pub start_ms: Option<u64>,
    pub running: bool,
    pub last_draw: Option<Vec<i64>>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub won: bool,
    pub win_draw: Option<Vec<i64>>,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchPhase {
    Setup,
    Running,
    Stopped,
    Won,
}

/// Outcome of a single tick that actually ran.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct TickOutcome {
    pub numbers: Vec<i64>,
    pub best: StreakScore,
    pub win: bool,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CatchUpOutcome {
    pub processed: u64,
    pub numbers: Option<Vec<i64>>,
    pub best: Option<StreakScore>,
    pub win: bool,
}

// =============================================================================
// REPLIES
// =============================================================================

/// Consumer-visible view of a GameState. Sufficient to rebuild the state
/// (see `GameState::from_snapshot`).
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub ok: bool,
    pub cfg: Config,
    pub running: bool,
    pub won: bool,
    pub tries: u64,
    pub elapsed_ms: u64,
    pub last_numbers: Option<Vec<i64>>,
    pub top3: Vec<LeaderboardEntry>,
    pub win_numbers: Option<Vec<i64>>,
}

/// Snapshot plus the command-specific fields. Extras a command does not set
/// are left out of the JSON form entirely.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct CommandReply {
    pub ok: bool,
    pub cfg: Config,
    pub running: bool,
    pub won: bool,
    pub tries: u64,
    pub elapsed_ms: u64,
    pub last_numbers: Option<Vec<i64>>,
    pub top3: Vec<LeaderboardEntry>,
    pub win_numbers: Option<Vec<i64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_updated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_top3_applied: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catchup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbers: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best: Option<StreakScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win: Option<bool>,
}

impl From<Snapshot> for CommandReply {
    fn from(s: Snapshot) -> Self {
        Self {
            ok: s.ok,
            cfg: s.cfg,
            running: s.running,
            won: s.won,
            tries: s.tries,
            elapsed_ms: s.elapsed_ms,
            last_numbers: s.last_numbers,
            top3: s.top3,
            win_numbers: s.win_numbers,
            error: None,
            started: None,
            mode: None,
            rate_updated: None,
            reset_top3_applied: None,
            stopped: None,
            reset: None,
            tick: None,
            catchup: None,
            processed: None,
            remaining: None,
            numbers: None,
            best: None,
            win: None,
        }
    }
}

impl CommandReply {
    pub fn with_tick(mut self, outcome: Option<TickOutcome>) -> Self {
        match outcome {
            Some(o) => {
                self.tick = Some(true);
                self.numbers = Some(o.numbers);
                self.best = Some(o.best);
                self.win = Some(o.win);
            }
            None => self.tick = Some(false),
        }
        self
    }

    pub fn with_catchup(mut self, outcome: Option<CatchUpOutcome>) -> Self {
        match outcome {
            Some(o) => {
                self.catchup = Some(true);
                self.processed = Some(o.processed);
                self.numbers = o.numbers;
                self.best = o.best;
                self.win = Some(o.win);
            }
            None => self.catchup = Some(false),
        }
        self
    }
}

// =============================================================================
// STORAGE RECORDS
// =============================================================================

/// A player's GameState as kept in stable memory, stamped with the last time
/// any command touched it (drives idle-session purging).
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct StoredSession {
    pub state: GameState,
    pub touched_ms: u64,
}

impl Storable for StoredSession {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(
            serde_json::to_vec(self)
                .expect("CRITICAL: Failed to encode StoredSession for stable storage"),
        )
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        serde_json::from_slice(&bytes).expect(
            "CRITICAL: Failed to decode StoredSession from stable storage. \
             This indicates storage corruption or an incompatible canister upgrade.",
        )
    }

    const BOUND: Bound = Bound::Unbounded;
}

#[derive(Clone, Debug, Serialize, Deserialize, CandidType, Default, PartialEq, Eq)]
pub struct RandomnessSeed {
    pub current_seed: [u8; 32],
    pub creation_time: u64,
    pub games_used: u64,
    pub max_games: u64,
    pub nonce: u64,
}

impl Storable for RandomnessSeed {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(
            serde_json::to_vec(self)
                .expect("CRITICAL: Failed to encode RandomnessSeed for stable storage"),
        )
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        serde_json::from_slice(&bytes)
            .expect("CRITICAL: Failed to decode RandomnessSeed from stable storage")
    }

    const BOUND: Bound = Bound::Bounded {
        max_size: 512,
        is_fixed_size: false,
    };
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed_hash: String,
    pub games_used: u64,
    pub creation_time: u64,
}
