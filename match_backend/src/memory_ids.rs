//! Central registry for stable memory IDs.
//!
//! IMPORTANT: All memory IDs must be unique across the entire canister.
//!
//! Allocation strategy:
//! - 0-9: Randomness (seed, rotation timestamp)
//! - 10-19: Player sessions

// Randomness (0-9)
pub const SEED_STATE_MEMORY_ID: u8 = 1;
pub const LAST_ROTATION_MEMORY_ID: u8 = 2;

// Player sessions (10-19)
pub const SESSIONS_MEMORY_ID: u8 = 10;
