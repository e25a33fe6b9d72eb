// Shared entropy fixtures plus cross-module engine suites.
//
// Module-level unit tests live next to their code; the suites here drive the
// engine end to end through several modules at once.

use crate::draw::EntropySource;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;


/// Reproducible entropy for tests that need realistic draws.
pub struct ChaChaSource(ChaCha8Rng);

impl ChaChaSource {
    pub fn seeded(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl EntropySource for ChaChaSource {
    fn next_u64(&mut self) -> Result<u64, String> {
        Ok(self.0.next_u64())
    }
}

/// Entropy that is never available.
pub struct FailingSource;

impl EntropySource for FailingSource {
    fn next_u64(&mut self) -> Result<u64, String> {
        Err("entropy unavailable".to_string())
    }
}

/// Replays a fixed word list, then fails.
pub struct ScriptedSource {
    words: Vec<u64>,
    pos: usize,
}

impl ScriptedSource {
    pub fn new(words: Vec<u64>) -> Self {
        Self { words, pos: 0 }
    }

    pub fn consumed(&self) -> usize {
        self.pos
    }
}

impl EntropySource for ScriptedSource {
    fn next_u64(&mut self) -> Result<u64, String> {
        let word = self
            .words
            .get(self.pos)
            .copied()
            .ok_or_else(|| "scripted entropy exhausted".to_string())?;
        self.pos += 1;
        Ok(word)
    }
}
