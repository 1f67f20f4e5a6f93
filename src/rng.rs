//! Seeded randomness carried inside the game state.
//!
//! All dice, deck shuffles and territory shuffles draw from one ChaCha8
//! stream. AI candidate choices draw from a second stream derived from the
//! same seed, so replaying a command journal reproduces every dice roll
//! without re-running the AI.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Stream used by the rules (dice, deck, random distribution).
pub const RULES_STREAM: u64 = 0;

/// Stream used by AI candidate selection.
pub const AI_STREAM: u64 = 1;

/// Deterministic random source stored in game snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRng {
    inner: ChaCha8Rng,
}

impl GameRng {
    /// Create the rules stream for `seed`.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::stream(seed, RULES_STREAM)
    }

    /// Create an independent stream for `seed`.
    #[must_use]
    pub fn stream(seed: u64, stream: u64) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(seed);
        inner.set_stream(stream);
        Self { inner }
    }

    /// Roll one six-sided die.
    pub fn roll_die(&mut self) -> u8 {
        self.inner.gen_range(1..=6)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }

    /// Pick a uniform index into a collection of `len` items.
    ///
    /// Returns `None` for an empty collection.
    pub fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.inner.gen_range(0..len))
        }
    }
}
