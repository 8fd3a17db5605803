//! Candidate selection: uniform shuffle-and-take over an eligible pool.
//!
//! The RNG is a parameter rather than hidden state so tests can drive the
//! draw with a seeded [`rand::rngs::StdRng`] while production callers pass
//! `rand::thread_rng()`. Selection itself is independent of storage order:
//! the pool is permuted before anything is taken.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::User;

/// Number of reviewers drawn at PR creation.
pub const INITIAL_REVIEWERS: usize = 2;

/// Draw up to `limit` candidates from `pool`, uniformly at random.
///
/// Returns an empty vector for an empty pool — whether that is fatal is the
/// caller's decision. The result is a uniformly random subset in uniformly
/// random order; no fairness guarantee beyond the uniform shuffle.
pub fn pick_candidates<R: Rng>(mut pool: Vec<User>, limit: usize, rng: &mut R) -> Vec<User> {
    pool.shuffle(rng);
    pool.truncate(limit);
    pool
}
