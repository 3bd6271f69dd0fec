//! Seedable randomness helpers.
//!
//! Every island owns its own `StdRng`; there is no process-wide generator.

use rand::prelude::*;
use rand::rngs::StdRng;

/// Creates a seeded RNG from an optional seed.
pub fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::seed_from_u64(rand::random::<u64>()),
    }
}

/// Derives the RNG of one island from the user seed.
///
/// Islands must not share random streams, so the seed is offset by the island
/// rank: `seed * island_count + island_rank`.
pub fn island_rng(seed: u64, island_count: usize, island_rank: usize) -> StdRng {
    StdRng::seed_from_u64(
        seed.wrapping_mul(island_count as u64)
            .wrapping_add(island_rank as u64),
    )
}

/// Returns a fresh random permutation of `0..n`.
pub fn random_permutation(n: usize, rng: &mut StdRng) -> Vec<usize> {
    let mut permutation: Vec<usize> = (0..n).collect();
    permutation.shuffle(rng);
    permutation
}
