//! Deterministic Random Number Generator
//!
//! Uses the Xorshift128+ family for fast, high-quality, deterministic randomness.
//! Given the same seed, produces identical sequence on all platforms.
//!
//! Reward draws go through the [`RewardRng`] trait so tests and hosts can
//! inject any seedable source.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

use super::fixed::CHANCE_SCALE;

/// Source of randomness for critical/jackpot draws.
///
/// Implementors must be deterministic for a given seed; the engine never
/// reaches for a global random source.
pub trait RewardRng {
    /// Next raw 64-bit value.
    fn next_u64(&mut self) -> u64;

    /// Uniform integer in `[0, max)`. Returns 0 for `max == 0`.
    fn next_below(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // Modulo bias is negligible for max <= 2^32 over a 64-bit draw
        (self.next_u64() % max as u64) as u32
    }

    /// Chance roll in `[0, CHANCE_SCALE)` basis points.
    fn roll_chance(&mut self) -> u32 {
        self.next_below(CHANCE_SCALE)
    }
}

/// Deterministic PRNG using Xorshift128+ algorithm.
///
/// # Determinism Guarantee
///
/// Given the same seed, this RNG will produce the exact same sequence
/// of random numbers on any platform.
///
/// # Example
///
/// ```
/// use tap_economy::core::rng::{DeterministicRng, RewardRng};
///
/// let mut a = DeterministicRng::new(12345);
/// let mut b = DeterministicRng::new(12345);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Create RNG for one user from the server's master seed.
    pub fn for_user(master_seed: u64, user_id: &[u8; 16]) -> Self {
        Self::new(derive_user_seed(master_seed, user_id))
    }
}

impl RewardRng for DeterministicRng {
    #[inline]
    fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }
}

impl<R: RewardRng + ?Sized> RewardRng for &mut R {
    #[inline]
    fn next_u64(&mut self) -> u64 {
        (**self).next_u64()
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive a per-user seed from the server's master seed.
///
/// Each user gets an independent stream, so one user's taps never shift
/// another user's outcome sequence.
pub fn derive_user_seed(master_seed: u64, user_id: &[u8; 16]) -> u64 {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(b"TAP_ECONOMY_SEED_V1");
    hasher.update(master_seed.to_le_bytes());
    hasher.update(user_id);

    let hash = hasher.finalize();

    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(seed)
}

// =============================================================================
// TESTS
// =============================================================================
