//! Core deterministic primitives.
//!
//! Integer-only arithmetic, seeded randomness and state hashing. Nothing in
//! here reads the clock or touches global state.

pub mod fixed;
pub mod rng;
pub mod hash;
pub mod format;

// Re-export core types
pub use fixed::{Amount, Multiplier, MULT_ONE, CHANCE_SCALE};
pub use rng::{DeterministicRng, RewardRng, derive_user_seed};
pub use hash::{StateHash, compute_state_hash};
pub use format::{SuffixTable, format_number, format_number_with};
