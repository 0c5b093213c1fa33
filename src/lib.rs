//! # Tap Economy Server
//!
//! Deterministic tap-to-earn economy: energy, combos, weighted rewards and
//! progression for an idle/tap game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   TAP ECONOMY SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Basis-point arithmetic                    │
//! │  ├── rng.rs      - Seeded Xorshift128+ reward RNG            │
//! │  ├── hash.rs     - State hashing for verification            │
//! │  └── format.rs   - Compact number formatting                 │
//! │                                                              │
//! │  game/           - Economy rules (deterministic)             │
//! │  ├── config.rs   - Constants and validation                  │
//! │  ├── state.rs    - Per-user state                            │
//! │  ├── energy.rs   - Tap gating and regeneration               │
//! │  ├── combo.rs    - Combo window and day streak               │
//! │  ├── reward.rs   - Tap resolution                            │
//! │  ├── progression.rs - Levels and ranks                       │
//! │  ├── events.rs   - Milestone events                          │
//! │  └── hud.rs      - Display model                             │
//! │                                                              │
//! │  service/        - Hosting (non-deterministic)               │
//! │  ├── clock.rs    - Monotonic and manual clocks               │
//! │  ├── sync.rs     - Snapshots and persistence sinks           │
//! │  └── store.rs    - Per-user locking store                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No floating-point arithmetic in economy logic
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time; callers pass `now`
//! - All randomness from a per-user seeded Xorshift128+
//!
//! Given identical config, seed and tap timestamps, a session produces
//! **identical outcomes and state hashes** on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod service;

// Re-export commonly used types
pub use crate::core::fixed::{Amount, Multiplier, MULT_ONE};
pub use crate::core::format::format_number;
pub use crate::core::rng::{DeterministicRng, RewardRng};
pub use crate::game::config::{GameConfig, ConfigError};
pub use crate::game::reward::{TapEngine, TapOutcome, OutcomeKind};
pub use crate::game::state::{UserState, UserId, Millis};
pub use crate::service::store::{UserStore, StoreError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
