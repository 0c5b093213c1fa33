//! Game Economy Module
//!
//! All economy rules. 100% deterministic given config, seed and timestamps.
//!
//! ## Module Structure
//!
//! - `config`: Economy constants and validation
//! - `state`: Per-user state record
//! - `energy`: Tap gating and regeneration
//! - `combo`: Combo window and day streak
//! - `reward`: Tap resolution and the engine
//! - `progression`: XP levels and rank tiers
//! - `events`: Milestones derived from state diffs
//! - `hud`: Display model

pub mod config;
pub mod state;
pub mod energy;
pub mod combo;
pub mod reward;
pub mod progression;
pub mod events;
pub mod hud;

// Re-export key types
pub use config::{GameConfig, ConfigError};
pub use state::{UserState, UserId, Millis};
pub use combo::StreakChange;
pub use reward::{TapEngine, TapOutcome, OutcomeKind};
pub use progression::{ProgressionSnapshot, RankSnapshot, calculate_level, calculate_rank};
pub use events::{GameEvent, GameEventData};
pub use hud::{HudView, OutcomeBadge};
