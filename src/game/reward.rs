//! Reward Engine
//!
//! Resolves a single tap: energy gate, combo update, weighted outcome draw,
//! reward computation and the state mutation. This is the only place
//! currency enters the economy.
//!
//! ## Tap pipeline
//!
//! ```text
//! try_consume ──fail──▶ { success: false, earned: 0, kind: Normal }
//!      │
//!      ▼
//! register_tap (combo) ─▶ draw_kind (rng) ─▶ earned = round(base × kind × combo/streak)
//!      │
//!      ▼
//! balance += earned, total_earned += earned, xp += earned × ratio
//! ```
//!
//! ## Determinism
//!
//! Given the same config, RNG seed and sequence of `now` values, `tap`
//! produces the same outcomes and the same final state. No floating point,
//! no system time, no global randomness.

use chrono::NaiveDate;
use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::core::fixed::{Amount, Multiplier, MULT_ONE, apply_multiplier, scale_twice};
use crate::core::format::format_number_with;
use crate::core::rng::{DeterministicRng, RewardRng};
use crate::game::combo::{self, StreakChange};
use crate::game::config::{ConfigError, GameConfig};
use crate::game::energy;
use crate::game::progression::{self, ProgressionSnapshot, RankSnapshot};
use crate::game::state::{Millis, UserId, UserState};

/// Kind of tap outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
#[derive(Default)]
pub enum OutcomeKind {
    /// Plain tap
    #[default]
    Normal = 0,
    /// Rare boosted tap
    Critical = 1,
    /// Rarest, largest payout
    Jackpot = 2,
}

impl OutcomeKind {
    /// Reward multiplier for this kind.
    pub fn multiplier(self, config: &GameConfig) -> Multiplier {
        match self {
            OutcomeKind::Normal => MULT_ONE,
            OutcomeKind::Critical => config.critical.multiplier,
            OutcomeKind::Jackpot => config.jackpot.multiplier,
        }
    }

    /// Lowercase name used on the wire and in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeKind::Normal => "normal",
            OutcomeKind::Critical => "critical",
            OutcomeKind::Jackpot => "jackpot",
        }
    }
}

/// Result of a tap. Ephemeral, never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapOutcome {
    /// Whether energy allowed the tap
    pub success: bool,
    /// Currency credited
    pub earned: Amount,
    /// Outcome kind
    pub kind: OutcomeKind,
}

impl TapOutcome {
    /// The outcome of a tap with no energy left.
    pub const EXHAUSTED: TapOutcome = TapOutcome {
        success: false,
        earned: 0,
        kind: OutcomeKind::Normal,
    };
}

/// Weighted draw: jackpot band first, then critical, else normal.
pub fn draw_kind<R: RewardRng>(rng: &mut R, config: &GameConfig) -> OutcomeKind {
    let roll = rng.roll_chance();
    let jackpot_band = config.jackpot.chance;
    let critical_band = jackpot_band.saturating_add(config.critical.chance);

    if roll < jackpot_band {
        OutcomeKind::Jackpot
    } else if roll < critical_band {
        OutcomeKind::Critical
    } else {
        OutcomeKind::Normal
    }
}

/// Reward for a tap of `kind` at the given combo and streak.
pub fn compute_earned(kind: OutcomeKind, combo: u32, streak: u32, config: &GameConfig) -> Amount {
    scale_twice(
        config.base_tap_value,
        kind.multiplier(config),
        combo::multiplier(combo, streak, config),
    )
}

/// XP granted for `earned` currency.
#[inline]
pub fn xp_from_earned(earned: Amount, config: &GameConfig) -> Amount {
    apply_multiplier(earned, config.xp_per_earned)
}

/// Resolve one tap against `state`.
///
/// Energy exhaustion is the only failure and is not an error: the state is
/// left untouched and `TapOutcome::EXHAUSTED` is returned.
pub fn tap<R: RewardRng>(
    state: &mut UserState,
    now: Millis,
    config: &GameConfig,
    rng: &mut R,
) -> TapOutcome {
    // 1. Energy gate
    let was_full = state.taps_left >= state.energy_limit;
    if !energy::try_consume(state) {
        return TapOutcome::EXHAUSTED;
    }
    // Recharge starts from the first spend, not from when the bar filled
    if was_full {
        state.last_regen_at = state.last_regen_at.max(now);
    }

    // 2. Combo against now (streak is read-only here)
    let combo = combo::register_tap(state, now, config);

    // 3. Weighted outcome
    let kind = draw_kind(rng, config);

    // 4. Reward
    let earned = compute_earned(kind, combo, state.streak, config);

    // 5. Apply
    state.credit(earned, xp_from_earned(earned, config), now);

    #[cfg(feature = "debug-tracing")]
    debug!("Tap by {}: {} at combo {} earned {} ({} taps left)",
           state.user_id.short(), kind.as_str(), combo, earned, state.taps_left);

    TapOutcome { success: true, earned, kind }
}

// =============================================================================
// ENGINE
// =============================================================================

/// A validated config paired with an injected random source.
///
/// Construction fails on an invalid config, so a running engine never sees
/// a malformed curve or table mid-tap.
#[derive(Clone, Debug)]
pub struct TapEngine<R: RewardRng = DeterministicRng> {
    config: GameConfig,
    rng: R,
}

impl TapEngine<DeterministicRng> {
    /// Engine with a seeded deterministic RNG.
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, DeterministicRng::new(seed))
    }
}

impl<R: RewardRng> TapEngine<R> {
    /// Validate the config and build an engine around `rng`.
    pub fn new(config: GameConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, rng })
    }

    /// The engine's config.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Fresh state for a new session.
    pub fn new_user(&self, user_id: UserId, now: Millis) -> UserState {
        UserState::new(user_id, &self.config, now)
    }

    /// Resolve a tap. See [`tap`].
    pub fn tap(&mut self, state: &mut UserState, now: Millis) -> TapOutcome {
        let outcome = tap(state, now, &self.config, &mut self.rng);
        if outcome.success && combo::is_combo_hot(state.combo, &self.config) {
            debug!("User {} combo hot at {}", state.user_id.short(), state.combo);
        }
        outcome
    }

    /// Regenerate energy. See [`energy::regen`].
    pub fn regen(&self, state: &mut UserState, now: Millis) -> u32 {
        energy::regen(state, now, &self.config)
    }

    /// Session-boundary signal. See [`combo::record_session`].
    pub fn begin_session(&self, state: &mut UserState, day: NaiveDate) -> StreakChange {
        let change = combo::record_session(state, day);
        if change == StreakChange::Stale {
            warn!("Dropped stale session signal for {} ({})", state.user_id.short(), day);
        }
        change
    }

    /// Level view for `xp`.
    pub fn calculate_level(&self, xp: Amount) -> ProgressionSnapshot {
        progression::calculate_level(xp, &self.config.xp_curve)
    }

    /// Rank view for `total_earned`.
    pub fn calculate_rank(&self, total_earned: Amount) -> RankSnapshot {
        progression::calculate_rank(total_earned, &self.config.ranks)
    }

    /// Compact number with the configured suffixes.
    pub fn format_number(&self, value: Amount) -> String {
        format_number_with(value, &self.config.number_suffixes)
    }
}

// =============================================================================
// TESTS
// =============================================================================
