//! HUD view
//!
//! Read-only display model built from a user state. The presentation layer
//! renders these strings as-is; nothing here feeds back into the economy.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Amount, multiplier_label};
use crate::core::format::format_number_with;
use crate::game::combo;
use crate::game::config::GameConfig;
use crate::game::energy::{energy_percent, ms_until_full, ms_until_next};
use crate::game::progression::{calculate_level, calculate_rank, next_rank};
use crate::game::reward::{OutcomeKind, TapOutcome};
use crate::game::state::{Millis, UserState};

/// Everything the main screen shows for one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HudView {
    /// Compact balance, e.g. "12.3K"
    pub balance: String,
    /// Current level
    pub level: u128,
    /// Progress through the current level, 0..=100
    pub xp_percent: u8,
    /// Ordinal rank
    pub rank: u32,
    /// Rank title
    pub rank_title: String,
    /// Rank glyph
    pub rank_icon: String,
    /// Lifetime earnings still needed for the next rank, if any
    pub next_rank_in: Option<String>,
    /// "taps_left/energy_limit"
    pub energy: String,
    /// Energy bar fill, 0..=100
    pub energy_percent: u8,
    /// Milliseconds until the next tap regenerates (0 when full)
    pub next_tap_in_ms: u64,
    /// Milliseconds until the bar is full (0 when full)
    pub full_in_ms: u64,
    /// Current combo
    pub combo: u32,
    /// Combo in the heightened tier
    pub combo_hot: bool,
    /// Current combo/streak multiplier, e.g. "1.65x"
    pub multiplier: String,
    /// Consecutive active days
    pub streak: u32,
    /// Streak indicator on
    pub streak_active: bool,
}

impl HudView {
    /// Build the view for `state` as seen at `now`. Expects `state` to be
    /// regenerated up to `now` already.
    pub fn from_state(state: &UserState, config: &GameConfig, now: Millis) -> Self {
        let fmt = |v: Amount| format_number_with(v, &config.number_suffixes);
        let level = calculate_level(state.xp, &config.xp_curve);
        let rank = calculate_rank(state.total_earned, &config.ranks);

        Self {
            balance: fmt(state.balance),
            level: level.level,
            xp_percent: level.progress_percent(),
            rank: rank.rank,
            rank_title: rank.title,
            rank_icon: rank.icon,
            next_rank_in: next_rank(state.total_earned, &config.ranks)
                .map(|(_, missing)| fmt(missing)),
            energy: format!("{}/{}", state.taps_left, state.energy_limit),
            energy_percent: energy_percent(state),
            next_tap_in_ms: ms_until_next(state, now, config),
            full_in_ms: ms_until_full(state, now, config),
            combo: state.combo,
            combo_hot: combo::is_combo_hot(state.combo, config),
            multiplier: multiplier_label(combo::multiplier(state.combo, state.streak, config)),
            streak: state.streak,
            streak_active: state.streak > 0,
        }
    }
}

/// Floating label shown over the tap target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeBadge {
    /// Label text, e.g. "+1.5K 🔥"
    pub text: String,
    /// Outcome kind, for styling
    pub kind: OutcomeKind,
}

impl OutcomeBadge {
    /// Badge for a successful tap; `None` for an exhausted one.
    pub fn for_outcome(outcome: &TapOutcome, config: &GameConfig) -> Option<Self> {
        if !outcome.success {
            return None;
        }
        let amount = format_number_with(outcome.earned, &config.number_suffixes);
        let text = match outcome.kind {
            OutcomeKind::Normal => format!("+{}", amount),
            OutcomeKind::Critical => format!("+{} 🔥", amount),
            OutcomeKind::Jackpot => format!("+{} 🎰", amount),
        };
        Some(Self { text, kind: outcome.kind })
    }
}
