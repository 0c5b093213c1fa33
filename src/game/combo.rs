//! Combo / Streak Tracker
//!
//! Combo measures tap frequency: it grows with every successful tap and
//! resets when the gap since the previous tap exceeds the combo window.
//! Streak counts consecutive active days and only moves on the external
//! session-boundary signal; taps read it but never change it.

use chrono::NaiveDate;
use serde::{Serialize, Deserialize};

use crate::core::fixed::{Multiplier, MULT_ONE, compose};
use crate::game::config::GameConfig;
use crate::game::state::{Millis, UserState};

/// Advance the combo for a successful tap at `now`.
///
/// Returns the new combo value.
pub fn register_tap(state: &mut UserState, now: Millis, config: &GameConfig) -> u32 {
    let expired = match state.last_tap_at {
        Some(last) => now.saturating_sub(last) > config.combo.timeout_ms,
        None => true,
    };
    if expired {
        state.combo = 0;
    }
    state.combo = state.combo.saturating_add(1);
    state.combo
}

/// Combo at or above the threshold: heightened reward tier and UI emphasis.
#[inline]
pub fn is_combo_hot(combo: u32, config: &GameConfig) -> bool {
    combo >= config.combo.threshold
}

/// Combined combo/streak reward multiplier in basis points.
///
/// Monotonic non-decreasing in both `combo` and `streak`:
/// `(1 + step_c * min(combo, cap_c) + step_s * min(streak, cap_s)) * hot`.
pub fn multiplier(combo: u32, streak: u32, config: &GameConfig) -> Multiplier {
    let combo_bonus = config.combo.step.saturating_mul(combo.min(config.combo.cap));
    let streak_bonus = config.streak.step.saturating_mul(streak.min(config.streak.cap));
    let additive = MULT_ONE
        .saturating_add(combo_bonus)
        .saturating_add(streak_bonus);

    if is_combo_hot(combo, config) {
        compose(additive, config.combo.hot_multiplier)
    } else {
        additive
    }
}

/// How a session-boundary signal changed the streak.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreakChange {
    /// First session or a missed day: streak starts over at 1
    Started,
    /// Next calendar day: streak grew by one
    Extended,
    /// Same day as the last session
    Unchanged,
    /// Signal for a day before the last recorded one
    Stale,
}

/// Record a session on `day` and update the streak.
pub fn record_session(state: &mut UserState, day: NaiveDate) -> StreakChange {
    let change = match state.last_session_day {
        None => StreakChange::Started,
        Some(last) if day < last => return StreakChange::Stale,
        Some(last) if day == last => return StreakChange::Unchanged,
        Some(last) if last.succ_opt() == Some(day) => StreakChange::Extended,
        Some(_) => StreakChange::Started,
    };

    state.streak = match change {
        StreakChange::Extended => state.streak.saturating_add(1),
        _ => 1,
    };
    state.last_session_day = Some(day);
    change
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::UserId;
    use proptest::prelude::*;

    fn fresh() -> (UserState, GameConfig) {
        let config = GameConfig::default();
        (UserState::new(UserId::new([3; 16]), &config, 0), config)
    }

    fn tap_at(state: &mut UserState, now: Millis, config: &GameConfig) -> u32 {
        let combo = register_tap(state, now, config);
        state.last_tap_at = Some(now);
        combo
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_combo_grows_inside_window() {
        let (mut state, config) = fresh();
        assert_eq!(tap_at(&mut state, 0, &config), 1);
        assert_eq!(tap_at(&mut state, 500, &config), 2);
        assert_eq!(tap_at(&mut state, 2_500, &config), 3); // gap == window keeps it
    }

    #[test]
    fn test_combo_resets_after_timeout() {
        let (mut state, config) = fresh();
        assert_eq!(tap_at(&mut state, 0, &config), 1);
        assert_eq!(tap_at(&mut state, 5_000, &config), 1);
    }

    #[test]
    fn test_combo_hot_threshold() {
        let (_, config) = fresh();
        assert!(!is_combo_hot(9, &config));
        assert!(is_combo_hot(10, &config));
    }

    #[test]
    fn test_multiplier_values() {
        let (_, config) = fresh();
        assert_eq!(multiplier(0, 0, &config), MULT_ONE);
        // 1 + 5 * 1% = 1.05x
        assert_eq!(multiplier(5, 0, &config), 10_500);
        // 1 + 10% then hot 1.5x = 1.65x
        assert_eq!(multiplier(10, 0, &config), 16_500);
        // 1 + 2 * 5% = 1.1x
        assert_eq!(multiplier(0, 2, &config), 11_000);
    }

    #[test]
    fn test_multiplier_caps() {
        let (_, config) = fresh();
        assert_eq!(multiplier(50, 0, &config), multiplier(5_000, 0, &config));
        assert_eq!(multiplier(0, 30, &config), multiplier(0, 365, &config));
    }

    #[test]
    fn test_record_session_sequence() {
        let (mut state, _) = fresh();

        assert_eq!(record_session(&mut state, day(2024, 3, 1)), StreakChange::Started);
        assert_eq!(state.streak, 1);

        assert_eq!(record_session(&mut state, day(2024, 3, 1)), StreakChange::Unchanged);
        assert_eq!(state.streak, 1);

        assert_eq!(record_session(&mut state, day(2024, 3, 2)), StreakChange::Extended);
        assert_eq!(record_session(&mut state, day(2024, 3, 3)), StreakChange::Extended);
        assert_eq!(state.streak, 3);

        assert_eq!(record_session(&mut state, day(2024, 3, 1)), StreakChange::Stale);
        assert_eq!(state.streak, 3);

        assert_eq!(record_session(&mut state, day(2024, 3, 6)), StreakChange::Started);
        assert_eq!(state.streak, 1);
        assert_eq!(state.last_session_day, Some(day(2024, 3, 6)));
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let (mut state, _) = fresh();
        record_session(&mut state, day(2024, 2, 29));
        assert_eq!(record_session(&mut state, day(2024, 3, 1)), StreakChange::Extended);
        assert_eq!(state.streak, 2);
    }

    proptest! {
        #[test]
        fn prop_multiplier_monotonic(
            c1 in 0u32..200, c2 in 0u32..200,
            s1 in 0u32..100, s2 in 0u32..100,
        ) {
            let config = GameConfig::default();
            let (clo, chi) = (c1.min(c2), c1.max(c2));
            let (slo, shi) = (s1.min(s2), s1.max(s2));
            prop_assert!(multiplier(clo, slo, &config) <= multiplier(chi, slo, &config));
            prop_assert!(multiplier(clo, slo, &config) <= multiplier(clo, shi, &config));
            prop_assert!(multiplier(clo, slo, &config) >= MULT_ONE);
        }
    }
}
