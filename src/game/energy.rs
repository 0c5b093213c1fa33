//! Energy Manager
//!
//! Gates taps on stored energy and regenerates it over time. Regeneration
//! keeps its own clock (`last_regen_at`) and only ever advances it by whole
//! recharge intervals, so calling `regen` repeatedly with the same `now`
//! credits once.

use crate::core::fixed::percent;
use crate::game::config::GameConfig;
use crate::game::state::{Millis, UserState};

/// Spend one tap. Returns false (and changes nothing) when empty.
#[inline]
pub fn try_consume(state: &mut UserState) -> bool {
    if state.taps_left == 0 {
        return false;
    }
    state.taps_left -= 1;
    true
}

/// Credit whole elapsed recharge intervals, capped at the energy limit.
///
/// Returns the number of taps credited. When the cap is reached the
/// regeneration clock restarts at `now`; a full bar banks no time.
pub fn regen(state: &mut UserState, now: Millis, config: &GameConfig) -> u32 {
    let interval = config.recharge_interval_ms.max(1);

    if state.taps_left >= state.energy_limit {
        state.taps_left = state.energy_limit;
        state.last_regen_at = state.last_regen_at.max(now);
        return 0;
    }

    // A clock that went backwards credits nothing
    let Some(elapsed) = now.checked_sub(state.last_regen_at) else {
        return 0;
    };

    let intervals = elapsed / interval;
    if intervals == 0 {
        return 0;
    }

    let missing = (state.energy_limit - state.taps_left) as u64;
    if intervals >= missing {
        state.taps_left = state.energy_limit;
        state.last_regen_at = now;
        missing as u32
    } else {
        state.taps_left += intervals as u32;
        state.last_regen_at += intervals * interval;
        intervals as u32
    }
}

/// Milliseconds until the next tap regenerates (0 when full).
pub fn ms_until_next(state: &UserState, now: Millis, config: &GameConfig) -> u64 {
    if state.taps_left >= state.energy_limit {
        return 0;
    }
    let interval = config.recharge_interval_ms.max(1);
    let elapsed = now.saturating_sub(state.last_regen_at);
    interval - (elapsed % interval)
}

/// Milliseconds until the bar is full (0 when full).
pub fn ms_until_full(state: &UserState, now: Millis, config: &GameConfig) -> u64 {
    let missing = state.energy_limit.saturating_sub(state.taps_left) as u64;
    if missing == 0 {
        return 0;
    }
    let interval = config.recharge_interval_ms.max(1);
    ms_until_next(state, now, config) + (missing - 1) * interval
}

/// Energy bar fill, 0..=100.
pub fn energy_percent(state: &UserState) -> u8 {
    percent(state.taps_left as u128, state.energy_limit as u128)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::UserId;
    use proptest::prelude::*;

    fn config(limit: u32, interval: u64) -> GameConfig {
        GameConfig {
            energy_limit: limit,
            recharge_interval_ms: interval,
            ..GameConfig::default()
        }
    }

    fn drained(config: &GameConfig, now: Millis) -> UserState {
        let mut state = UserState::new(UserId::new([1; 16]), config, now);
        state.taps_left = 0;
        state
    }

    #[test]
    fn test_try_consume() {
        let config = config(2, 1_000);
        let mut state = UserState::new(UserId::new([1; 16]), &config, 0);

        assert!(try_consume(&mut state));
        assert!(try_consume(&mut state));
        assert_eq!(state.taps_left, 0);
        assert!(!try_consume(&mut state));
        assert_eq!(state.taps_left, 0);
    }

    #[test]
    fn test_regen_whole_intervals_only() {
        let config = config(10, 1_000);
        let mut state = drained(&config, 0);

        assert_eq!(regen(&mut state, 999, &config), 0);
        assert_eq!(state.taps_left, 0);

        assert_eq!(regen(&mut state, 2_500, &config), 2);
        assert_eq!(state.taps_left, 2);
        // Partial interval is kept for later
        assert_eq!(state.last_regen_at, 2_000);

        assert_eq!(regen(&mut state, 3_000, &config), 1);
        assert_eq!(state.taps_left, 3);
    }

    #[test]
    fn test_regen_idempotent_at_same_now() {
        let config = config(10, 1_000);
        let mut state = drained(&config, 0);

        assert_eq!(regen(&mut state, 4_200, &config), 4);
        assert_eq!(regen(&mut state, 4_200, &config), 0);
        assert_eq!(regen(&mut state, 4_200, &config), 0);
        assert_eq!(state.taps_left, 4);
    }

    #[test]
    fn test_regen_caps_and_restarts_clock() {
        let config = config(5, 1_000);
        let mut state = drained(&config, 0);

        assert_eq!(regen(&mut state, 1_000_000, &config), 5);
        assert_eq!(state.taps_left, 5);
        assert_eq!(state.last_regen_at, 1_000_000);

        // Spending right after a long idle does not refund instantly
        assert!(try_consume(&mut state));
        assert_eq!(regen(&mut state, 1_000_500, &config), 0);
        assert_eq!(state.taps_left, 4);
        assert_eq!(regen(&mut state, 1_001_000, &config), 1);
    }

    #[test]
    fn test_regen_ignores_clock_going_backwards() {
        let config = config(5, 1_000);
        let mut state = drained(&config, 10_000);

        assert_eq!(regen(&mut state, 5_000, &config), 0);
        assert_eq!(state.taps_left, 0);
        assert_eq!(state.last_regen_at, 10_000);
    }

    #[test]
    fn test_timers() {
        let config = config(10, 1_000);
        let mut state = drained(&config, 0);

        assert_eq!(ms_until_next(&state, 300, &config), 700);
        assert_eq!(ms_until_full(&state, 300, &config), 9_700);

        state.taps_left = 10;
        assert_eq!(ms_until_next(&state, 300, &config), 0);
        assert_eq!(ms_until_full(&state, 300, &config), 0);
    }

    #[test]
    fn test_energy_percent() {
        let config = config(200, 1_000);
        let mut state = UserState::new(UserId::new([1; 16]), &config, 0);
        assert_eq!(energy_percent(&state), 100);
        state.taps_left = 50;
        assert_eq!(energy_percent(&state), 25);
        state.taps_left = 0;
        assert_eq!(energy_percent(&state), 0);
    }

    proptest! {
        #[test]
        fn prop_regen_never_exceeds_limit(
            limit in 1u32..5_000,
            start in 0u32..5_000,
            interval in 1u64..100_000,
            steps in proptest::collection::vec(0u64..10_000_000, 1..20),
        ) {
            let config = config(limit, interval);
            let mut state = drained(&config, 0);
            state.taps_left = start.min(limit);

            let mut now = 0;
            for step in steps {
                now += step;
                regen(&mut state, now, &config);
                prop_assert!(state.taps_left <= state.energy_limit);
                prop_assert!(state.last_regen_at <= now);
            }
        }
    }
}
