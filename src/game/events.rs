//! Game Events
//!
//! Milestones derived from a before/after pair of user states. Events are
//! never stored in the state itself; they are recomputed from the diff so a
//! replay of the same taps yields the same events.

use serde::{Serialize, Deserialize};

use crate::game::combo::is_combo_hot;
use crate::game::config::GameConfig;
use crate::game::progression::{calculate_level, calculate_rank};
use crate::game::state::{Millis, UserState};

/// Priority for event ordering within the same instant.
///
/// Lower value = reported first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Rank changes lead
    Rank = 0,
    /// Then levels
    Level = 1,
    /// Then streak changes
    Streak = 2,
    /// Then combo tier
    Combo = 3,
    /// Energy bookkeeping last
    Energy = 4,
}

/// Event payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Level increased
    LevelUp {
        /// Level before
        from: u128,
        /// Level after
        to: u128,
    },

    /// Rank increased
    RankUp {
        /// Rank before
        from: u32,
        /// Rank after
        to: u32,
        /// Title of the new rank
        title: String,
    },

    /// Combo entered the heightened tier
    ComboHot {
        /// Combo that crossed the threshold
        combo: u32,
    },

    /// Streak moved on a session boundary
    StreakChanged {
        /// Streak before
        from: u32,
        /// Streak after
        to: u32,
    },

    /// Regeneration refilled the bar
    EnergyRefilled {
        /// Taps credited on the way to full
        credited: u32,
    },
}

impl GameEventData {
    /// Ordering bucket for this payload.
    pub fn priority(&self) -> EventPriority {
        match self {
            GameEventData::RankUp { .. } => EventPriority::Rank,
            GameEventData::LevelUp { .. } => EventPriority::Level,
            GameEventData::StreakChanged { .. } => EventPriority::Streak,
            GameEventData::ComboHot { .. } => EventPriority::Combo,
            GameEventData::EnergyRefilled { .. } => EventPriority::Energy,
        }
    }
}

/// An event with its timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// When the change was observed
    pub at: Millis,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(at: Millis, data: GameEventData) -> Self {
        Self { at, data }
    }

    /// Create level up event.
    pub fn level_up(at: Millis, from: u128, to: u128) -> Self {
        Self::new(at, GameEventData::LevelUp { from, to })
    }

    /// Create rank up event.
    pub fn rank_up(at: Millis, from: u32, to: u32, title: impl Into<String>) -> Self {
        Self::new(at, GameEventData::RankUp { from, to, title: title.into() })
    }

    /// Create combo hot event.
    pub fn combo_hot(at: Millis, combo: u32) -> Self {
        Self::new(at, GameEventData::ComboHot { combo })
    }

    /// Create streak changed event.
    pub fn streak_changed(at: Millis, from: u32, to: u32) -> Self {
        Self::new(at, GameEventData::StreakChanged { from, to })
    }

    /// Create energy refilled event.
    pub fn energy_refilled(at: Millis, credited: u32) -> Self {
        Self::new(at, GameEventData::EnergyRefilled { credited })
    }
}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: time, then priority
        self.at
            .cmp(&other.at)
            .then(self.data.priority().cmp(&other.data.priority()))
    }
}

/// Derive the milestones between two snapshots of the same user.
///
/// Output is sorted and depends only on the two states and the config.
pub fn diff_events(
    before: &UserState,
    after: &UserState,
    config: &GameConfig,
    at: Millis,
) -> Vec<GameEvent> {
    let mut events = Vec::new();

    let rank_before = calculate_rank(before.total_earned, &config.ranks);
    let rank_after = calculate_rank(after.total_earned, &config.ranks);
    if rank_after.rank > rank_before.rank {
        events.push(GameEvent::rank_up(at, rank_before.rank, rank_after.rank, rank_after.title));
    }

    let level_before = calculate_level(before.xp, &config.xp_curve).level;
    let level_after = calculate_level(after.xp, &config.xp_curve).level;
    if level_after > level_before {
        events.push(GameEvent::level_up(at, level_before, level_after));
    }

    if after.streak != before.streak {
        events.push(GameEvent::streak_changed(at, before.streak, after.streak));
    }

    if is_combo_hot(after.combo, config) && !is_combo_hot(before.combo, config) {
        events.push(GameEvent::combo_hot(at, after.combo));
    }

    // Only visible when nothing was spent after the refill
    if after.taps_left == after.energy_limit && before.taps_left < before.energy_limit {
        events.push(GameEvent::energy_refilled(at, after.energy_limit - before.taps_left));
    }

    events.sort();
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::UserId;

    fn base() -> (UserState, GameConfig) {
        let config = GameConfig::default();
        (UserState::new(UserId::new([4; 16]), &config, 0), config)
    }

    #[test]
    fn test_no_change_no_events() {
        let (state, config) = base();
        assert!(diff_events(&state, &state, &config, 0).is_empty());
    }

    #[test]
    fn test_level_and_rank_up() {
        let (before, config) = base();
        let mut after = before.clone();
        after.xp = 1_000;
        after.total_earned = 1_000;

        let events = diff_events(&before, &after, &config, 77);

        assert_eq!(events.len(), 2);
        // Rank sorts ahead of level at the same instant
        match &events[0].data {
            GameEventData::RankUp { from, to, title } => {
                assert_eq!((*from, *to), (1, 2));
                assert_eq!(title, "Bronze");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(events[1].data, GameEventData::LevelUp { from: 1, .. }));
        assert!(events.iter().all(|e| e.at == 77));
    }

    #[test]
    fn test_combo_hot_only_on_crossing() {
        let (mut before, config) = base();
        let mut after = before.clone();
        before.combo = 9;
        after.combo = 10;
        assert_eq!(
            diff_events(&before, &after, &config, 5),
            vec![GameEvent::combo_hot(5, 10)]
        );

        before.combo = 10;
        after.combo = 11;
        assert!(diff_events(&before, &after, &config, 5).is_empty());
    }

    #[test]
    fn test_streak_and_refill() {
        let (mut before, config) = base();
        before.taps_left = 990;
        let mut after = before.clone();
        after.taps_left = after.energy_limit;
        after.streak = 1;

        let events = diff_events(&before, &after, &config, 9);
        assert_eq!(
            events,
            vec![GameEvent::streak_changed(9, 0, 1), GameEvent::energy_refilled(9, 10)]
        );
    }

    #[test]
    fn test_event_ordering() {
        let a = GameEvent::energy_refilled(10, 1);
        let b = GameEvent::rank_up(10, 1, 2, "Bronze");
        let c = GameEvent::level_up(9, 1, 2);

        assert!(b < a);
        assert!(c < b);
    }
}
