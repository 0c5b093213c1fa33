//! User State Definitions
//!
//! The canonical per-user record. Only the energy, combo and reward
//! modules mutate it; everything else derives views from it.

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Deserialize};

use crate::core::fixed::Amount;
use crate::core::hash::{StateHash, compute_state_hash};
use crate::game::config::GameConfig;

/// Milliseconds from a monotonic clock.
pub type Millis = u64;

// =============================================================================
// USER ID
// =============================================================================

/// Unique user identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub [u8; 16]);

impl UserId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Fresh random id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().into_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// First bytes in hex, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

// =============================================================================
// USER STATE
// =============================================================================

/// Economy state of a single user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    /// Owner
    pub user_id: UserId,

    /// Spendable currency
    pub balance: Amount,

    /// Cumulative experience
    pub xp: Amount,

    /// Lifetime earnings, never decreases
    pub total_earned: Amount,

    /// Taps available right now (0..=energy_limit)
    pub taps_left: u32,

    /// Energy capacity
    pub energy_limit: u32,

    /// Taps inside the current combo window
    pub combo: u32,

    /// Consecutive active days
    pub streak: u32,

    /// Time of the last successful tap
    pub last_tap_at: Option<Millis>,

    /// Regeneration clock; advanced only by whole recharge intervals
    pub last_regen_at: Millis,

    /// Day of the last session-boundary signal
    pub last_session_day: Option<NaiveDate>,

    /// Lifetime successful taps
    pub taps_total: u64,
}

impl UserState {
    /// Fresh state: full energy, no combo, no streak.
    pub fn new(user_id: UserId, config: &GameConfig, now: Millis) -> Self {
        Self {
            user_id,
            balance: 0,
            xp: 0,
            total_earned: 0,
            taps_left: config.energy_limit,
            energy_limit: config.energy_limit,
            combo: 0,
            streak: 0,
            last_tap_at: None,
            last_regen_at: now,
            last_session_day: None,
            taps_total: 0,
        }
    }

    /// True when no taps are left.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.taps_left == 0
    }

    /// Credit a reward. Saturates instead of overflowing.
    pub(crate) fn credit(&mut self, earned: Amount, xp: Amount, now: Millis) {
        self.balance = self.balance.saturating_add(earned);
        self.total_earned = self.total_earned.saturating_add(earned);
        self.xp = self.xp.saturating_add(xp);
        self.last_tap_at = Some(now);
        self.taps_total = self.taps_total.saturating_add(1);
    }

    /// Check the structural invariants (used by restore and tests).
    pub fn is_consistent(&self) -> bool {
        self.energy_limit > 0 && self.taps_left <= self.energy_limit
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(&self.user_id.0, |hasher| {
            hasher.word(self.balance);
            hasher.word(self.xp);
            hasher.word(self.total_earned);
            hasher.word(self.taps_left);
            hasher.word(self.energy_limit);
            hasher.word(self.combo);
            hasher.word(self.streak);
            hasher.opt_word(self.last_tap_at);
            hasher.word(self.last_regen_at);
            hasher.opt_word(self.last_session_day.map(|day| day.num_days_from_ce()));
            hasher.word(self.taps_total);
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
