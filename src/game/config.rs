//! Game Configuration
//!
//! Immutable economy constants. A config must pass [`GameConfig::validate`]
//! before the first tap is accepted; every constructor that hands out an
//! engine or store validates first.

use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::fixed::*;
use crate::core::format::SuffixTable;
use crate::core::hash::{hash_with_domain, StateHash};
use crate::game::progression::{RankTable, XpCurve};

/// Chance and payout for a rare outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTier {
    /// Chance in basis points (10000 = always)
    pub chance: u32,
    /// Reward multiplier in basis points
    pub multiplier: Multiplier,
}

/// Tap-frequency combo tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboConfig {
    /// A gap longer than this resets the combo
    pub timeout_ms: u64,
    /// Combo count that activates the heightened tier
    pub threshold: u32,
    /// Additive bonus per combo tap
    pub step: Multiplier,
    /// Combo counts above this add no further bonus
    pub cap: u32,
    /// Extra factor applied while the heightened tier is active
    pub hot_multiplier: Multiplier,
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_COMBO_TIMEOUT_MS,
            threshold: DEFAULT_COMBO_THRESHOLD,
            step: DEFAULT_COMBO_STEP,
            cap: DEFAULT_COMBO_CAP,
            hot_multiplier: DEFAULT_HOT_MULTIPLIER,
        }
    }
}

/// Day-streak tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakConfig {
    /// Additive bonus per streak day
    pub step: Multiplier,
    /// Streak days above this add no further bonus
    pub cap: u32,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            step: DEFAULT_STREAK_STEP,
            cap: DEFAULT_STREAK_CAP,
        }
    }
}

/// Complete economy configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Maximum stored taps
    pub energy_limit: u32,
    /// Milliseconds to regenerate one tap
    pub recharge_interval_ms: u64,
    /// Reward for a plain tap before multipliers
    pub base_tap_value: u64,
    /// Critical outcome
    pub critical: OutcomeTier,
    /// Jackpot outcome
    pub jackpot: OutcomeTier,
    /// Combo tuning
    pub combo: ComboConfig,
    /// Streak tuning
    pub streak: StreakConfig,
    /// XP granted per unit earned, in basis points
    pub xp_per_earned: Multiplier,
    /// Level curve
    pub xp_curve: XpCurve,
    /// Rank thresholds
    pub ranks: RankTable,
    /// Compact number suffixes
    pub number_suffixes: SuffixTable,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            energy_limit: DEFAULT_ENERGY_LIMIT,
            recharge_interval_ms: DEFAULT_RECHARGE_INTERVAL_MS,
            base_tap_value: DEFAULT_BASE_TAP_VALUE,
            critical: OutcomeTier {
                chance: DEFAULT_CRITICAL_CHANCE,
                multiplier: DEFAULT_CRITICAL_MULTIPLIER,
            },
            jackpot: OutcomeTier {
                chance: DEFAULT_JACKPOT_CHANCE,
                multiplier: DEFAULT_JACKPOT_MULTIPLIER,
            },
            combo: ComboConfig::default(),
            streak: StreakConfig::default(),
            xp_per_earned: DEFAULT_XP_PER_EARNED,
            xp_curve: XpCurve::default(),
            ranks: RankTable::default(),
            number_suffixes: SuffixTable::default(),
        }
    }
}

/// Upper bound on the xp ratio (1000x).
const MAX_XP_PER_EARNED: Multiplier = 1_000 * MULT_ONE;

/// Configuration errors. All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Energy capacity is zero.
    #[error("energy_limit must be positive")]
    ZeroEnergyLimit,

    /// Recharge interval is zero.
    #[error("recharge_interval_ms must be positive")]
    ZeroRechargeInterval,

    /// Base tap value is zero.
    #[error("base_tap_value must be positive")]
    ZeroBaseTapValue,

    /// Combo timeout is zero.
    #[error("combo.timeout_ms must be positive")]
    ZeroComboTimeout,

    /// Critical + jackpot chance exceeds 100%.
    #[error("critical + jackpot chance is {total} bp, above 10000")]
    ChanceOverflow {
        /// Combined chance in basis points
        total: u32,
    },

    /// A multiplier that must be at least 1.0x is below it.
    #[error("{field} is {value} bp, below 1.0x")]
    MultiplierBelowOne {
        /// Field name
        field: &'static str,
        /// Offending value
        value: Multiplier,
    },

    /// XP ratio is implausibly large.
    #[error("xp_per_earned is {0} bp, above 1000x")]
    XpRatioTooLarge(Multiplier),

    /// Level curve does not strictly increase.
    #[error("xp_curve must strictly increase (base > 0 and linear + quadratic > 0)")]
    XpCurveNotIncreasing,

    /// Rank table is out of order.
    #[error("rank table is malformed at tier {index}")]
    MalformedRankTable {
        /// First offending tier
        index: usize,
    },

    /// Suffix table is empty or out of order.
    #[error("number_suffixes must be non-empty and strictly ascending")]
    MalformedSuffixTable,

    /// JSON parse error.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },
}

impl GameConfig {
    /// Check every structural contract the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.energy_limit == 0 {
            return Err(ConfigError::ZeroEnergyLimit);
        }
        if self.recharge_interval_ms == 0 {
            return Err(ConfigError::ZeroRechargeInterval);
        }
        if self.base_tap_value == 0 {
            return Err(ConfigError::ZeroBaseTapValue);
        }
        if self.combo.timeout_ms == 0 {
            return Err(ConfigError::ZeroComboTimeout);
        }

        let total = self.critical.chance.saturating_add(self.jackpot.chance);
        if total > CHANCE_SCALE {
            return Err(ConfigError::ChanceOverflow { total });
        }

        for (field, value) in [
            ("critical.multiplier", self.critical.multiplier),
            ("jackpot.multiplier", self.jackpot.multiplier),
            ("combo.hot_multiplier", self.combo.hot_multiplier),
        ] {
            if value < MULT_ONE {
                return Err(ConfigError::MultiplierBelowOne { field, value });
            }
        }

        if self.xp_per_earned > MAX_XP_PER_EARNED {
            return Err(ConfigError::XpRatioTooLarge(self.xp_per_earned));
        }
        if !self.xp_curve.is_strictly_increasing() {
            return Err(ConfigError::XpCurveNotIncreasing);
        }
        if let Some(index) = self.ranks.first_violation() {
            return Err(ConfigError::MalformedRankTable { index });
        }
        if !self.number_suffixes.is_ascending() {
            return Err(ConfigError::MalformedSuffixTable);
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Digest of the config, logged at startup so snapshots can be traced
    /// back to the constants that produced them.
    pub fn fingerprint(&self) -> StateHash {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hash_with_domain(b"TAP_ECONOMY_CONFIG_V1", &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_constants_rejected() {
        let config = GameConfig { energy_limit: 0, ..GameConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroEnergyLimit)));

        let config = GameConfig { recharge_interval_ms: 0, ..GameConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroRechargeInterval)));

        let config = GameConfig { base_tap_value: 0, ..GameConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroBaseTapValue)));
    }

    #[test]
    fn test_chance_overflow_rejected() {
        let mut config = GameConfig::default();
        config.critical.chance = 9_000;
        config.jackpot.chance = 2_000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ChanceOverflow { total: 11_000 })
        ));
    }

    #[test]
    fn test_multiplier_below_one_rejected() {
        let mut config = GameConfig::default();
        config.jackpot.multiplier = 5_000;
        match config.validate() {
            Err(ConfigError::MultiplierBelowOne { field, value }) => {
                assert_eq!(field, "jackpot.multiplier");
                assert_eq!(value, 5_000);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_flat_curve_rejected() {
        let mut config = GameConfig::default();
        config.xp_curve = XpCurve { base: 100, linear: 0, quadratic: 0 };
        assert!(matches!(config.validate(), Err(ConfigError::XpCurveNotIncreasing)));
    }

    #[test]
    fn test_malformed_rank_table_rejected() {
        let mut config = GameConfig::default();
        config.ranks.tiers.reverse();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MalformedRankTable { .. })
        ));
    }

    #[test]
    fn test_from_json_partial() {
        let config = GameConfig::from_json_str(
            r#"{ "energy_limit": 500, "combo": { "threshold": 20 } }"#,
        )
        .unwrap();
        assert_eq!(config.energy_limit, 500);
        assert_eq!(config.combo.threshold, 20);
        assert_eq!(config.combo.timeout_ms, DEFAULT_COMBO_TIMEOUT_MS);
        assert_eq!(config.base_tap_value, DEFAULT_BASE_TAP_VALUE);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(matches!(
            GameConfig::from_json_str(r#"{ "energy_limit": 0 }"#),
            Err(ConfigError::ZeroEnergyLimit)
        ));
        assert!(matches!(
            GameConfig::from_json_str("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_json_round_trip_keeps_fingerprint() {
        let config = GameConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = GameConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.fingerprint(), config.fingerprint());
    }

    #[test]
    fn test_load_missing_file() {
        let err = GameConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
