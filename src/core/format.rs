//! Compact number rendering for balances and rewards.
//!
//! `999` stays `"999"`, `1_000` becomes `"1K"`, `1_550_000` becomes `"1.6M"`.

use serde::{Serialize, Deserialize};

use super::fixed::{Amount, div_round};

/// One suffix tier: values at or above `threshold` are divided by it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixTier {
    /// Smallest value rendered with this suffix
    pub threshold: Amount,
    /// Suffix appended after the scaled value
    pub suffix: String,
}

impl SuffixTier {
    fn new(threshold: Amount, suffix: &str) -> Self {
        Self { threshold, suffix: suffix.to_string() }
    }
}

/// Ascending suffix table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuffixTable {
    tiers: Vec<SuffixTier>,
}

impl Default for SuffixTable {
    fn default() -> Self {
        const E3: Amount = 1_000;
        Self {
            tiers: vec![
                SuffixTier::new(E3, "K"),
                SuffixTier::new(E3.pow(2), "M"),
                SuffixTier::new(E3.pow(3), "B"),
                SuffixTier::new(E3.pow(4), "T"),
                SuffixTier::new(E3.pow(5), "Qa"),
                SuffixTier::new(E3.pow(6), "Qi"),
                SuffixTier::new(E3.pow(7), "Sx"),
                SuffixTier::new(E3.pow(8), "Sp"),
                SuffixTier::new(E3.pow(9), "Oc"),
                SuffixTier::new(E3.pow(10), "No"),
                SuffixTier::new(E3.pow(11), "Dc"),
            ],
        }
    }
}

impl SuffixTable {
    /// Build a table from tiers. Ordering is checked by config validation.
    pub fn new(tiers: Vec<SuffixTier>) -> Self {
        Self { tiers }
    }

    /// Tiers in ascending order.
    pub fn tiers(&self) -> &[SuffixTier] {
        &self.tiers
    }

    /// True when thresholds are non-zero and strictly ascending.
    pub fn is_ascending(&self) -> bool {
        self.tiers.first().is_some_and(|t| t.threshold > 0)
            && self.tiers.windows(2).all(|w| w[0].threshold < w[1].threshold)
    }

    /// Index of the highest tier whose threshold is <= value.
    fn tier_for(&self, value: Amount) -> Option<usize> {
        self.tiers.iter().rposition(|t| t.threshold <= value)
    }
}

/// Format with the default K/M/B/T table.
pub fn format_number(value: Amount) -> String {
    thread_local! {
        static DEFAULT_TABLE: SuffixTable = SuffixTable::default();
    }
    DEFAULT_TABLE.with(|table| format_number_with(value, table))
}

/// Format with a custom suffix table.
pub fn format_number_with(value: Amount, table: &SuffixTable) -> String {
    let Some(mut idx) = table.tier_for(value) else {
        return value.to_string();
    };

    let mut tenths = scaled_tenths(value, table.tiers[idx].threshold);

    // 999_960 rounds to 1000.0K; show it as 1M instead
    if let Some(next) = table.tiers.get(idx + 1) {
        let ratio = next.threshold / table.tiers[idx].threshold;
        if tenths >= ratio.saturating_mul(10) {
            idx += 1;
            tenths = scaled_tenths(value, next.threshold);
        }
    }

    let whole = tenths / 10;
    let frac = tenths % 10;
    let suffix = &table.tiers[idx].suffix;
    if frac == 0 {
        format!("{}{}", whole, suffix)
    } else {
        format!("{}.{}{}", whole, frac, suffix)
    }
}

/// `value / threshold` in tenths, rounded half-up.
fn scaled_tenths(value: Amount, threshold: Amount) -> Amount {
    let whole = value / threshold;
    let rem = value % threshold;
    let frac = match rem.checked_mul(10) {
        Some(r) => div_round(r, threshold),
        None => div_round(rem, threshold / 10),
    };
    whole.saturating_mul(10).saturating_add(frac)
}
