//! Progression Curves
//!
//! Pure functions mapping cumulative XP to a level and lifetime earnings to
//! a rank tier. Both tables are data (`XpCurve`, `RankTable`) so the curves
//! can be retuned without touching the search algorithms.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Amount, percent};

// =============================================================================
// LEVEL CURVE
// =============================================================================

/// XP needed to clear `level`:
/// `base + linear * (level - 1) + quadratic * (level - 1)^2`.
///
/// Strictly increasing whenever `base > 0` and `linear + quadratic > 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpCurve {
    /// XP to go from level 1 to level 2
    pub base: u64,
    /// Extra XP per level
    pub linear: u64,
    /// Extra XP per level squared
    pub quadratic: u64,
}

impl Default for XpCurve {
    fn default() -> Self {
        // 100, 150, 200, 250, ...
        Self { base: 100, linear: 50, quadratic: 0 }
    }
}

impl XpCurve {
    /// True when every level costs strictly more than the one before.
    pub fn is_strictly_increasing(&self) -> bool {
        self.base > 0 && (self.linear > 0 || self.quadratic > 0)
    }

    /// XP required to advance from `level` to `level + 1`.
    pub fn xp_for_next(&self, level: u128) -> Amount {
        let n = level.saturating_sub(1);
        (self.base as u128)
            .saturating_add((self.linear as u128).saturating_mul(n))
            .saturating_add((self.quadratic as u128).saturating_mul(n.saturating_mul(n)))
    }

    /// Total XP needed to complete the first `levels` levels.
    ///
    /// `None` only when the true total exceeds `Amount::MAX`. Terms with a
    /// zero coefficient are skipped so their partial sums cannot overflow.
    pub fn cumulative(&self, levels: u128) -> Option<Amount> {
        let n = levels;
        if n == 0 {
            return Some(0);
        }

        let mut total = (self.base as u128).checked_mul(n)?;
        if self.linear == 0 && self.quadratic == 0 {
            return Some(total);
        }

        // sum_{k<n} k = n(n-1)/2, halve the even factor first
        let tri = if n % 2 == 0 {
            (n / 2).checked_mul(n - 1)?
        } else {
            n.checked_mul((n - 1) / 2)?
        };
        if self.linear > 0 {
            total = total.checked_add((self.linear as u128).checked_mul(tri)?)?;
        }

        if self.quadratic > 0 {
            // sum_{k<n} k^2 = tri(2n-1)/3, and 3 divides one of the factors
            let odd = n.checked_mul(2)? - 1;
            let squares = if odd % 3 == 0 {
                tri.checked_mul(odd / 3)?
            } else {
                (tri / 3).checked_mul(odd)?
            };
            total = total.checked_add((self.quadratic as u128).checked_mul(squares)?)?;
        }

        Some(total)
    }

    /// Number of fully completed levels for `xp`.
    ///
    /// Doubling then bisection: at most ~256 steps for any input.
    fn completed_levels(&self, xp: Amount) -> u128 {
        let fits = |levels: u128| self.cumulative(levels).is_some_and(|c| c <= xp);

        let mut lo = 0u128;
        let mut hi = 1u128;
        while fits(hi) {
            lo = hi;
            if hi == u128::MAX {
                return lo;
            }
            hi = hi.checked_mul(2).unwrap_or(u128::MAX);
        }

        // lo fits, hi does not
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if fits(mid) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    }
}

/// Level view derived from cumulative xp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionSnapshot {
    /// Current level (starts at 1)
    pub level: u128,
    /// XP earned inside the current level, always `< xp_for_next`
    pub current_xp: Amount,
    /// XP the current level costs in total
    pub xp_for_next: Amount,
}

impl ProgressionSnapshot {
    /// Progress through the current level, 0..=100.
    pub fn progress_percent(&self) -> u8 {
        percent(self.current_xp, self.xp_for_next)
    }
}

/// Map cumulative xp to level, xp inside the level and the level's cost.
pub fn calculate_level(xp: Amount, curve: &XpCurve) -> ProgressionSnapshot {
    let completed = curve.completed_levels(xp);
    // completed_levels only returns counts whose cumulative fits
    let floor = curve.cumulative(completed).unwrap_or(0);

    ProgressionSnapshot {
        level: completed.saturating_add(1),
        current_xp: xp - floor.min(xp),
        xp_for_next: curve.xp_for_next(completed.saturating_add(1)),
    }
}

// =============================================================================
// RANK TABLE
// =============================================================================

/// Rank view derived from lifetime earnings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankSnapshot {
    /// Ordinal rank (higher is better)
    pub rank: u32,
    /// Display title
    pub title: String,
    /// Display glyph
    pub icon: String,
}

impl RankSnapshot {
    fn new(rank: u32, title: &str, icon: &str) -> Self {
        Self { rank, title: title.to_string(), icon: icon.to_string() }
    }
}

/// A tier reached once lifetime earnings hit `min_total_earned`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankTier {
    /// Lifetime earnings needed to hold this tier
    pub min_total_earned: Amount,
    /// Ordinal rank
    pub rank: u32,
    /// Display title
    pub title: String,
    /// Display glyph
    pub icon: String,
}

impl RankTier {
    fn new(min_total_earned: Amount, rank: u32, title: &str, icon: &str) -> Self {
        Self {
            min_total_earned,
            rank,
            title: title.to_string(),
            icon: icon.to_string(),
        }
    }

    /// Display part of the tier.
    pub fn snapshot(&self) -> RankSnapshot {
        RankSnapshot {
            rank: self.rank,
            title: self.title.clone(),
            icon: self.icon.clone(),
        }
    }
}

/// Ascending rank thresholds plus the tier held before the first one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankTable {
    /// Tier for earnings below every threshold
    pub baseline: RankSnapshot,
    /// Tiers sorted by `min_total_earned`, strictly ascending
    pub tiers: Vec<RankTier>,
}

impl Default for RankTable {
    fn default() -> Self {
        Self {
            baseline: RankSnapshot::new(1, "Rookie", "🪨"),
            tiers: vec![
                RankTier::new(1_000, 2, "Bronze", "🥉"),
                RankTier::new(10_000, 3, "Silver", "🥈"),
                RankTier::new(100_000, 4, "Gold", "🥇"),
                RankTier::new(1_000_000, 5, "Platinum", "💠"),
                RankTier::new(10_000_000, 6, "Diamond", "💎"),
                RankTier::new(100_000_000, 7, "Master", "👑"),
                RankTier::new(1_000_000_000, 8, "Legend", "🏆"),
            ],
        }
    }
}

impl RankTable {
    /// Index of the first tier that does not ascend from the one before it
    /// (or from the baseline, for tier 0).
    ///
    /// Checks minimums and ranks are strictly ascending, the first minimum
    /// is above zero and every rank is above the baseline.
    pub fn first_violation(&self) -> Option<usize> {
        let first = self.tiers.first()?;
        if first.min_total_earned == 0 || first.rank <= self.baseline.rank {
            return Some(0);
        }
        self.tiers
            .windows(2)
            .position(|w| {
                w[1].min_total_earned <= w[0].min_total_earned || w[1].rank <= w[0].rank
            })
            .map(|i| i + 1)
    }

    /// Number of tiers after the baseline.
    fn reached(&self, total_earned: Amount) -> usize {
        self.tiers.partition_point(|t| t.min_total_earned <= total_earned)
    }
}

/// Highest tier whose minimum is <= `total_earned`, else the baseline.
pub fn calculate_rank(total_earned: Amount, table: &RankTable) -> RankSnapshot {
    match table.reached(total_earned) {
        0 => table.baseline.clone(),
        n => table.tiers[n - 1].snapshot(),
    }
}

/// The next tier to reach and how much lifetime earning it still needs.
pub fn next_rank(total_earned: Amount, table: &RankTable) -> Option<(&RankTier, Amount)> {
    table
        .tiers
        .get(table.reached(total_earned))
        .map(|tier| (tier, tier.min_total_earned - total_earned))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_xp_for_next_default() {
        let curve = XpCurve::default();
        assert_eq!(curve.xp_for_next(1), 100);
        assert_eq!(curve.xp_for_next(2), 150);
        assert_eq!(curve.xp_for_next(3), 200);
    }

    #[test]
    fn test_cumulative_matches_sum() {
        let curve = XpCurve { base: 7, linear: 3, quadratic: 2 };
        for levels in 0..50u128 {
            let summed: Amount = (1..=levels).map(|l| curve.xp_for_next(l)).sum();
            assert_eq!(curve.cumulative(levels), Some(summed), "levels {levels}");
        }
    }

    #[test]
    fn test_calculate_level_boundaries() {
        let curve = XpCurve::default();

        let start = calculate_level(0, &curve);
        assert_eq!(start, ProgressionSnapshot { level: 1, current_xp: 0, xp_for_next: 100 });

        let almost = calculate_level(99, &curve);
        assert_eq!(almost.level, 1);
        assert_eq!(almost.current_xp, 99);

        let level_two = calculate_level(100, &curve);
        assert_eq!(level_two, ProgressionSnapshot { level: 2, current_xp: 0, xp_for_next: 150 });

        let level_three = calculate_level(260, &curve);
        assert_eq!(level_three, ProgressionSnapshot { level: 3, current_xp: 10, xp_for_next: 200 });
    }

    #[test]
    fn test_calculate_level_huge_xp_terminates() {
        let curve = XpCurve { base: 1, linear: 1, quadratic: 0 };
        let snap = calculate_level(Amount::MAX, &curve);
        assert!(snap.level > 1);
        assert!(snap.current_xp < snap.xp_for_next);

        let steep = XpCurve { base: 1, linear: 0, quadratic: u64::MAX };
        let snap = calculate_level(Amount::MAX, &steep);
        assert!(snap.current_xp < snap.xp_for_next);
    }

    #[test]
    fn test_cumulative_near_amount_max() {
        // n(n+1)/2 with n = 2^64 fits even though n(n-1) does not
        let curve = XpCurve { base: 1, linear: 1, quadratic: 0 };
        let n = 1u128 << 64;
        assert_eq!(curve.cumulative(n), Some((n / 2) * (n + 1)));
        assert_eq!(curve.cumulative(1u128 << 65), None);

        let snap = calculate_level(Amount::MAX, &curve);
        assert_eq!(curve.cumulative(snap.level - 1).map(|c| c + snap.current_xp), Some(Amount::MAX));
        assert!(snap.current_xp < snap.xp_for_next);

        // Linear only levels never touch the cubic sum
        let flat = XpCurve { base: 3, linear: 2, quadratic: 0 };
        assert!(flat.cumulative(1u128 << 40).is_some());
    }

    #[test]
    fn test_progress_percent() {
        let snap = ProgressionSnapshot { level: 2, current_xp: 75, xp_for_next: 150 };
        assert_eq!(snap.progress_percent(), 50);
    }

    #[test]
    fn test_curve_validation() {
        assert!(XpCurve::default().is_strictly_increasing());
        assert!(!XpCurve { base: 100, linear: 0, quadratic: 0 }.is_strictly_increasing());
        assert!(!XpCurve { base: 0, linear: 10, quadratic: 0 }.is_strictly_increasing());
    }

    #[test]
    fn test_calculate_rank() {
        let table = RankTable::default();

        let base = calculate_rank(0, &table);
        assert_eq!(base, table.baseline);

        assert_eq!(calculate_rank(999, &table).rank, 1);
        assert_eq!(calculate_rank(1_000, &table).title, "Bronze");
        assert_eq!(calculate_rank(99_999, &table).title, "Silver");
        assert_eq!(calculate_rank(Amount::MAX, &table).title, "Legend");
    }

    #[test]
    fn test_next_rank() {
        let table = RankTable::default();

        let (tier, remaining) = next_rank(400, &table).unwrap();
        assert_eq!(tier.title, "Bronze");
        assert_eq!(remaining, 600);

        assert!(next_rank(5_000_000_000, &table).is_none());
    }

    #[test]
    fn test_rank_table_validation() {
        assert_eq!(RankTable::default().first_violation(), None);

        let mut table = RankTable::default();
        // Bronze, Gold, Silver: Silver is the first to step backwards
        table.tiers.swap(2, 3);
        assert_eq!(table.first_violation(), Some(3));

        let mut table = RankTable::default();
        table.tiers[0].rank = table.baseline.rank;
        assert_eq!(table.first_violation(), Some(0));

        let mut table = RankTable::default();
        table.tiers[0].min_total_earned = 0;
        assert_eq!(table.first_violation(), Some(0));
    }

    proptest! {
        #[test]
        fn prop_level_monotonic_and_bounded(a in any::<u64>(), b in any::<u64>()) {
            let curve = XpCurve::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let s_lo = calculate_level(lo as Amount, &curve);
            let s_hi = calculate_level(hi as Amount, &curve);
            prop_assert!(s_lo.level <= s_hi.level);
            prop_assert!(s_lo.current_xp < s_lo.xp_for_next);
            prop_assert!(s_hi.current_xp < s_hi.xp_for_next);
        }

        #[test]
        fn prop_rank_monotonic(a in any::<u64>(), b in any::<u64>()) {
            let table = RankTable::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                calculate_rank(lo as Amount, &table).rank <= calculate_rank(hi as Amount, &table).rank
            );
        }
    }
}
