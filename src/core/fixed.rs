//! Basis-Point Fixed-Point Arithmetic
//!
//! Reward multipliers and ratios are stored as integer basis points.
//! All operations use integer arithmetic only - no floats in economy logic.
//!
//! ## Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Multiplier = u32 basis points                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  10_000  = 1.00x                                            │
//! │  25_000  = 2.50x                                            │
//! │  500     = 0.05  (5% chance, 5% bonus step)                 │
//! │                                                             │
//! │  Amount  = u128 (balances, xp, lifetime earnings)           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `u64` base value times two `u32` multipliers always fits in `u128`,
//! so a single tap reward can never overflow before rounding.

/// Currency / XP amount. 128 bits is effectively unbounded for an
/// inflationary economy; accumulation saturates instead of wrapping.
pub type Amount = u128;

/// Multiplier or ratio in basis points.
pub type Multiplier = u32;

/// 1.0x in basis points (10000)
pub const MULT_ONE: Multiplier = 10_000;

/// Denominator for chance rolls (10000 = 100%)
pub const CHANCE_SCALE: u32 = 10_000;

// =============================================================================
// DEFAULT ECONOMY CONSTANTS
// =============================================================================

/// Default energy capacity
pub const DEFAULT_ENERGY_LIMIT: u32 = 1_000;

/// Default recharge interval: one tap every 3 seconds
pub const DEFAULT_RECHARGE_INTERVAL_MS: u64 = 3_000;

/// Default reward for a plain tap before multipliers
pub const DEFAULT_BASE_TAP_VALUE: u64 = 10;

/// Critical: 5% chance, 3.0x
pub const DEFAULT_CRITICAL_CHANCE: u32 = 500;
/// Critical payout
pub const DEFAULT_CRITICAL_MULTIPLIER: Multiplier = 30_000;

/// Jackpot: 0.5% chance, 20.0x
pub const DEFAULT_JACKPOT_CHANCE: u32 = 50;
/// Jackpot payout
pub const DEFAULT_JACKPOT_MULTIPLIER: Multiplier = 200_000;

/// Combo window: a gap longer than 2 seconds breaks the combo
pub const DEFAULT_COMBO_TIMEOUT_MS: u64 = 2_000;

/// Combo count that switches on the heightened tier
pub const DEFAULT_COMBO_THRESHOLD: u32 = 10;

/// +1% per combo tap, capped at 50 taps (+50%)
pub const DEFAULT_COMBO_STEP: Multiplier = 100;
/// Combo taps past this add nothing
pub const DEFAULT_COMBO_CAP: u32 = 50;

/// Heightened tier: 1.5x on top of the additive bonus
pub const DEFAULT_HOT_MULTIPLIER: Multiplier = 15_000;

/// +5% per streak day, capped at 30 days (+150%)
pub const DEFAULT_STREAK_STEP: Multiplier = 500;
/// Streak days past this add nothing
pub const DEFAULT_STREAK_CAP: u32 = 30;

/// One XP per currency unit earned
pub const DEFAULT_XP_PER_EARNED: Multiplier = MULT_ONE;

// =============================================================================
// CORE OPERATIONS
// =============================================================================

/// Divide with half-up rounding. `denom` must be non-zero.
#[inline]
pub const fn div_round(numer: u128, denom: u128) -> u128 {
    let q = numer / denom;
    let r = numer % denom;
    if r >= denom - r {
        q + 1
    } else {
        q
    }
}

/// Scale an amount by a basis-point multiplier, rounding half-up.
///
/// Saturates at `Amount::MAX` instead of overflowing.
#[inline]
pub fn apply_multiplier(value: Amount, mult: Multiplier) -> Amount {
    match value.checked_mul(mult as u128) {
        Some(product) => div_round(product, MULT_ONE as u128),
        // Split to avoid the intermediate overflow
        None => {
            let whole = value / MULT_ONE as u128;
            let rem = value % MULT_ONE as u128;
            whole
                .saturating_mul(mult as u128)
                .saturating_add(div_round(rem * mult as u128, MULT_ONE as u128))
        }
    }
}

/// Compose two multipliers: `a * b` in basis points, rounding half-up.
#[inline]
pub fn compose(a: Multiplier, b: Multiplier) -> Multiplier {
    let product = div_round(a as u128 * b as u128, MULT_ONE as u128);
    product.min(Multiplier::MAX as u128) as Multiplier
}

/// `base * m1 * m2`, rounded half-up once at the end.
///
/// Cannot overflow: `u64 * u32 * u32 < 2^128`.
#[inline]
pub fn scale_twice(base: u64, m1: Multiplier, m2: Multiplier) -> Amount {
    let numer = base as u128 * m1 as u128 * m2 as u128;
    div_round(numer, MULT_ONE as u128 * MULT_ONE as u128)
}

/// Integer percentage `part / whole` in [0, 100], rounded half-up.
#[inline]
pub fn percent(part: u128, whole: u128) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole);
    // Avoid overflow on huge values by shrinking both sides first
    let (p, w) = if part > u128::MAX / 100 {
        (part >> 8, (whole >> 8).max(1))
    } else {
        (part, whole)
    };
    div_round(p * 100, w).min(100) as u8
}

/// Render a multiplier for logs, e.g. `15_000` -> `"1.5x"`.
pub fn multiplier_label(mult: Multiplier) -> String {
    let whole = mult / MULT_ONE;
    let frac = (mult % MULT_ONE) / 100;
    if frac == 0 {
        format!("{}x", whole)
    } else if frac % 10 == 0 {
        format!("{}.{}x", whole, frac / 10)
    } else {
        format!("{}.{:02}x", whole, frac)
    }
}

// =============================================================================
// TESTS
// =============================================================================
