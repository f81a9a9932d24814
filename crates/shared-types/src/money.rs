//! Money arithmetic in minor units.
//!
//! ## Type Decisions
//!
//! - `Money(u64)` in minor units (cents). Balances can never go negative,
//!   so an unsigned representation makes underflow a checked failure
//!   instead of a silent wrap.
//! - Percentages are basis points (`u32`, 10_000 = 100%). Products are
//!   computed in `u128` before narrowing, so `amount * bps` cannot
//!   overflow for any representable amount.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

/// One basis point = 0.01%.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// A monetary amount in minor units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(pub u64);

impl Money {
    /// Zero amount.
    pub const ZERO: Money = Money(0);

    /// Construct from minor units.
    pub const fn from_minor(units: u64) -> Self {
        Money(units)
    }

    /// Raw minor units.
    pub const fn minor(self) -> u64 {
        self.0
    }

    /// Checked addition. `None` on overflow.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction. `None` when `rhs > self` (would go negative).
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Multiply by a fixed factor, checked.
    pub fn checked_mul(self, factor: u64) -> Option<Money> {
        self.0.checked_mul(factor).map(Money)
    }

    /// Apply a basis-point percentage, rounding down.
    ///
    /// `Money(10_000).apply_bps(5000)` is 50% of the amount.
    pub fn apply_bps(self, bps: u32) -> Money {
        let product = self.0 as u128 * bps as u128 / BPS_DENOMINATOR;
        // product <= self.0 for bps <= 10_000; callers never exceed 100%.
        Money(product.min(u64::MAX as u128) as u64)
    }

    /// The smaller of two amounts.
    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| {
            acc.checked_add(m).unwrap_or(Money(u64::MAX))
        })
    }
}
