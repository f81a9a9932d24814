//! Commission schedule tables.
//!
//! Each level's percentage applies independently to the same package
//! amount; the schedule is not a draining pool. The table pays out 72%
//! of the package across six levels, on top of the referral and global
//! shares.

/// Per-level share of the package amount, in basis points.
/// Level 1 (direct sponsor) through level 6.
pub const LEVEL_INCOME_BPS: [u32; 6] = [5000, 1000, 500, 300, 200, 100];

/// Depth of the upline walk for level income.
pub const LEVEL_INCOME_DEPTH: u8 = 6;

/// Direct-sponsor share credited to the sponsor's income pool.
pub const REFERRAL_INCOME_BPS: u32 = 1000;

/// Platform-wide accumulator share.
pub const GLOBAL_INCOME_BPS: u32 = 300;

/// Income-pool cap as a multiple of the activation amount.
pub const POOL_CAP_MULTIPLIER: u64 = 100;

/// Share for a 1-based level, `None` beyond the schedule.
pub fn level_income_bps(level: u8) -> Option<u32> {
    if level == 0 {
        return None;
    }
    LEVEL_INCOME_BPS.get(level as usize - 1).copied()
}

/// Sum of all level shares, for payout accounting.
pub fn total_level_income_bps() -> u32 {
    LEVEL_INCOME_BPS.iter().sum()
}
