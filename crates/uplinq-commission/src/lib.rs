//! # uplinq-commission
//!
//! Commission schedules and the multi-level distributor.
//!
//! ## Atomicity Model
//!
//! The idempotency marker and each recipient's credit are separate atomic
//! units. The distributor spans many documents, and the underlying store
//! only offers per-transaction atomicity, so full all-or-nothing
//! multi-recipient distribution is NOT guaranteed: one recipient's
//! failure is logged and skipped while the siblings proceed. Callers and
//! tests must not assume otherwise.

pub mod distributor;
pub mod schedule;

pub use distributor::CommissionDistributor;
pub use schedule::{
    level_income_bps, total_level_income_bps, GLOBAL_INCOME_BPS, LEVEL_INCOME_BPS,
    LEVEL_INCOME_DEPTH, POOL_CAP_MULTIPLIER, REFERRAL_INCOME_BPS,
};
