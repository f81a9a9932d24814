//! # uplinq-ledger
//!
//! Balance ledger operations and the withdrawal/payout workflows.
//!
//! ## Shared Resource Policy
//!
//! A user's balance fields are mutated by (a) the user, via
//! withdrawal/activation requests, and (b) the commission distributor
//! crediting them as a recipient. Both paths go through the composable
//! operations in [`balance`], inside a store transaction; unconditional
//! overwrites of balance fields are forbidden everywhere.
//!
//! ## Invariants
//!
//! - `available_balance`, `locked_balance` and `total_earnings` never go
//!   negative; a debit that would underflow is a `PreconditionFailed`.
//! - A `Transaction` status only moves `Pending -> Completed | Failed`.

pub mod balance;
pub mod payout;
pub mod settings;
pub mod withdrawal;

pub use balance::{
    credit_available, credit_earnings, debit_available, load_user, lock_for_withdrawal,
    release_lock, settle_locked,
};
pub use payout::{PayoutClaimOutcome, PayoutService};
pub use settings::{ensure_not_maintenance, load_settings};
pub use withdrawal::WithdrawalService;
