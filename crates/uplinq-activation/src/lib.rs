//! # uplinq-activation
//!
//! Rank activation and income-pool lifecycle.
//!
//! ## Two settlement paths
//!
//! Wallet payments settle inside one store transaction: balance debit,
//! transaction record, rank application, and pool creation commit
//! together. External payments (on-chain, peer-to-peer) create a pending
//! transaction plus a per-user guard document and settle later when an
//! administrator confirms the payment. Either path hands the completed
//! transaction to the commission distributor after commit.

pub mod pool;
pub mod service;
pub mod validator;

pub use pool::{PoolClaimOutcome, PoolService};
pub use service::{ActivationOutcome, ActivationRequest, ActivationService};
