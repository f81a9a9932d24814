//! # Uplinq Test Suite
//!
//! Unified test crate containing the cross-crate flows:
//!
//! ```text
//! tests/src/integration/
//! ├── fixtures.rs        # Shared platform fixture
//! ├── signup_flow.rs     # Placement and referral recounting
//! ├── activation_flow.rs # Wallet and external-payment activation
//! ├── commission_flow.rs # Multi-level distribution end to end
//! ├── pool_claims.rs     # Income-pool gating and claims
//! ├── withdrawal_flow.rs # Withdrawal and payout review
//! ├── concurrency.rs     # Racing writers over one store
//! └── e2e.rs             # Full member journey over the API facade
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p uplinq-tests
//! cargo test -p uplinq-tests integration::concurrency
//! ```

#![allow(dead_code)]

pub mod integration;
