//! Cross-crate integration flows.

pub mod fixtures;

mod activation_flow;
mod commission_flow;
mod concurrency;
mod e2e;
mod pool_claims;
mod signup_flow;
mod withdrawal_flow;
