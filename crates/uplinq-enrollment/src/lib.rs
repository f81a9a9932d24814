//! # uplinq-enrollment
//!
//! Sponsor-based placement: signup, the upline walker, and direct-referral
//! recounting.
//!
//! ## Sponsor forest
//!
//! The "tree" is a pointer graph: each user carries an optional
//! `sponsor_id`, immutable after creation. Nothing else guards
//! cycle-freedom, so placement walks the chosen sponsor's ancestor chain
//! at write time and rejects any placement whose chain revisits a node.

pub mod referrals;
pub mod signup;
pub mod upline;

pub use referrals::{refresh_pool_claimability, update_direct_referrals};
pub use signup::{EnrollmentService, SignupOutcome, SignupRequest};
pub use upline::{walk_upline, UplineHop, UplineWalk};
