//! # Shared Types Crate
//!
//! Domain entities, money arithmetic, the error taxonomy, and the
//! clock/identity ports shared by every Uplinq crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Two error channels**: expected business outcomes are `Result` values
//!   carrying a [`CoreError`]; panics are reserved for programming bugs.
//! - **Server time only**: every timestamp comes from the [`Clock`] port,
//!   never from a caller-supplied value.

pub mod clock;
pub mod entities;
pub mod errors;
pub mod identity;
pub mod money;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entities::*;
pub use errors::{CoreError, CoreResult, ErrorKind};
pub use identity::{Claims, IdentityProvider, Role, StaticIdentityProvider};
pub use money::Money;
