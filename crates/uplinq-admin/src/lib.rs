//! # uplinq-admin
//!
//! Administrative surface: platform settings, rank definitions, payment
//! confirmation, withdrawal review, payout review, and member status.
//!
//! Every operation takes the already-verified [`shared_types::Claims`] of
//! the acting administrator and is gated on the admin role. Each applied
//! change is recorded twice: through the audit sink (structured log) and
//! as an `AuditRecord` document, both best-effort.

pub mod service;

pub use service::{AdminService, SettingsUpdate};
