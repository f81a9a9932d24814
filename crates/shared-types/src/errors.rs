//! # Error Taxonomy
//!
//! Every expected business rejection is a [`CoreError`] value returned to
//! the caller; it is never thrown across the operation as control flow and
//! never retried automatically. `Internal` is reserved for unexpected
//! store/identity failures and exhausted transaction retries.
//!
//! User-visible behavior: each rejection carries a stable [`ErrorKind`]
//! plus a human-readable message. Internal causes are flattened before
//! leaving the server; the detail lives only in logs.

use serde::Serialize;
use thiserror::Error;

/// Stable machine-readable error kind, part of the public contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    AuthenticationRequired,
    AuthorizationDenied,
    ValidationFailed,
    PreconditionFailed,
    Conflict,
    NotFound,
    Internal,
}

/// The one error type business operations return.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// No or invalid bearer credential.
    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    /// Authenticated but wrong role or not the owner.
    #[error("not authorized: {0}")]
    AuthorizationDenied(String),

    /// Malformed or out-of-range input.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// A business-rule gate rejected the request (insufficient balance,
    /// non-sequential rank, already claimed, maintenance mode, ...).
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Duplicate external payment reference or a concurrent winner.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Missing user/rank/pool/payout/transaction.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unexpected failure. Detail is for server logs only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::AuthenticationRequired(_) => ErrorKind::AuthenticationRequired,
            CoreError::AuthorizationDenied(_) => ErrorKind::AuthorizationDenied,
            CoreError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            CoreError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to return to callers. Internal detail never leaks.
    pub fn public_message(&self) -> String {
        match self {
            CoreError::Internal(_) => "something went wrong, please try again later".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result alias used across the workspace.
pub type CoreResult<T> = Result<T, CoreError>;
