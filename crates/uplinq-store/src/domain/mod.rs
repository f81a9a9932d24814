//! Store domain types: documents, write operations, filters, errors.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Logical collection names.
///
/// These are the persisted-state layout of the platform; every crate
/// addresses documents through these constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const TRANSACTIONS: &str = "transactions";
    pub const INCOME_ENTRIES: &str = "income-entries";
    pub const INCOME_POOLS: &str = "income-pools";
    pub const RANKS: &str = "ranks";
    pub const PLATFORM_SETTINGS: &str = "platform-settings";
    pub const PAYOUT_QUEUE: &str = "payout-queue";
    /// Registry of consumed external payment references. Doc id is the
    /// hashed reference, so uniqueness rides on create-if-absent.
    pub const PAYMENT_REFS: &str = "payment-refs";
    /// One guard document per user with an unconfirmed activation,
    /// keyed by user id. Deleted when the activation settles.
    pub const PENDING_ACTIVATIONS: &str = "pending-activations";
    /// Idempotency markers for commission distribution, keyed by the
    /// source transaction id.
    pub const DISTRIBUTIONS: &str = "distributions";
    /// Platform-wide global pool accumulator.
    pub const GLOBAL_POOL: &str = "global-pool";
    pub const AUDIT_LOG: &str = "audit-log";

    /// Singleton document id used by `PLATFORM_SETTINGS` and `GLOBAL_POOL`.
    pub const SINGLETON_DOC: &str = "global";
}

/// A versioned document as read from the store.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
    /// Monotonic per-document version; bumped on every write.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Deserialize the document payload into a typed entity.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

/// One write in a commit or batch.
#[derive(Clone, Debug)]
pub enum WriteOp {
    /// Create-if-absent. Fails with `AlreadyExists` when the id is taken.
    Create {
        collection: String,
        id: String,
        data: Value,
    },
    /// Full-document upsert.
    Set {
        collection: String,
        id: String,
        data: Value,
    },
    /// Patch top-level fields of an existing document. Fails with
    /// `NotFound` when the document is absent.
    Merge {
        collection: String,
        id: String,
        fields: serde_json::Map<String, Value>,
    },
    Delete {
        collection: String,
        id: String,
    },
}

/// Comparison operator for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ge,
    Le,
}

/// Field filter for collection queries. `field` may be a dotted path.
#[derive(Clone, Debug)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value,
        }
    }

    pub fn ge(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Ge,
            value,
        }
    }

    pub fn le(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Le,
            value,
        }
    }
}

/// Errors surfaced by the store port.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Create-if-absent lost: the document id is already taken.
    #[error("document already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    /// Merge target missing.
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// A read-stamped document changed between snapshot and commit.
    #[error("write conflict")]
    Conflict,

    /// Payload (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<StoreError> for shared_types::CoreError {
    fn from(err: StoreError) -> Self {
        use shared_types::CoreError;
        match err {
            StoreError::AlreadyExists { collection, id } => {
                CoreError::Conflict(format!("already exists: {collection}/{id}"))
            }
            StoreError::NotFound { collection, id } => {
                CoreError::NotFound(format!("{collection}/{id}"))
            }
            StoreError::Conflict => CoreError::Internal("unretried write conflict".into()),
            StoreError::Serialization(detail) => {
                CoreError::Internal(format!("serialization: {detail}"))
            }
        }
    }
}
