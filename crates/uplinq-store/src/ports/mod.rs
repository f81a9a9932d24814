//! Document store port.

use crate::domain::{Document, FieldFilter, StoreError, WriteOp};

/// Version observed for one document at snapshot-read time.
/// `version == 0` records that the document was absent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadStamp {
    pub collection: String,
    pub id: String,
    pub version: u64,
}

/// Transactional document store abstraction.
///
/// Mirrors the primitives a hosted document database offers: point reads,
/// filtered queries with a limit, an atomic conditional commit (the store
/// validates that every read-stamped document is unchanged, then applies
/// all writes or none), and atomic batched writes without read dependency.
pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Equality/range-filtered scan of one collection.
    fn query(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Conditional commit. Fails with [`StoreError::Conflict`] when any
    /// read stamp no longer matches the current document version.
    fn commit(&self, reads: &[ReadStamp], writes: Vec<WriteOp>) -> Result<(), StoreError>;

    /// Apply writes atomically with no read dependency and no retry.
    fn batch_write(&self, writes: Vec<WriteOp>) -> Result<(), StoreError>;
}
