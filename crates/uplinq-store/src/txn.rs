//! Optimistic transactions over the document store port.
//!
//! A [`Txn`] buffers reads (recording version stamps) and writes; nothing
//! touches the store until commit. [`run_transaction`] re-runs the closure
//! when the commit loses a version race, up to [`MAX_TXN_ATTEMPTS`].
//!
//! Two error channels:
//! - a `CoreError` returned by the closure is a business outcome and
//!   aborts without retry;
//! - a commit-time `Conflict`/`AlreadyExists` is a concurrency artifact
//!   and triggers a retry of the whole closure against fresh reads.

use crate::domain::{Document, StoreError, WriteOp};
use crate::ports::{DocumentStore, ReadStamp};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_types::{CoreError, CoreResult};
use std::collections::HashMap;

/// Upper bound on commit attempts before surfacing `Internal`.
pub const MAX_TXN_ATTEMPTS: usize = 5;

/// A buffered transaction: snapshot reads plus staged writes.
pub struct Txn<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    reads: Vec<ReadStamp>,
    writes: Vec<WriteOp>,
    /// Read-your-writes view of staged documents.
    staged: HashMap<(String, String), Option<Value>>,
}

impl<'a, S: DocumentStore + ?Sized> Txn<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            reads: Vec::new(),
            writes: Vec::new(),
            staged: HashMap::new(),
        }
    }

    fn key(collection: &str, id: &str) -> (String, String) {
        (collection.to_string(), id.to_string())
    }

    fn record_read(&mut self, collection: &str, id: &str, version: u64) {
        let seen = self
            .reads
            .iter()
            .any(|s| s.collection == collection && s.id == id);
        if !seen {
            self.reads.push(ReadStamp {
                collection: collection.to_string(),
                id: id.to_string(),
                version,
            });
        }
    }

    /// Raw read with stamp recording and read-your-writes.
    fn get_raw(&mut self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        if let Some(staged) = self.staged.get(&Self::key(collection, id)) {
            return Ok(staged.clone());
        }
        let doc = self.store.get(collection, id)?;
        let (version, data) = match doc {
            Some(Document { version, data, .. }) => (version, Some(data)),
            None => (0, None),
        };
        self.record_read(collection, id, version);
        Ok(data)
    }

    /// Typed snapshot read. Records a version stamp (absence included),
    /// so a concurrent change to this document fails the commit.
    pub fn get<T: DeserializeOwned>(
        &mut self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, StoreError> {
        match self.get_raw(collection, id)? {
            Some(data) => serde_json::from_value(data)
                .map(Some)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Stage a create-if-absent. Observing the id as taken here returns
    /// `AlreadyExists` immediately; a racing creator surfaces as a commit
    /// conflict via the absence stamp.
    pub fn create<T: Serialize>(
        &mut self,
        collection: &str,
        id: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        if self.get_raw(collection, id)?.is_some() {
            return Err(StoreError::AlreadyExists {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        let data =
            serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.staged
            .insert(Self::key(collection, id), Some(data.clone()));
        self.writes.push(WriteOp::Create {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
        });
        Ok(())
    }

    /// Stage a full-document write.
    pub fn set<T: Serialize>(
        &mut self,
        collection: &str,
        id: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let data =
            serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.staged
            .insert(Self::key(collection, id), Some(data.clone()));
        self.writes.push(WriteOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            data,
        });
        Ok(())
    }

    /// Stage a delete.
    pub fn delete(&mut self, collection: &str, id: &str) {
        self.staged.insert(Self::key(collection, id), None);
        self.writes.push(WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
    }

    pub fn into_parts(self) -> (Vec<ReadStamp>, Vec<WriteOp>) {
        (self.reads, self.writes)
    }
}

/// Run `body` against a fresh snapshot until its writes commit cleanly.
///
/// Business errors from `body` propagate unchanged and are never retried.
/// Exhausted retries surface as `CoreError::Internal`.
pub fn run_transaction<S, T, F>(store: &S, mut body: F) -> CoreResult<T>
where
    S: DocumentStore + ?Sized,
    F: FnMut(&mut Txn<'_, S>) -> CoreResult<T>,
{
    for attempt in 1..=MAX_TXN_ATTEMPTS {
        let mut txn = Txn::new(store);
        let value = body(&mut txn)?;
        let (reads, writes) = txn.into_parts();
        match store.commit(&reads, writes) {
            Ok(()) => return Ok(value),
            Err(StoreError::Conflict) | Err(StoreError::AlreadyExists { .. }) => {
                tracing::debug!(attempt, "transaction commit lost a version race, retrying");
                continue;
            }
            Err(other) => return Err(other.into()),
        }
    }
    Err(CoreError::Internal(format!(
        "transaction retries exhausted after {MAX_TXN_ATTEMPTS} attempts"
    )))
}
