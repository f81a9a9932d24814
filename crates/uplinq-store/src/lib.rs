//! # uplinq-store
//!
//! Transactional document store abstraction for Uplinq.
//!
//! ## Role in System
//!
//! - **External collaborator boundary**: the platform consumes a hosted
//!   document database; this crate is the port it is consumed through.
//! - **Optimistic concurrency**: [`run_transaction`] gives snapshot reads
//!   plus conflict-checked commit with bounded retry. A conflicting
//!   concurrent writer causes one side to retry its closure.
//! - **Batched writes**: [`ports::DocumentStore::batch_write`] applies a
//!   set of writes with no cross-document read dependency and no retry.
//!
//! Business rejections returned from a transaction closure abort the
//! transaction immediately and are never retried; only commit-time version
//! conflicts re-run the closure.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod txn;

pub use adapters::MemoryStore;
pub use domain::{collections, Document, FieldFilter, FilterOp, StoreError, WriteOp};
pub use ports::{DocumentStore, ReadStamp};
pub use txn::{run_transaction, Txn, MAX_TXN_ATTEMPTS};
