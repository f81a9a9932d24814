//! In-memory document store adapter.
//!
//! Backs tests and local development. Commit validation and application
//! happen under one lock, which gives the same guarantee the hosted store
//! provides: a consistent snapshot check plus all-or-nothing writes.

use crate::domain::{Document, FieldFilter, FilterOp, StoreError, WriteOp};
use crate::ports::{DocumentStore, ReadStamp};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use shared_types::{Clock, SystemClock};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
struct StoredDoc {
    data: Value,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

type Collections = HashMap<String, HashMap<String, StoredDoc>>;

/// In-memory `DocumentStore` implementation.
pub struct MemoryStore {
    collections: Mutex<Collections>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

/// Resolve a dotted field path inside a JSON document.
fn field_value<'v>(data: &'v Value, path: &str) -> Option<&'v Value> {
    let mut current = data;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

/// Partial ordering across the JSON value kinds queries compare on.
fn value_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            match (x.as_i64(), y.as_i64()) {
                (Some(xi), Some(yi)) => return Some(xi.cmp(&yi)),
                _ => {}
            }
            match (x.as_u64(), y.as_u64()) {
                (Some(xu), Some(yu)) => return Some(xu.cmp(&yu)),
                _ => {}
            }
            x.as_f64().zip(y.as_f64()).and_then(|(xf, yf)| xf.partial_cmp(&yf))
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn matches(data: &Value, filter: &FieldFilter) -> bool {
    let Some(actual) = field_value(data, &filter.field) else {
        return false;
    };
    match filter.op {
        FilterOp::Eq => actual == &filter.value,
        FilterOp::Ge => matches!(
            value_cmp(actual, &filter.value),
            Some(Ordering::Greater) | Some(Ordering::Equal)
        ),
        FilterOp::Le => matches!(
            value_cmp(actual, &filter.value),
            Some(Ordering::Less) | Some(Ordering::Equal)
        ),
    }
}

impl MemoryStore {
    /// Apply writes onto the locked map. Shared by commit and batch_write.
    fn apply_writes(
        collections: &mut Collections,
        writes: Vec<WriteOp>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        // Validate creates and merges before mutating anything, so a
        // failing batch leaves no partial state.
        for write in &writes {
            match write {
                WriteOp::Create { collection, id, .. } => {
                    if collections
                        .get(collection.as_str())
                        .is_some_and(|col| col.contains_key(id.as_str()))
                    {
                        return Err(StoreError::AlreadyExists {
                            collection: collection.clone(),
                            id: id.clone(),
                        });
                    }
                }
                WriteOp::Merge { collection, id, .. } => {
                    if !collections
                        .get(collection.as_str())
                        .is_some_and(|col| col.contains_key(id.as_str()))
                    {
                        return Err(StoreError::NotFound {
                            collection: collection.clone(),
                            id: id.clone(),
                        });
                    }
                }
                _ => {}
            }
        }

        for write in writes {
            match write {
                WriteOp::Create {
                    collection,
                    id,
                    data,
                }
                | WriteOp::Set {
                    collection,
                    id,
                    data,
                } => {
                    let col = collections.entry(collection).or_default();
                    match col.get_mut(&id) {
                        Some(existing) => {
                            existing.data = data;
                            existing.version += 1;
                            existing.updated_at = now;
                        }
                        None => {
                            col.insert(
                                id,
                                StoredDoc {
                                    data,
                                    version: 1,
                                    created_at: now,
                                    updated_at: now,
                                },
                            );
                        }
                    }
                }
                WriteOp::Merge {
                    collection,
                    id,
                    fields,
                } => {
                    // Presence validated above.
                    if let Some(doc) = collections
                        .get_mut(&collection)
                        .and_then(|col| col.get_mut(&id))
                    {
                        if let Value::Object(map) = &mut doc.data {
                            for (key, value) in fields {
                                map.insert(key, value);
                            }
                        }
                        doc.version += 1;
                        doc.updated_at = now;
                    }
                }
                WriteOp::Delete { collection, id } => {
                    if let Some(col) = collections.get_mut(&collection) {
                        col.remove(&id);
                    }
                }
            }
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.lock();
        Ok(collections.get(collection).and_then(|col| {
            col.get(id).map(|doc| Document {
                id: id.to_string(),
                data: doc.data.clone(),
                version: doc.version,
                created_at: doc.created_at,
                updated_at: doc.updated_at,
            })
        }))
    }

    fn query(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.lock();
        let Some(col) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut results: Vec<Document> = col
            .iter()
            .filter(|(_, doc)| filters.iter().all(|f| matches(&doc.data, f)))
            .map(|(id, doc)| Document {
                id: id.clone(),
                data: doc.data.clone(),
                version: doc.version,
                created_at: doc.created_at,
                updated_at: doc.updated_at,
            })
            .collect();
        // Deterministic order for callers and tests.
        results.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if let Some(limit) = limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    fn commit(&self, reads: &[ReadStamp], writes: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut collections = self.collections.lock();
        for stamp in reads {
            let current = collections
                .get(stamp.collection.as_str())
                .and_then(|col| col.get(stamp.id.as_str()))
                .map(|doc| doc.version)
                .unwrap_or(0);
            if current != stamp.version {
                return Err(StoreError::Conflict);
            }
        }
        Self::apply_writes(&mut collections, writes, self.clock.now())
    }

    fn batch_write(&self, writes: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut collections = self.collections.lock();
        Self::apply_writes(&mut collections, writes, self.clock.now())
    }
}
