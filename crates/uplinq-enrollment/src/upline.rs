//! Upline walker.
//!
//! A lazy, finite, non-restartable traversal of the sponsor chain.
//! Level 1 is the direct sponsor. The walk truncates rather than fails:
//! a missing sponsor record (orphaned link) is logged as an error
//! condition and ends the walk, and callers must treat a short upline as
//! valid output (fewer eligible recipients than `max_depth`).

use shared_types::{User, UserId};
use std::collections::HashSet;
use uplinq_store::{collections, DocumentStore};

/// One upline recipient candidate.
#[derive(Clone, Debug)]
pub struct UplineHop {
    pub user: User,
    /// 1-based distance from the start user.
    pub level: u8,
}

/// Iterator over the sponsor chain of a start user.
pub struct UplineWalk<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    next_id: Option<UserId>,
    level: u8,
    max_depth: u8,
    visited: HashSet<UserId>,
}

impl<'a, S: DocumentStore + ?Sized> UplineWalk<'a, S> {
    /// Walk upward from an already-loaded user.
    pub fn from_user(store: &'a S, start: &User, max_depth: u8) -> Self {
        let mut visited = HashSet::new();
        visited.insert(start.id);
        Self {
            store,
            next_id: start.sponsor_id,
            level: 0,
            max_depth,
            visited,
        }
    }
}

impl<S: DocumentStore + ?Sized> Iterator for UplineWalk<'_, S> {
    type Item = UplineHop;

    fn next(&mut self) -> Option<UplineHop> {
        if self.level >= self.max_depth {
            return None;
        }
        let id = self.next_id.take()?;

        // Sponsor references cannot legally form a cycle (enforced at
        // placement); a revisit here means corrupted data.
        if !self.visited.insert(id) {
            tracing::error!(user = %id, "cycle detected in sponsor chain, truncating walk");
            return None;
        }

        let doc = match self.store.get(collections::USERS, &id.to_string()) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!(user = %id, error = %e, "store error during upline walk");
                return None;
            }
        };
        let Some(doc) = doc else {
            tracing::error!(user = %id, "orphaned sponsor reference, truncating walk");
            return None;
        };
        let user: User = match doc.parse() {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(user = %id, error = %e, "unreadable user document in upline walk");
                return None;
            }
        };

        self.level += 1;
        self.next_id = user.sponsor_id;
        Some(UplineHop {
            user,
            level: self.level,
        })
    }
}

/// Collect the upline of `start_user_id` as `(user, level)` pairs,
/// levels `1..=max_depth`.
pub fn walk_upline<S: DocumentStore + ?Sized>(
    store: &S,
    start_user_id: UserId,
    max_depth: u8,
) -> Vec<UplineHop> {
    let start = match store.get(collections::USERS, &start_user_id.to_string()) {
        Ok(Some(doc)) => match doc.parse::<User>() {
            Ok(user) => user,
            Err(e) => {
                tracing::error!(user = %start_user_id, error = %e, "unreadable start user");
                return Vec::new();
            }
        },
        Ok(None) => {
            tracing::error!(user = %start_user_id, "upline walk started from missing user");
            return Vec::new();
        }
        Err(e) => {
            tracing::error!(user = %start_user_id, error = %e, "store error loading start user");
            return Vec::new();
        }
    };
    UplineWalk::from_user(store, &start, max_depth).collect()
}
