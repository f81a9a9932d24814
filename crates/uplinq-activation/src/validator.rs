//! Activation preconditions.
//!
//! Every check here runs inside the caller's transaction so its reads are
//! version-stamped: a precondition that held at read time but was raced
//! away before commit fails the commit, and the whole validation re-runs
//! against fresh state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared_types::{CoreError, CoreResult, Rank, RankId, TxnId, User, UserId};
use uplinq_store::{collections, DocumentStore, StoreError, Txn};

/// Registry entry for a consumed external payment reference.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReferenceClaim {
    pub reference: String,
    pub transaction_id: TxnId,
    pub created_at: DateTime<Utc>,
}

/// Guard document for a user's unconfirmed activation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActivationGuard {
    pub user_id: UserId,
    pub transaction_id: TxnId,
    pub rank: RankId,
    pub created_at: DateTime<Utc>,
}

/// Document id for a payment reference. References are user-supplied
/// strings of arbitrary shape and length; hashing gives them a uniform,
/// key-safe form.
pub fn payment_ref_key(reference: &str) -> String {
    hex::encode(Sha256::digest(reference.as_bytes()))
}

/// Load a rank definition or fail with `NotFound`.
pub fn load_rank<S: DocumentStore + ?Sized>(
    txn: &mut Txn<'_, S>,
    rank_id: RankId,
) -> CoreResult<Rank> {
    txn.get::<Rank>(collections::RANKS, &rank_id.to_string())?
        .ok_or_else(|| CoreError::NotFound(format!("{rank_id}")))
}

/// The entry-level rank, by ordinal, among the seeded definitions.
pub fn lowest_rank_id<S: DocumentStore + ?Sized>(store: &S) -> CoreResult<Option<RankId>> {
    let docs = store.query(collections::RANKS, &[], None)?;
    let mut lowest: Option<RankId> = None;
    for doc in &docs {
        let rank: Rank = doc.parse()?;
        lowest = Some(match lowest {
            Some(current) if current <= rank.id => current,
            _ => rank.id,
        });
    }
    Ok(lowest)
}

/// Ranks are activated strictly in order. A rankless user starts at the
/// entry rank; a ranked user may re-activate their current rank (top-up)
/// or move to the one immediately above it.
pub fn ensure_rank_progression(
    user: &User,
    target: RankId,
    lowest: Option<RankId>,
) -> CoreResult<()> {
    match user.rank {
        Some(current) if target == current || target == current.next() => Ok(()),
        Some(current) => Err(CoreError::PreconditionFailed(format!(
            "{target} is not reachable from {current}; ranks activate in order"
        ))),
        None => {
            let entry =
                lowest.ok_or_else(|| CoreError::Internal("no ranks are configured".into()))?;
            if target == entry {
                Ok(())
            } else {
                Err(CoreError::PreconditionFailed(format!(
                    "first activation must be {entry}"
                )))
            }
        }
    }
}

/// Consume an external payment reference. Each reference funds at most
/// one transaction; a repeat is a `Conflict` whether it raced or arrived
/// minutes later.
pub fn claim_payment_reference<S: DocumentStore + ?Sized>(
    txn: &mut Txn<'_, S>,
    reference: &str,
    transaction_id: TxnId,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    let claim = ReferenceClaim {
        reference: reference.to_string(),
        transaction_id,
        created_at: now,
    };
    match txn.create(collections::PAYMENT_REFS, &payment_ref_key(reference), &claim) {
        Ok(()) => Ok(()),
        Err(StoreError::AlreadyExists { .. }) => Err(CoreError::Conflict(
            "payment reference has already been used".into(),
        )),
        Err(other) => Err(other.into()),
    }
}

/// Reject a new activation while the user has one awaiting confirmation.
pub fn ensure_no_pending_activation<S: DocumentStore + ?Sized>(
    txn: &mut Txn<'_, S>,
    user_id: UserId,
) -> CoreResult<()> {
    let guard =
        txn.get::<ActivationGuard>(collections::PENDING_ACTIVATIONS, &user_id.to_string())?;
    match guard {
        Some(guard) => Err(CoreError::Conflict(format!(
            "activation {} is awaiting payment confirmation",
            guard.transaction_id
        ))),
        None => Ok(()),
    }
}
