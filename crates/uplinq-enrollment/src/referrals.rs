//! Direct-referral recounting and pool claimability refresh.
//!
//! Pools freeze `can_claim` from the settings at creation time; this is
//! the one path that revises it afterwards. The count update is a store
//! transaction; the pool flag refresh is a batched field merge across all
//! of the user's unclaimed pools, as the flag carries no read dependency
//! on the pools' own contents.

use chrono::{DateTime, Utc};
use serde_json::json;
use shared_types::{CoreResult, IncomePool, PlatformSettings, UserId};
use uplinq_ledger::{load_settings, load_user};
use uplinq_store::{collections, run_transaction, DocumentStore, FieldFilter, WriteOp};

/// Recompute `direct_referrals` for `user_id` from the users collection,
/// persist it, and refresh pool claimability. Returns the new count.
pub fn update_direct_referrals<S: DocumentStore + ?Sized>(
    store: &S,
    user_id: UserId,
    now: DateTime<Utc>,
) -> CoreResult<u32> {
    let referrals = store.query(
        collections::USERS,
        &[FieldFilter::eq("sponsor_id", json!(user_id))],
        None,
    )?;
    let count = referrals.len() as u32;

    run_transaction(store, |txn| {
        let mut user = load_user(txn, user_id)?;
        user.direct_referrals = count;
        user.updated_at = now;
        txn.set(collections::USERS, &user.id.to_string(), &user)?;
        Ok(())
    })?;

    refresh_pool_claimability(store, user_id, now)?;
    Ok(count)
}

/// Re-derive `can_claim` for every unclaimed pool of `user_id` from the
/// current referral count and settings. Returns how many pools changed.
pub fn refresh_pool_claimability<S: DocumentStore + ?Sized>(
    store: &S,
    user_id: UserId,
    now: DateTime<Utc>,
) -> CoreResult<usize> {
    let (count, settings): (u32, PlatformSettings) = run_transaction(store, |txn| {
        let user = load_user(txn, user_id)?;
        let settings = load_settings(txn)?;
        Ok((user.direct_referrals, settings))
    })?;
    let can_claim = count >= settings.direct_referral_requirement;

    let pools = store.query(
        collections::INCOME_POOLS,
        &[FieldFilter::eq("user_id", json!(user_id))],
        None,
    )?;

    let mut writes = Vec::new();
    for doc in pools {
        let pool: IncomePool = doc.parse()?;
        if pool.claimed_at.is_some() || pool.can_claim == can_claim {
            continue;
        }
        let mut fields = serde_json::Map::new();
        fields.insert("can_claim".into(), json!(can_claim));
        fields.insert("updated_at".into(), json!(now));
        writes.push(WriteOp::Merge {
            collection: collections::INCOME_POOLS.into(),
            id: doc.id,
            fields,
        });
    }
    let changed = writes.len();
    if changed > 0 {
        store.batch_write(writes)?;
        tracing::info!(user = %user_id, pools = changed, can_claim, "pool claimability refreshed");
    }
    Ok(changed)
}
