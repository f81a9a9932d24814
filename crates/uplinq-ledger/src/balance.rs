//! Composable balance operations.
//!
//! Each function reads the user inside the caller's transaction, applies
//! one checked mutation, and stages the write back. Because the read is
//! version-stamped, two racing mutations of the same user cannot both
//! commit; one retries against the fresh balance. This is what makes
//! independent credits commute.

use chrono::{DateTime, Utc};
use shared_types::{CoreError, CoreResult, Money, User, UserId};
use uplinq_store::{collections, DocumentStore, Txn};

/// Load a user or fail with `NotFound`.
pub fn load_user<S: DocumentStore + ?Sized>(
    txn: &mut Txn<'_, S>,
    user_id: UserId,
) -> CoreResult<User> {
    txn.get::<User>(collections::USERS, &user_id.to_string())?
        .ok_or_else(|| CoreError::NotFound(format!("user {user_id}")))
}

fn store_user<S: DocumentStore + ?Sized>(txn: &mut Txn<'_, S>, user: &User) -> CoreResult<()> {
    txn.set(collections::USERS, &user.id.to_string(), user)?;
    Ok(())
}

fn overflow() -> CoreError {
    // A balance overflowing u64 minor units is a programming/config bug,
    // not a user-facing rejection.
    CoreError::Internal("balance arithmetic overflow".into())
}

/// Increase available balance.
pub fn credit_available<S: DocumentStore + ?Sized>(
    txn: &mut Txn<'_, S>,
    user_id: UserId,
    amount: Money,
    now: DateTime<Utc>,
) -> CoreResult<User> {
    let mut user = load_user(txn, user_id)?;
    user.available_balance = user
        .available_balance
        .checked_add(amount)
        .ok_or_else(overflow)?;
    user.updated_at = now;
    store_user(txn, &user)?;
    Ok(user)
}

/// Decrease available balance; rejects rather than going negative.
pub fn debit_available<S: DocumentStore + ?Sized>(
    txn: &mut Txn<'_, S>,
    user_id: UserId,
    amount: Money,
    now: DateTime<Utc>,
) -> CoreResult<User> {
    let mut user = load_user(txn, user_id)?;
    user.available_balance = user.available_balance.checked_sub(amount).ok_or_else(|| {
        CoreError::PreconditionFailed(format!(
            "insufficient balance: required {amount}, available {}",
            user.available_balance
        ))
    })?;
    user.updated_at = now;
    store_user(txn, &user)?;
    Ok(user)
}

/// Credit commission income: available balance and lifetime earnings move
/// together.
pub fn credit_earnings<S: DocumentStore + ?Sized>(
    txn: &mut Txn<'_, S>,
    user_id: UserId,
    amount: Money,
    now: DateTime<Utc>,
) -> CoreResult<User> {
    let mut user = load_user(txn, user_id)?;
    user.available_balance = user
        .available_balance
        .checked_add(amount)
        .ok_or_else(overflow)?;
    user.total_earnings = user
        .total_earnings
        .checked_add(amount)
        .ok_or_else(overflow)?;
    user.updated_at = now;
    store_user(txn, &user)?;
    Ok(user)
}

/// Move funds from available to locked for a pending withdrawal.
pub fn lock_for_withdrawal<S: DocumentStore + ?Sized>(
    txn: &mut Txn<'_, S>,
    user_id: UserId,
    amount: Money,
    now: DateTime<Utc>,
) -> CoreResult<User> {
    let mut user = load_user(txn, user_id)?;
    user.available_balance = user.available_balance.checked_sub(amount).ok_or_else(|| {
        CoreError::PreconditionFailed(format!(
            "insufficient balance: required {amount}, available {}",
            user.available_balance
        ))
    })?;
    user.locked_balance = user
        .locked_balance
        .checked_add(amount)
        .ok_or_else(overflow)?;
    user.updated_at = now;
    store_user(txn, &user)?;
    Ok(user)
}

/// Return locked funds to available (rejected withdrawal).
pub fn release_lock<S: DocumentStore + ?Sized>(
    txn: &mut Txn<'_, S>,
    user_id: UserId,
    amount: Money,
    now: DateTime<Utc>,
) -> CoreResult<User> {
    let mut user = load_user(txn, user_id)?;
    // Locked funds were placed there by this workflow; missing cover is
    // corrupted state, not a business outcome.
    user.locked_balance = user
        .locked_balance
        .checked_sub(amount)
        .ok_or_else(|| CoreError::Internal("locked balance does not cover release".into()))?;
    user.available_balance = user
        .available_balance
        .checked_add(amount)
        .ok_or_else(overflow)?;
    user.updated_at = now;
    store_user(txn, &user)?;
    Ok(user)
}

/// Consume locked funds (approved withdrawal).
pub fn settle_locked<S: DocumentStore + ?Sized>(
    txn: &mut Txn<'_, S>,
    user_id: UserId,
    amount: Money,
    now: DateTime<Utc>,
) -> CoreResult<User> {
    let mut user = load_user(txn, user_id)?;
    user.locked_balance = user
        .locked_balance
        .checked_sub(amount)
        .ok_or_else(|| CoreError::Internal("locked balance does not cover settlement".into()))?;
    user.updated_at = now;
    store_user(txn, &user)?;
    Ok(user)
}
