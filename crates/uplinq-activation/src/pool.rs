//! Income-pool lifecycle.
//!
//! A pool is created locked when a rank is activated, accumulates the
//! referral share of downline activations, and is drained exactly once
//! by its owner's claim. Claimability is re-verified inside the claiming
//! transaction; the cached `can_claim` flag alone is never trusted across
//! a read/commit gap.

use chrono::{DateTime, Utc};
use shared_types::{
    Clock, CoreError, CoreResult, IncomePool, Money, PaymentMethod, PoolId, Rank, Transaction,
    TransactionKind, TransactionStatus, TxnId, User, UserId,
};
use std::sync::Arc;
use uplinq_commission::POOL_CAP_MULTIPLIER;
use uplinq_ledger::{credit_available, ensure_not_maintenance, load_settings};
use uplinq_store::{collections, run_transaction, DocumentStore};

/// Build the locked pool that accompanies a fresh rank activation.
///
/// The cap is a fixed multiple of the activation cost, and `can_claim`
/// is frozen from the owner's referral count at creation time; later
/// referral recounts update it through the enrollment path.
pub fn new_income_pool(
    pool_id: PoolId,
    owner: &User,
    rank: &Rank,
    referral_requirement: u32,
    now: DateTime<Utc>,
) -> CoreResult<IncomePool> {
    let cap = rank
        .activation_cost
        .checked_mul(POOL_CAP_MULTIPLIER)
        .ok_or_else(|| CoreError::Internal("pool cap overflow".into()))?;
    Ok(IncomePool {
        id: pool_id,
        user_id: owner.id,
        rank: rank.id,
        pool_income: Money::ZERO,
        max_pool_income: cap,
        can_claim: owner.direct_referrals >= referral_requirement,
        is_locked: true,
        claimed_at: None,
        created_at: now,
        updated_at: now,
    })
}

/// Result of a successful pool claim.
#[derive(Clone, Debug)]
pub struct PoolClaimOutcome {
    pub pool_id: PoolId,
    pub claimed_amount: Money,
    pub new_available_balance: Money,
}

/// Owner-facing pool claims.
pub struct PoolService<S: DocumentStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: DocumentStore> PoolService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Drain a claimable pool into the owner's available balance.
    ///
    /// The claim is terminal: `claimed_at` is set exactly once and a
    /// repeat attempt fails the claimability re-check. Two racing claims
    /// of the same pool collide on the pool document's version stamp, so
    /// only one can credit the balance.
    pub fn claim(&self, claimant: UserId, pool_id: PoolId) -> CoreResult<PoolClaimOutcome> {
        let now = self.clock.now();
        let txn_id = TxnId::generate();

        let outcome = run_transaction(self.store.as_ref(), |txn| {
            let settings = load_settings(txn)?;
            ensure_not_maintenance(&settings)?;

            let mut pool = txn
                .get::<IncomePool>(collections::INCOME_POOLS, &pool_id.to_string())?
                .ok_or_else(|| CoreError::NotFound(format!("income pool {pool_id}")))?;
            if pool.user_id != claimant {
                return Err(CoreError::AuthorizationDenied(
                    "income pool belongs to another user".into(),
                ));
            }
            if !pool.is_claimable() {
                return Err(CoreError::PreconditionFailed(
                    "income pool is not claimable".into(),
                ));
            }

            let amount = pool.pool_income;
            pool.pool_income = Money::ZERO;
            pool.claimed_at = Some(now);
            pool.is_locked = false;
            pool.updated_at = now;
            txn.set(collections::INCOME_POOLS, &pool_id.to_string(), &pool)?;

            let user = credit_available(txn, claimant, amount, now)?;

            let record = Transaction {
                id: txn_id,
                user_id: claimant,
                kind: TransactionKind::PoolClaim,
                amount,
                status: TransactionStatus::Completed,
                payment: PaymentMethod::Wallet,
                rank: Some(pool.rank),
                created_at: now,
                completed_at: Some(now),
            };
            txn.create(collections::TRANSACTIONS, &record.id.to_string(), &record)?;

            Ok(PoolClaimOutcome {
                pool_id,
                claimed_amount: amount,
                new_available_balance: user.available_balance,
            })
        })?;

        tracing::info!(
            user = %claimant,
            pool = %pool_id,
            amount = %outcome.claimed_amount,
            "income pool claimed"
        );
        Ok(outcome)
    }
}
