//! Payout queue and claim.
//!
//! A payout moves `Queued -> Ready -> Claimed` (or `Rejected`). The claim
//! re-verifies ownership and readiness inside the draining transaction,
//! so a duplicate claim or a racing status change resolves to one winner.

use crate::balance::{credit_available, load_user};
use crate::settings::{ensure_not_maintenance, load_settings};
use shared_types::{
    Clock, CoreError, CoreResult, Money, PaymentMethod, PayoutId, PayoutRequest, PayoutStatus,
    Transaction, TransactionKind, TransactionStatus, TxnId, UserId,
};
use std::sync::Arc;
use uplinq_store::{collections, run_transaction, DocumentStore, Txn};

/// Result of a successful payout claim.
#[derive(Clone, Debug, PartialEq)]
pub struct PayoutClaimOutcome {
    pub payout_id: PayoutId,
    pub claimed_amount: Money,
    pub new_available_balance: Money,
}

/// Payout-queue service.
pub struct PayoutService<S: DocumentStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: DocumentStore> PayoutService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Queue a payout for a user (administrative/reporting path).
    pub fn queue(&self, user_id: UserId, amount: Money) -> CoreResult<PayoutRequest> {
        if amount.is_zero() {
            return Err(CoreError::ValidationFailed(
                "payout amount must be positive".into(),
            ));
        }
        let now = self.clock.now();
        run_transaction(self.store.as_ref(), |txn| {
            // The user must exist; the balance is untouched until claim.
            load_user(txn, user_id)?;
            let payout = PayoutRequest {
                id: PayoutId::generate(),
                user_id,
                amount,
                status: PayoutStatus::Queued,
                created_at: now,
                updated_at: now,
                claimed_at: None,
            };
            txn.create(collections::PAYOUT_QUEUE, &payout.id.to_string(), &payout)?;
            Ok(payout)
        })
    }

    /// Transition `Queued -> Ready`.
    pub fn mark_ready(&self, payout_id: PayoutId) -> CoreResult<PayoutRequest> {
        self.transition(payout_id, PayoutStatus::Queued, PayoutStatus::Ready)
    }

    /// Transition `Queued -> Rejected`.
    pub fn mark_rejected(&self, payout_id: PayoutId) -> CoreResult<PayoutRequest> {
        self.transition(payout_id, PayoutStatus::Queued, PayoutStatus::Rejected)
    }

    fn transition(
        &self,
        payout_id: PayoutId,
        from: PayoutStatus,
        to: PayoutStatus,
    ) -> CoreResult<PayoutRequest> {
        let now = self.clock.now();
        run_transaction(self.store.as_ref(), |txn| {
            let mut payout = load_payout(txn, payout_id)?;
            if payout.status != from {
                return Err(CoreError::PreconditionFailed(format!(
                    "payout {payout_id} is {:?}, expected {from:?}",
                    payout.status
                )));
            }
            payout.status = to;
            payout.updated_at = now;
            txn.set(collections::PAYOUT_QUEUE, &payout.id.to_string(), &payout)?;
            Ok(payout)
        })
    }

    /// Drain a Ready payout into the owner's available balance.
    ///
    /// Ownership, readiness, and not-yet-claimed are all re-verified
    /// inside this transaction; a previously read flag is never trusted.
    pub fn claim(&self, user_id: UserId, payout_id: PayoutId) -> CoreResult<PayoutClaimOutcome> {
        let now = self.clock.now();
        let outcome = run_transaction(self.store.as_ref(), |txn| {
            let settings = load_settings(txn)?;
            ensure_not_maintenance(&settings)?;

            let mut payout = load_payout(txn, payout_id)?;
            if payout.user_id != user_id {
                return Err(CoreError::AuthorizationDenied(
                    "payout belongs to another user".into(),
                ));
            }
            match payout.status {
                PayoutStatus::Ready => {}
                PayoutStatus::Claimed => {
                    return Err(CoreError::Conflict(format!(
                        "payout {payout_id} already claimed"
                    )))
                }
                PayoutStatus::Queued | PayoutStatus::Rejected => {
                    return Err(CoreError::PreconditionFailed(format!(
                        "payout {payout_id} is not ready to claim"
                    )))
                }
            }

            payout.status = PayoutStatus::Claimed;
            payout.claimed_at = Some(now);
            payout.updated_at = now;
            txn.set(collections::PAYOUT_QUEUE, &payout.id.to_string(), &payout)?;

            let user = credit_available(txn, user_id, payout.amount, now)?;

            let record = Transaction {
                id: TxnId::generate(),
                user_id,
                kind: TransactionKind::PayoutClaim,
                amount: payout.amount,
                status: TransactionStatus::Completed,
                payment: PaymentMethod::Wallet,
                rank: None,
                created_at: now,
                completed_at: Some(now),
            };
            txn.create(collections::TRANSACTIONS, &record.id.to_string(), &record)?;

            Ok(PayoutClaimOutcome {
                payout_id,
                claimed_amount: payout.amount,
                new_available_balance: user.available_balance,
            })
        })?;

        tracing::info!(
            user = %user_id,
            payout = %payout_id,
            amount = %outcome.claimed_amount,
            "payout claimed"
        );
        Ok(outcome)
    }
}

fn load_payout<S: DocumentStore + ?Sized>(
    txn: &mut Txn<'_, S>,
    payout_id: PayoutId,
) -> CoreResult<PayoutRequest> {
    txn.get::<PayoutRequest>(collections::PAYOUT_QUEUE, &payout_id.to_string())?
        .ok_or_else(|| CoreError::NotFound(format!("payout {payout_id}")))
}
