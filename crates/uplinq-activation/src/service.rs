//! Rank activation service.

use crate::pool::new_income_pool;
use crate::validator::{
    claim_payment_reference, ensure_no_pending_activation, ensure_rank_progression, load_rank,
    lowest_rank_id, payment_ref_key, ActivationGuard,
};
use shared_types::{
    Clock, CoreError, CoreResult, Money, PaymentMethod, PoolId, RankId, Transaction,
    TransactionKind, TransactionStatus, TxnId, UserId, UserStatus,
};
use std::sync::Arc;
use uplinq_commission::CommissionDistributor;
use uplinq_ledger::{debit_available, ensure_not_maintenance, load_settings, load_user};
use uplinq_store::{collections, run_transaction, DocumentStore};

/// Activation input.
#[derive(Clone, Debug)]
pub struct ActivationRequest {
    pub rank: RankId,
    pub payment: PaymentMethod,
}

/// Result of an activation attempt. `status` is `Completed` for wallet
/// payments and `Pending` for external ones awaiting confirmation.
#[derive(Clone, Debug)]
pub struct ActivationOutcome {
    pub transaction_id: TxnId,
    pub activated_rank: RankId,
    pub total_cost: Money,
    pub status: TransactionStatus,
    /// Created only by a settled first-time activation; top-ups reuse the
    /// existing pool and pending activations create theirs at confirmation.
    pub pool_id: Option<PoolId>,
}

/// Rank activation and payment confirmation.
pub struct ActivationService<S: DocumentStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    distributor: CommissionDistributor<S>,
}

impl<S: DocumentStore> ActivationService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        let distributor = CommissionDistributor::new(store.clone(), clock.clone());
        Self {
            store,
            clock,
            distributor,
        }
    }

    /// Activate (or top up) a rank for `user_id`.
    ///
    /// Wallet payments debit, record, and apply the rank in one atomic
    /// scope; the balance is re-read inside it, so concurrent activations
    /// against one wallet serialize and only those the balance covers
    /// succeed. External payments leave a pending transaction and a
    /// per-user guard; nothing is applied until confirmation.
    pub fn activate(
        &self,
        user_id: UserId,
        request: ActivationRequest,
    ) -> CoreResult<ActivationOutcome> {
        let now = self.clock.now();
        let txn_id = TxnId::generate();
        let pool_id = PoolId::generate();
        let lowest = lowest_rank_id(self.store.as_ref())?;
        let payment = request.payment.clone();

        let outcome = run_transaction(self.store.as_ref(), |txn| {
            let settings = load_settings(txn)?;
            ensure_not_maintenance(&settings)?;

            let user = load_user(txn, user_id)?;
            if user.status == UserStatus::Suspended {
                return Err(CoreError::AuthorizationDenied("account is suspended".into()));
            }
            let rank = load_rank(txn, request.rank)?;
            ensure_rank_progression(&user, request.rank, lowest)?;
            ensure_no_pending_activation(txn, user_id)?;

            let kind = if user.rank == Some(request.rank) {
                TransactionKind::Topup
            } else {
                TransactionKind::Activation
            };

            if payment.settles_synchronously() {
                let mut user = debit_available(txn, user_id, rank.activation_cost, now)?;
                user.rank = Some(request.rank);
                user.status = UserStatus::Active;
                user.updated_at = now;
                txn.set(collections::USERS, &user.id.to_string(), &user)?;

                if kind == TransactionKind::Activation {
                    let pool = new_income_pool(
                        pool_id,
                        &user,
                        &rank,
                        settings.direct_referral_requirement,
                        now,
                    )?;
                    txn.create(collections::INCOME_POOLS, &pool.id.to_string(), &pool)?;
                }

                let record = Transaction {
                    id: txn_id,
                    user_id,
                    kind,
                    amount: rank.activation_cost,
                    status: TransactionStatus::Completed,
                    payment: payment.clone(),
                    rank: Some(request.rank),
                    created_at: now,
                    completed_at: Some(now),
                };
                txn.create(collections::TRANSACTIONS, &record.id.to_string(), &record)?;

                Ok(ActivationOutcome {
                    transaction_id: txn_id,
                    activated_rank: request.rank,
                    total_cost: rank.activation_cost,
                    status: TransactionStatus::Completed,
                    pool_id: (kind == TransactionKind::Activation).then_some(pool_id),
                })
            } else {
                let reference = payment.external_reference().ok_or_else(|| {
                    CoreError::ValidationFailed("payment method requires a reference".into())
                })?;
                claim_payment_reference(txn, reference, txn_id, now)?;

                let guard = ActivationGuard {
                    user_id,
                    transaction_id: txn_id,
                    rank: request.rank,
                    created_at: now,
                };
                txn.create(
                    collections::PENDING_ACTIVATIONS,
                    &user_id.to_string(),
                    &guard,
                )?;

                let record = Transaction {
                    id: txn_id,
                    user_id,
                    kind,
                    amount: rank.activation_cost,
                    status: TransactionStatus::Pending,
                    payment: payment.clone(),
                    rank: Some(request.rank),
                    created_at: now,
                    completed_at: None,
                };
                txn.create(collections::TRANSACTIONS, &record.id.to_string(), &record)?;

                Ok(ActivationOutcome {
                    transaction_id: txn_id,
                    activated_rank: request.rank,
                    total_cost: rank.activation_cost,
                    status: TransactionStatus::Pending,
                    pool_id: None,
                })
            }
        })?;

        tracing::info!(
            user = %user_id,
            rank = %outcome.activated_rank,
            txn = %outcome.transaction_id,
            status = ?outcome.status,
            "activation recorded"
        );

        if outcome.status == TransactionStatus::Completed {
            self.distribute(outcome.transaction_id);
        }
        Ok(outcome)
    }

    /// Settle a pending external-payment activation: mark the transaction
    /// completed, apply the rank, create the pool, drop the guard.
    pub fn confirm_payment(&self, txn_id: TxnId) -> CoreResult<ActivationOutcome> {
        let now = self.clock.now();
        let pool_id = PoolId::generate();

        let outcome = run_transaction(self.store.as_ref(), |txn| {
            let mut record = load_pending_activation(txn, txn_id)?;
            let target = record
                .rank
                .ok_or_else(|| CoreError::Internal("activation record missing rank".into()))?;
            let settings = load_settings(txn)?;
            let rank = load_rank(txn, target)?;

            let mut user = load_user(txn, record.user_id)?;
            user.rank = Some(target);
            user.status = UserStatus::Active;
            user.updated_at = now;
            txn.set(collections::USERS, &user.id.to_string(), &user)?;

            if record.kind == TransactionKind::Activation {
                let pool = new_income_pool(
                    pool_id,
                    &user,
                    &rank,
                    settings.direct_referral_requirement,
                    now,
                )?;
                txn.create(collections::INCOME_POOLS, &pool.id.to_string(), &pool)?;
            }

            record.status = TransactionStatus::Completed;
            record.completed_at = Some(now);
            txn.set(collections::TRANSACTIONS, &txn_id.to_string(), &record)?;
            txn.delete(collections::PENDING_ACTIVATIONS, &record.user_id.to_string());

            Ok(ActivationOutcome {
                transaction_id: txn_id,
                activated_rank: target,
                total_cost: record.amount,
                status: TransactionStatus::Completed,
                pool_id: (record.kind == TransactionKind::Activation).then_some(pool_id),
            })
        })?;

        tracing::info!(txn = %txn_id, rank = %outcome.activated_rank, "external payment confirmed");
        self.distribute(txn_id);
        Ok(outcome)
    }

    /// Fail a pending external-payment activation and release its
    /// payment reference for reuse.
    pub fn reject_payment(&self, txn_id: TxnId) -> CoreResult<()> {
        let now = self.clock.now();
        run_transaction(self.store.as_ref(), |txn| {
            let mut record = load_pending_activation(txn, txn_id)?;
            record.status = TransactionStatus::Failed;
            record.completed_at = Some(now);

            if let Some(reference) = record.payment.external_reference() {
                txn.delete(collections::PAYMENT_REFS, &payment_ref_key(reference));
            }
            txn.delete(collections::PENDING_ACTIVATIONS, &record.user_id.to_string());
            txn.set(collections::TRANSACTIONS, &txn_id.to_string(), &record)?;
            Ok(())
        })?;
        tracing::info!(txn = %txn_id, "external payment rejected");
        Ok(())
    }

    /// Commission distribution is a follow-up of the settled activation.
    /// Its failure is logged and retried by redelivery, never surfaced to
    /// the activating user.
    fn distribute(&self, txn_id: TxnId) {
        if let Err(e) = self.distributor.on_transaction_completed(txn_id) {
            tracing::error!(txn = %txn_id, error = %e, "commission distribution failed");
        }
    }
}

fn load_pending_activation<S: DocumentStore + ?Sized>(
    txn: &mut uplinq_store::Txn<'_, S>,
    txn_id: TxnId,
) -> CoreResult<Transaction> {
    let record: Transaction = txn
        .get(collections::TRANSACTIONS, &txn_id.to_string())?
        .ok_or_else(|| CoreError::NotFound(format!("transaction {txn_id}")))?;
    if record.status != TransactionStatus::Pending {
        return Err(CoreError::Conflict(format!(
            "transaction {txn_id} is already settled"
        )));
    }
    if !matches!(
        record.kind,
        TransactionKind::Activation | TransactionKind::Topup
    ) {
        return Err(CoreError::PreconditionFailed(format!(
            "transaction {txn_id} is not an activation"
        )));
    }
    Ok(record)
}
