//! Withdrawal workflow.
//!
//! `request` locks the funds and records a Pending withdrawal; an
//! administrator later settles (`approve`) or returns (`reject`) them.
//! Every step is one store transaction, so a double-submitted approval
//! or a race with another balance mutation resolves to exactly one
//! winner.

use crate::balance::{lock_for_withdrawal, release_lock, settle_locked};
use crate::settings::{ensure_not_maintenance, load_settings};
use shared_types::{
    Clock, CoreError, CoreResult, Money, PaymentMethod, Transaction, TransactionKind,
    TransactionStatus, TxnId, UserId,
};
use std::sync::Arc;
use uplinq_store::{collections, DocumentStore, run_transaction, Txn};

/// Withdrawal request/approval service.
pub struct WithdrawalService<S: DocumentStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: DocumentStore> WithdrawalService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Lock `amount` and record a Pending withdrawal transaction.
    pub fn request(&self, user_id: UserId, amount: Money) -> CoreResult<Transaction> {
        if amount.is_zero() {
            return Err(CoreError::ValidationFailed(
                "withdrawal amount must be positive".into(),
            ));
        }
        let now = self.clock.now();
        let record = run_transaction(self.store.as_ref(), |txn| {
            let settings = load_settings(txn)?;
            ensure_not_maintenance(&settings)?;

            lock_for_withdrawal(txn, user_id, amount, now)?;

            let record = Transaction {
                id: TxnId::generate(),
                user_id,
                kind: TransactionKind::Withdrawal,
                amount,
                status: TransactionStatus::Pending,
                payment: PaymentMethod::Wallet,
                rank: None,
                created_at: now,
                completed_at: None,
            };
            txn.create(collections::TRANSACTIONS, &record.id.to_string(), &record)?;
            Ok(record)
        })?;

        tracing::info!(user = %user_id, txn = %record.id, %amount, "withdrawal requested");
        Ok(record)
    }

    /// Settle the locked funds and complete the withdrawal.
    pub fn approve(&self, txn_id: TxnId) -> CoreResult<Transaction> {
        let now = self.clock.now();
        let record = run_transaction(self.store.as_ref(), |txn| {
            let mut record = load_withdrawal(txn, txn_id)?;
            ensure_pending(&record)?;

            settle_locked(txn, record.user_id, record.amount, now)?;
            record.status = TransactionStatus::Completed;
            record.completed_at = Some(now);
            txn.set(collections::TRANSACTIONS, &record.id.to_string(), &record)?;
            Ok(record)
        })?;

        tracing::info!(txn = %record.id, user = %record.user_id, "withdrawal approved");
        Ok(record)
    }

    /// Return the locked funds and fail the withdrawal.
    pub fn reject(&self, txn_id: TxnId) -> CoreResult<Transaction> {
        let now = self.clock.now();
        let record = run_transaction(self.store.as_ref(), |txn| {
            let mut record = load_withdrawal(txn, txn_id)?;
            ensure_pending(&record)?;

            release_lock(txn, record.user_id, record.amount, now)?;
            record.status = TransactionStatus::Failed;
            txn.set(collections::TRANSACTIONS, &record.id.to_string(), &record)?;
            Ok(record)
        })?;

        tracing::info!(txn = %record.id, user = %record.user_id, "withdrawal rejected");
        Ok(record)
    }
}

fn load_withdrawal<S: DocumentStore + ?Sized>(
    txn: &mut Txn<'_, S>,
    txn_id: TxnId,
) -> CoreResult<Transaction> {
    let record = txn
        .get::<Transaction>(collections::TRANSACTIONS, &txn_id.to_string())?
        .ok_or_else(|| CoreError::NotFound(format!("transaction {txn_id}")))?;
    if record.kind != TransactionKind::Withdrawal {
        return Err(CoreError::ValidationFailed(format!(
            "transaction {txn_id} is not a withdrawal"
        )));
    }
    Ok(record)
}

/// Completed/Failed are terminal; re-processing is a conflict, which also
/// covers a double-delivered approval.
fn ensure_pending(record: &Transaction) -> CoreResult<()> {
    match record.status {
        TransactionStatus::Pending => Ok(()),
        TransactionStatus::Completed | TransactionStatus::Failed => Err(CoreError::Conflict(
            format!("withdrawal {} already processed", record.id),
        )),
    }
}
