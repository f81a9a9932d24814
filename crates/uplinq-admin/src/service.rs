//! Administrative operations.

use serde_json::json;
use shared_types::{
    AuditRecord, Claims, Clock, CoreError, CoreResult, PayoutId, PayoutRequest, PlatformSettings,
    Rank, Transaction, TxnId, UserId, UserStatus,
};
use std::sync::Arc;
use uplinq_activation::{ActivationOutcome, ActivationService};
use uplinq_ledger::{load_user, PayoutService, WithdrawalService};
use uplinq_store::{collections, run_transaction, DocumentStore, WriteOp};
use uplinq_telemetry::{AuditEvent, AuditSink};

/// Partial settings update; unset fields keep their current value.
/// The singleton is read-modify-written, so of two concurrent updates
/// the later commit wins whole.
#[derive(Clone, Debug, Default)]
pub struct SettingsUpdate {
    pub direct_referral_requirement: Option<u32>,
    pub maintenance_mode: Option<bool>,
    pub registration_open: Option<bool>,
}

/// Role-gated administrative service.
pub struct AdminService<S: DocumentStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditSink>,
    activations: ActivationService<S>,
    withdrawals: WithdrawalService<S>,
    payouts: PayoutService<S>,
}

impl<S: DocumentStore> AdminService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            activations: ActivationService::new(store.clone(), clock.clone()),
            withdrawals: WithdrawalService::new(store.clone(), clock.clone()),
            payouts: PayoutService::new(store.clone(), clock.clone()),
            store,
            clock,
            audit,
        }
    }

    /// Apply a partial update to the platform settings singleton.
    pub fn update_settings(
        &self,
        actor: &Claims,
        update: SettingsUpdate,
    ) -> CoreResult<PlatformSettings> {
        require_admin(actor)?;
        let now = self.clock.now();
        let actor_id = actor.user_id;

        let settings = run_transaction(self.store.as_ref(), |txn| {
            let mut settings = txn
                .get::<PlatformSettings>(
                    collections::PLATFORM_SETTINGS,
                    collections::SINGLETON_DOC,
                )?
                .unwrap_or_default();
            if let Some(requirement) = update.direct_referral_requirement {
                settings.direct_referral_requirement = requirement;
            }
            if let Some(maintenance) = update.maintenance_mode {
                settings.maintenance_mode = maintenance;
            }
            if let Some(open) = update.registration_open {
                settings.registration_open = open;
            }
            settings.updated_at = Some(now);
            settings.updated_by = Some(actor_id);
            txn.set(
                collections::PLATFORM_SETTINGS,
                collections::SINGLETON_DOC,
                &settings,
            )?;
            Ok(settings)
        })?;

        self.record(
            actor,
            "settings.update",
            format!(
                "{}/{}",
                collections::PLATFORM_SETTINGS,
                collections::SINGLETON_DOC
            ),
            json!({
                "direct_referral_requirement": settings.direct_referral_requirement,
                "maintenance_mode": settings.maintenance_mode,
                "registration_open": settings.registration_open,
            }),
        );
        Ok(settings)
    }

    /// Create or replace a rank definition.
    pub fn upsert_rank(&self, actor: &Claims, rank: Rank) -> CoreResult<Rank> {
        require_admin(actor)?;
        if rank.name.trim().is_empty() {
            return Err(CoreError::ValidationFailed("rank name must not be empty".into()));
        }
        if rank.activation_cost.is_zero() {
            return Err(CoreError::ValidationFailed(
                "rank activation cost must be positive".into(),
            ));
        }

        run_transaction(self.store.as_ref(), |txn| {
            txn.set(collections::RANKS, &rank.id.to_string(), &rank)?;
            Ok(())
        })?;

        self.record(
            actor,
            "rank.upsert",
            format!("{}/{}", collections::RANKS, rank.id),
            json!({ "name": rank.name, "activation_cost": rank.activation_cost }),
        );
        Ok(rank)
    }

    /// Confirm an external payment, settling its pending activation.
    pub fn confirm_activation(&self, actor: &Claims, txn_id: TxnId) -> CoreResult<ActivationOutcome> {
        require_admin(actor)?;
        let outcome = self.activations.confirm_payment(txn_id)?;
        self.record(
            actor,
            "activation.confirm",
            format!("{}/{}", collections::TRANSACTIONS, txn_id),
            json!({ "rank": outcome.activated_rank, "amount": outcome.total_cost }),
        );
        Ok(outcome)
    }

    /// Reject an external payment, failing its pending activation.
    pub fn reject_activation(&self, actor: &Claims, txn_id: TxnId) -> CoreResult<()> {
        require_admin(actor)?;
        self.activations.reject_payment(txn_id)?;
        self.record(
            actor,
            "activation.reject",
            format!("{}/{}", collections::TRANSACTIONS, txn_id),
            json!({}),
        );
        Ok(())
    }

    pub fn approve_withdrawal(&self, actor: &Claims, txn_id: TxnId) -> CoreResult<Transaction> {
        require_admin(actor)?;
        let record = self.withdrawals.approve(txn_id)?;
        self.record(
            actor,
            "withdrawal.approve",
            format!("{}/{}", collections::TRANSACTIONS, txn_id),
            json!({ "user": record.user_id, "amount": record.amount }),
        );
        Ok(record)
    }

    pub fn reject_withdrawal(&self, actor: &Claims, txn_id: TxnId) -> CoreResult<Transaction> {
        require_admin(actor)?;
        let record = self.withdrawals.reject(txn_id)?;
        self.record(
            actor,
            "withdrawal.reject",
            format!("{}/{}", collections::TRANSACTIONS, txn_id),
            json!({ "user": record.user_id, "amount": record.amount }),
        );
        Ok(record)
    }

    pub fn queue_payout(
        &self,
        actor: &Claims,
        user_id: UserId,
        amount: shared_types::Money,
    ) -> CoreResult<PayoutRequest> {
        require_admin(actor)?;
        let payout = self.payouts.queue(user_id, amount)?;
        self.record(
            actor,
            "payout.queue",
            format!("{}/{}", collections::PAYOUT_QUEUE, payout.id),
            json!({ "user": user_id, "amount": amount }),
        );
        Ok(payout)
    }

    pub fn mark_payout_ready(&self, actor: &Claims, payout_id: PayoutId) -> CoreResult<PayoutRequest> {
        require_admin(actor)?;
        let payout = self.payouts.mark_ready(payout_id)?;
        self.record(
            actor,
            "payout.ready",
            format!("{}/{}", collections::PAYOUT_QUEUE, payout_id),
            json!({ "user": payout.user_id }),
        );
        Ok(payout)
    }

    pub fn reject_payout(&self, actor: &Claims, payout_id: PayoutId) -> CoreResult<PayoutRequest> {
        require_admin(actor)?;
        let payout = self.payouts.mark_rejected(payout_id)?;
        self.record(
            actor,
            "payout.reject",
            format!("{}/{}", collections::PAYOUT_QUEUE, payout_id),
            json!({ "user": payout.user_id }),
        );
        Ok(payout)
    }

    /// Suspend or reinstate a member. Suspension blocks activations but
    /// never touches balances.
    pub fn set_user_status(
        &self,
        actor: &Claims,
        user_id: UserId,
        status: UserStatus,
    ) -> CoreResult<()> {
        require_admin(actor)?;
        let now = self.clock.now();
        run_transaction(self.store.as_ref(), |txn| {
            let mut user = load_user(txn, user_id)?;
            user.status = status;
            user.updated_at = now;
            txn.set(collections::USERS, &user.id.to_string(), &user)?;
            Ok(())
        })?;
        self.record(
            actor,
            "user.set-status",
            format!("{}/{}", collections::USERS, user_id),
            json!({ "status": status }),
        );
        Ok(())
    }

    /// Audit is a side channel: the sink gets a structured event and the
    /// audit-log collection gets a document, both best-effort. A failed
    /// persist is logged and never fails the already-applied operation.
    fn record(&self, actor: &Claims, action: &str, subject: String, detail: serde_json::Value) {
        self.audit.record(AuditEvent::new(
            Some(actor.user_id),
            action,
            subject.clone(),
            detail.clone(),
        ));

        let record = AuditRecord {
            id: uuid::Uuid::new_v4(),
            actor: actor.user_id,
            action: action.to_string(),
            subject,
            detail,
            at: self.clock.now(),
        };
        let data = match serde_json::to_value(&record) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(error = %e, "audit record serialization failed");
                return;
            }
        };
        if let Err(e) = self.store.batch_write(vec![WriteOp::Create {
            collection: collections::AUDIT_LOG.to_string(),
            id: record.id.to_string(),
            data,
        }]) {
            tracing::error!(error = %e, action = %record.action, "audit record persist failed");
        }
    }
}

fn require_admin(claims: &Claims) -> CoreResult<()> {
    if !claims.is_admin() {
        return Err(CoreError::AuthorizationDenied(
            "administrator role required".into(),
        ));
    }
    Ok(())
}
