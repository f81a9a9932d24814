//! Commission distributor.
//!
//! Consumes a completed activation/top-up transaction and pays the
//! upline: level income to available balances, the referral share to the
//! direct sponsor's income pool (clamped at the cap), and the global
//! share to the platform accumulator.
//!
//! ## Idempotency
//!
//! Trigger delivery is at-least-once. A marker document keyed by the
//! source transaction id is claimed with create-if-absent inside one
//! store transaction before any money moves; a redelivery observes the
//! marker and returns the recorded entry ids without paying again.

use crate::schedule::{level_income_bps, GLOBAL_INCOME_BPS, LEVEL_INCOME_DEPTH, REFERRAL_INCOME_BPS};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_types::{
    Clock, CoreError, CoreResult, EntryId, GlobalPool, IncomeEntry, IncomeKind, IncomePool, Money,
    Transaction, TransactionKind, TransactionStatus, TxnId, User, UserId,
};
use std::sync::Arc;
use uplinq_enrollment::{UplineHop, UplineWalk};
use uplinq_ledger::credit_earnings;
use uplinq_store::{collections, run_transaction, DocumentStore, FieldFilter};

/// Idempotency marker for one source transaction.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct DistributionMarker {
    source_transaction_id: TxnId,
    entry_ids: Vec<EntryId>,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

/// Multi-level commission distributor.
pub struct CommissionDistributor<S: DocumentStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: DocumentStore> CommissionDistributor<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Process one completed activation transaction. Safe to re-deliver.
    /// Returns the income-entry ids this distribution created.
    pub fn on_transaction_completed(&self, txn_id: TxnId) -> CoreResult<Vec<EntryId>> {
        let source = self.load_source(txn_id)?;
        let activator = self.load_user(source.user_id)?;
        let now = self.clock.now();

        // Claim the marker. Test-and-set in one atomic scope: a racing
        // or re-delivered trigger sees the claim and stops.
        let marker_id = txn_id.to_string();
        let already_processed = run_transaction(self.store.as_ref(), |txn| {
            if let Some(marker) =
                txn.get::<DistributionMarker>(collections::DISTRIBUTIONS, &marker_id)?
            {
                return Ok(Some(marker.entry_ids));
            }
            txn.create(
                collections::DISTRIBUTIONS,
                &marker_id,
                &DistributionMarker {
                    source_transaction_id: txn_id,
                    entry_ids: Vec::new(),
                    created_at: now,
                    processed_at: None,
                },
            )?;
            Ok(None)
        })?;
        if let Some(entry_ids) = already_processed {
            tracing::info!(txn = %txn_id, "distribution redelivered, already processed");
            return Ok(entry_ids);
        }

        let package = source.amount;
        let hops: Vec<UplineHop> =
            UplineWalk::from_user(self.store.as_ref(), &activator, LEVEL_INCOME_DEPTH).collect();

        let mut entry_ids = Vec::new();

        // Level income: one atomic unit per recipient; a failure is
        // logged and skipped, siblings proceed.
        for hop in &hops {
            if !hop.user.is_active() {
                tracing::debug!(recipient = %hop.user.id, level = hop.level, "skipping inactive upline");
                continue;
            }
            let Some(bps) = level_income_bps(hop.level) else {
                break;
            };
            let amount = package.apply_bps(bps);
            if amount.is_zero() {
                continue;
            }
            match self.pay_level_income(&source, hop, amount, now) {
                Ok(entry_id) => entry_ids.push(entry_id),
                Err(e) => {
                    tracing::error!(
                        recipient = %hop.user.id,
                        level = hop.level,
                        error = %e,
                        "level income credit failed, skipping recipient"
                    );
                }
            }
        }

        // Referral income: direct sponsor's pool, clamped at the cap.
        if let Some(direct) = hops.iter().find(|h| h.level == 1) {
            match self.credit_referral_pool(&source, &direct.user, package, now) {
                Ok(Some(entry_id)) => entry_ids.push(entry_id),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(sponsor = %direct.user.id, error = %e, "referral pool credit failed");
                }
            }
        }

        // Global share: platform accumulator, no individual recipient.
        if let Err(e) = self.credit_global_pool(txn_id, package) {
            tracing::error!(txn = %txn_id, error = %e, "global pool credit failed");
        }

        // Record the created entries on the marker for redeliveries.
        let recorded = entry_ids.clone();
        run_transaction(self.store.as_ref(), |txn| {
            if let Some(mut marker) =
                txn.get::<DistributionMarker>(collections::DISTRIBUTIONS, &marker_id)?
            {
                marker.entry_ids = recorded.clone();
                marker.processed_at = Some(now);
                txn.set(collections::DISTRIBUTIONS, &marker_id, &marker)?;
            }
            Ok(())
        })?;

        tracing::info!(txn = %txn_id, entries = entry_ids.len(), "commission distribution complete");
        Ok(entry_ids)
    }

    fn load_source(&self, txn_id: TxnId) -> CoreResult<Transaction> {
        let source: Transaction = self
            .store
            .get(collections::TRANSACTIONS, &txn_id.to_string())?
            .ok_or_else(|| CoreError::NotFound(format!("transaction {txn_id}")))?
            .parse()?;
        if source.status != TransactionStatus::Completed {
            return Err(CoreError::PreconditionFailed(format!(
                "transaction {txn_id} is not completed"
            )));
        }
        if !matches!(
            source.kind,
            TransactionKind::Activation | TransactionKind::Topup
        ) {
            return Err(CoreError::PreconditionFailed(format!(
                "transaction {txn_id} does not carry commissions"
            )));
        }
        Ok(source)
    }

    fn load_user(&self, user_id: UserId) -> CoreResult<User> {
        Ok(self
            .store
            .get(collections::USERS, &user_id.to_string())?
            .ok_or_else(|| CoreError::NotFound(format!("user {user_id}")))?
            .parse()?)
    }

    fn pay_level_income(
        &self,
        source: &Transaction,
        hop: &UplineHop,
        amount: Money,
        now: DateTime<Utc>,
    ) -> CoreResult<EntryId> {
        let entry_id = EntryId::generate();
        let recipient_id = hop.user.id;
        let level = hop.level;
        run_transaction(self.store.as_ref(), |txn| {
            credit_earnings(txn, recipient_id, amount, now)?;
            let entry = IncomeEntry {
                id: entry_id,
                recipient_id,
                source_user_id: source.user_id,
                income: IncomeKind::Level { level },
                amount,
                source_transaction_id: source.id,
                created_at: now,
            };
            txn.create(collections::INCOME_ENTRIES, &entry.id.to_string(), &entry)?;
            Ok(())
        })?;
        Ok(entry_id)
    }

    /// Credit the referral share into the sponsor's unclaimed pool for
    /// their current rank. Returns `None` when no eligible pool exists
    /// or the pool has no remaining capacity.
    fn credit_referral_pool(
        &self,
        source: &Transaction,
        sponsor: &User,
        package: Money,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<EntryId>> {
        if !sponsor.is_active() {
            return Ok(None);
        }
        let Some(rank) = sponsor.rank else {
            return Ok(None);
        };
        let share = package.apply_bps(REFERRAL_INCOME_BPS);
        if share.is_zero() {
            return Ok(None);
        }

        let pools = self.store.query(
            collections::INCOME_POOLS,
            &[
                FieldFilter::eq("user_id", json!(sponsor.id)),
                FieldFilter::eq("rank", json!(rank)),
            ],
            None,
        )?;
        let Some(pool_doc) = pools
            .iter()
            .find(|doc| doc.parse::<IncomePool>().is_ok_and(|p| p.claimed_at.is_none()))
        else {
            tracing::warn!(sponsor = %sponsor.id, %rank, "no open income pool for referral credit");
            return Ok(None);
        };
        let pool_id = pool_doc.id.clone();

        let entry_id = EntryId::generate();
        let credited = run_transaction(self.store.as_ref(), |txn| {
            let Some(mut pool) = txn.get::<IncomePool>(collections::INCOME_POOLS, &pool_id)?
            else {
                return Ok(Money::ZERO);
            };
            if pool.claimed_at.is_some() {
                return Ok(Money::ZERO);
            }
            // Clamp at the cap rather than overfill.
            let credited = share.min(pool.remaining_capacity());
            if credited.is_zero() {
                return Ok(Money::ZERO);
            }
            pool.pool_income = pool
                .pool_income
                .checked_add(credited)
                .ok_or_else(|| CoreError::Internal("pool income overflow".into()))?;
            pool.updated_at = now;
            txn.set(collections::INCOME_POOLS, &pool_id, &pool)?;

            let entry = IncomeEntry {
                id: entry_id,
                recipient_id: pool.user_id,
                source_user_id: source.user_id,
                income: IncomeKind::Referral,
                amount: credited,
                source_transaction_id: source.id,
                created_at: now,
            };
            txn.create(collections::INCOME_ENTRIES, &entry.id.to_string(), &entry)?;
            Ok(credited)
        })?;

        Ok((!credited.is_zero()).then_some(entry_id))
    }

    fn credit_global_pool(&self, txn_id: TxnId, package: Money) -> CoreResult<()> {
        let share = package.apply_bps(GLOBAL_INCOME_BPS);
        if share.is_zero() {
            return Ok(());
        }
        run_transaction(self.store.as_ref(), |txn| {
            let mut pool = txn
                .get::<GlobalPool>(collections::GLOBAL_POOL, collections::SINGLETON_DOC)?
                .unwrap_or_default();
            pool.total = pool
                .total
                .checked_add(share)
                .ok_or_else(|| CoreError::Internal("global pool overflow".into()))?;
            pool.last_source_transaction = Some(txn_id);
            txn.set(
                collections::GLOBAL_POOL,
                collections::SINGLETON_DOC,
                &pool,
            )?;
            Ok(())
        })
    }
}
