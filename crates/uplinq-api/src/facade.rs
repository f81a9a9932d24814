//! Async API facade.
//!
//! One handler per public operation: verify the bearer token into
//! [`Claims`], invoke the owning service, translate the outcome into a
//! response body. Handlers hold no state of their own; everything lives
//! in the store behind the services.

use crate::dto::{
    ActivateBody, ActivationResponse, ApiResult, PayoutClaimResponse, PoolClaimResponse,
    ProfileResponse, RankBody, SettingsBody, SignupBody, SignupResponse, WithdrawBody,
    WithdrawResponse,
};
use async_trait::async_trait;
use shared_types::{
    Claims, Clock, CoreError, IdentityProvider, PayoutId, PoolId, Rank, TxnId, User, UserId,
    UserStatus,
};
use std::sync::Arc;
use uplinq_activation::{ActivationRequest, ActivationService, PoolService};
use uplinq_admin::{AdminService, SettingsUpdate};
use uplinq_enrollment::{EnrollmentService, SignupRequest};
use uplinq_ledger::{PayoutService, WithdrawalService};
use uplinq_store::{collections, DocumentStore};
use uplinq_telemetry::AuditSink;

/// Member-facing operations. The trait is the seam HTTP adapters and
/// test doubles program against.
#[async_trait]
pub trait MemberApi: Send + Sync {
    async fn signup(&self, body: SignupBody) -> ApiResult<SignupResponse>;
    async fn profile(&self, token: &str) -> ApiResult<ProfileResponse>;
    async fn activate(&self, token: &str, body: ActivateBody) -> ApiResult<ActivationResponse>;
    async fn claim_pool(&self, token: &str, pool_id: PoolId) -> ApiResult<PoolClaimResponse>;
    async fn request_withdrawal(&self, token: &str, body: WithdrawBody)
        -> ApiResult<WithdrawResponse>;
    async fn claim_payout(&self, token: &str, payout_id: PayoutId)
        -> ApiResult<PayoutClaimResponse>;
}

/// The platform facade: member surface plus the admin surface.
pub struct UplinqApi<S: DocumentStore> {
    store: Arc<S>,
    identity: Arc<dyn IdentityProvider>,
    enrollment: EnrollmentService<S>,
    activations: ActivationService<S>,
    pools: PoolService<S>,
    withdrawals: WithdrawalService<S>,
    payouts: PayoutService<S>,
    admin: AdminService<S>,
}

impl<S: DocumentStore + 'static> UplinqApi<S> {
    pub fn new(
        store: Arc<S>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            enrollment: EnrollmentService::new(store.clone(), identity.clone(), clock.clone()),
            activations: ActivationService::new(store.clone(), clock.clone()),
            pools: PoolService::new(store.clone(), clock.clone()),
            withdrawals: WithdrawalService::new(store.clone(), clock.clone()),
            payouts: PayoutService::new(store.clone(), clock.clone()),
            admin: AdminService::new(store.clone(), clock, audit),
            store,
            identity,
        }
    }

    fn authenticate(&self, token: &str) -> ApiResult<Claims> {
        Ok(self.identity.verify_token(token)?)
    }

    fn load_user(&self, user_id: UserId) -> ApiResult<User> {
        Ok(self
            .store
            .get(collections::USERS, &user_id.to_string())
            .map_err(CoreError::from)?
            .ok_or_else(|| CoreError::NotFound(format!("user {user_id}")))?
            .parse::<User>()
            .map_err(CoreError::from)?)
    }

    /// Mirror the post-activation state onto the identity claims so auth
    /// middleware can gate on them without a store read. Best-effort.
    fn sync_claims(&self, claims: &Claims, outcome: &ActivationResponse) {
        let updated = Claims {
            active: true,
            rank: Some(outcome.activated_rank),
            ..claims.clone()
        };
        if let Err(e) = self.identity.set_claims(claims.user_id, updated) {
            tracing::warn!(user = %claims.user_id, error = %e, "claims sync failed");
        }
    }

    // --- admin surface ---

    pub async fn admin_update_settings(
        &self,
        token: &str,
        body: SettingsBody,
    ) -> ApiResult<()> {
        let claims = self.authenticate(token)?;
        self.admin.update_settings(
            &claims,
            SettingsUpdate {
                direct_referral_requirement: body.direct_referral_requirement,
                maintenance_mode: body.maintenance_mode,
                registration_open: body.registration_open,
            },
        )?;
        Ok(())
    }

    pub async fn admin_upsert_rank(&self, token: &str, body: RankBody) -> ApiResult<()> {
        let claims = self.authenticate(token)?;
        self.admin.upsert_rank(
            &claims,
            Rank {
                id: body.id,
                name: body.name,
                activation_cost: body.activation_cost,
            },
        )?;
        Ok(())
    }

    pub async fn admin_confirm_activation(
        &self,
        token: &str,
        txn_id: TxnId,
    ) -> ApiResult<ActivationResponse> {
        let claims = self.authenticate(token)?;
        let outcome = self.admin.confirm_activation(&claims, txn_id)?;
        let response = ActivationResponse {
            transaction_id: outcome.transaction_id,
            activated_rank: outcome.activated_rank,
            total_cost: outcome.total_cost,
            status: outcome.status,
            pool_id: outcome.pool_id,
        };
        // Sync the activated member's claims (not the admin's);
        // best-effort, the activation is already committed.
        match member_of(&self.store, txn_id).and_then(|id| self.load_user(id)) {
            Ok(user) => {
                let member = Claims {
                    user_id: user.id,
                    role: shared_types::Role::Member,
                    active: true,
                    rank: user.rank,
                };
                if let Err(e) = self.identity.set_claims(user.id, member) {
                    tracing::warn!(user = %user.id, error = %e, "claims sync failed");
                }
            }
            Err(e) => tracing::warn!(txn = %txn_id, error = ?e, "claims sync skipped"),
        }
        Ok(response)
    }

    pub async fn admin_reject_activation(&self, token: &str, txn_id: TxnId) -> ApiResult<()> {
        let claims = self.authenticate(token)?;
        Ok(self.admin.reject_activation(&claims, txn_id)?)
    }

    pub async fn admin_approve_withdrawal(&self, token: &str, txn_id: TxnId) -> ApiResult<()> {
        let claims = self.authenticate(token)?;
        self.admin.approve_withdrawal(&claims, txn_id)?;
        Ok(())
    }

    pub async fn admin_reject_withdrawal(&self, token: &str, txn_id: TxnId) -> ApiResult<()> {
        let claims = self.authenticate(token)?;
        self.admin.reject_withdrawal(&claims, txn_id)?;
        Ok(())
    }

    pub async fn admin_queue_payout(
        &self,
        token: &str,
        user_id: UserId,
        amount: shared_types::Money,
    ) -> ApiResult<PayoutId> {
        let claims = self.authenticate(token)?;
        Ok(self.admin.queue_payout(&claims, user_id, amount)?.id)
    }

    pub async fn admin_mark_payout_ready(&self, token: &str, payout_id: PayoutId) -> ApiResult<()> {
        let claims = self.authenticate(token)?;
        self.admin.mark_payout_ready(&claims, payout_id)?;
        Ok(())
    }

    pub async fn admin_set_user_status(
        &self,
        token: &str,
        user_id: UserId,
        status: UserStatus,
    ) -> ApiResult<()> {
        let claims = self.authenticate(token)?;
        Ok(self.admin.set_user_status(&claims, user_id, status)?)
    }
}

#[async_trait]
impl<S: DocumentStore + 'static> MemberApi for UplinqApi<S> {
    async fn signup(&self, body: SignupBody) -> ApiResult<SignupResponse> {
        let outcome = self.enrollment.signup(SignupRequest {
            sponsor_id: body.sponsor_id,
        })?;
        Ok(SignupResponse {
            user_id: outcome.user.id,
            token: outcome.token,
            status: outcome.user.status,
        })
    }

    async fn profile(&self, token: &str) -> ApiResult<ProfileResponse> {
        let claims = self.authenticate(token)?;
        Ok(self.load_user(claims.user_id)?.into())
    }

    async fn activate(&self, token: &str, body: ActivateBody) -> ApiResult<ActivationResponse> {
        let claims = self.authenticate(token)?;
        let outcome = self.activations.activate(
            claims.user_id,
            ActivationRequest {
                rank: body.rank,
                payment: body.payment,
            },
        )?;
        let response = ActivationResponse {
            transaction_id: outcome.transaction_id,
            activated_rank: outcome.activated_rank,
            total_cost: outcome.total_cost,
            status: outcome.status,
            pool_id: outcome.pool_id,
        };
        if response.status == shared_types::TransactionStatus::Completed {
            self.sync_claims(&claims, &response);
        }
        Ok(response)
    }

    async fn claim_pool(&self, token: &str, pool_id: PoolId) -> ApiResult<PoolClaimResponse> {
        let claims = self.authenticate(token)?;
        let outcome = self.pools.claim(claims.user_id, pool_id)?;
        Ok(PoolClaimResponse {
            pool_id: outcome.pool_id,
            claimed_amount: outcome.claimed_amount,
            new_available_balance: outcome.new_available_balance,
        })
    }

    async fn request_withdrawal(
        &self,
        token: &str,
        body: WithdrawBody,
    ) -> ApiResult<WithdrawResponse> {
        let claims = self.authenticate(token)?;
        let record = self.withdrawals.request(claims.user_id, body.amount)?;
        Ok(WithdrawResponse {
            transaction_id: record.id,
            amount: record.amount,
            status: record.status,
        })
    }

    async fn claim_payout(
        &self,
        token: &str,
        payout_id: PayoutId,
    ) -> ApiResult<PayoutClaimResponse> {
        let claims = self.authenticate(token)?;
        let outcome = self.payouts.claim(claims.user_id, payout_id)?;
        Ok(PayoutClaimResponse {
            payout_id: outcome.payout_id,
            claimed_amount: outcome.claimed_amount,
            new_available_balance: outcome.new_available_balance,
        })
    }
}

/// Owner of a transaction record, for post-confirmation claims sync.
fn member_of<S: DocumentStore>(store: &Arc<S>, txn_id: TxnId) -> ApiResult<UserId> {
    let record: shared_types::Transaction = store
        .get(collections::TRANSACTIONS, &txn_id.to_string())
        .map_err(CoreError::from)?
        .ok_or_else(|| CoreError::NotFound(format!("transaction {txn_id}")))?
        .parse()
        .map_err(CoreError::from)?;
    Ok(record.user_id)
}
