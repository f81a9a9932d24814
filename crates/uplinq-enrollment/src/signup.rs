//! Signup with sponsor placement.
//!
//! Placement is write-time guarded: the chosen sponsor must exist and its
//! ancestor chain must be acyclic, checked inside the creating
//! transaction so a racing re-parent (which the model forbids anyway)
//! cannot slip a cycle in. New users start Inactive and rankless; rank
//! activation is a separate, paid operation.

use shared_types::{
    Claims, Clock, CoreError, CoreResult, IdentityProvider, Money, User, UserId, UserStatus,
};
use std::collections::HashSet;
use std::sync::Arc;
use uplinq_ledger::{ensure_not_maintenance, load_settings, load_user};
use uplinq_store::{collections, run_transaction, DocumentStore, Txn};

/// Hard bound on ancestor-chain length during the placement check.
/// A legitimate chain never approaches this; hitting it means corrupted
/// data and the placement is rejected.
const MAX_PLACEMENT_DEPTH: usize = 128;

/// Signup input.
#[derive(Clone, Debug, Default)]
pub struct SignupRequest {
    pub sponsor_id: Option<UserId>,
}

/// Result of a successful signup.
#[derive(Clone, Debug)]
pub struct SignupOutcome {
    pub user: User,
    /// Bearer token for the freshly created identity.
    pub token: String,
}

/// Signup / placement service.
pub struct EnrollmentService<S: DocumentStore> {
    store: Arc<S>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
}

impl<S: DocumentStore> EnrollmentService<S> {
    pub fn new(store: Arc<S>, identity: Arc<dyn IdentityProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            identity,
            clock,
        }
    }

    pub fn signup(&self, request: SignupRequest) -> CoreResult<SignupOutcome> {
        let user_id = UserId::generate();
        let now = self.clock.now();

        // Identity first: a retried transaction must not mint a second
        // identity, and an orphaned identity without a user document is
        // harmless.
        let token = self.identity.create_identity(Claims::member(user_id))?;

        let user = run_transaction(self.store.as_ref(), |txn| {
            let settings = load_settings(txn)?;
            if !settings.registration_open {
                return Err(CoreError::PreconditionFailed(
                    "registration is currently closed".into(),
                ));
            }
            ensure_not_maintenance(&settings)?;

            if let Some(sponsor_id) = request.sponsor_id {
                let mut sponsor = load_user(txn, sponsor_id)
                    .map_err(|_| CoreError::NotFound(format!("sponsor {sponsor_id}")))?;
                ensure_acyclic_chain(txn, &sponsor)?;

                sponsor.direct_referrals += 1;
                sponsor.updated_at = now;
                txn.set(collections::USERS, &sponsor.id.to_string(), &sponsor)?;
            }

            let user = User {
                id: user_id,
                sponsor_id: request.sponsor_id,
                rank: None,
                status: UserStatus::Inactive,
                available_balance: Money::ZERO,
                locked_balance: Money::ZERO,
                total_earnings: Money::ZERO,
                direct_referrals: 0,
                created_at: now,
                updated_at: now,
            };
            txn.create(collections::USERS, &user.id.to_string(), &user)?;
            Ok(user)
        })?;

        tracing::info!(user = %user.id, sponsor = ?request.sponsor_id, "user signed up");

        // The sponsor's referral count changed; refreshing pool
        // claimability is a follow-up observer of that change. Its
        // failure is logged, never surfaced: the signup is committed.
        if let Some(sponsor_id) = request.sponsor_id {
            if let Err(e) = crate::referrals::refresh_pool_claimability(
                self.store.as_ref(),
                sponsor_id,
                now,
            ) {
                tracing::error!(sponsor = %sponsor_id, error = %e, "pool claimability refresh failed");
            }
        }

        Ok(SignupOutcome { user, token })
    }
}

/// Walk the sponsor's ancestor chain; reject placements whose chain
/// revisits a node or exceeds the sanity bound.
fn ensure_acyclic_chain<S: DocumentStore + ?Sized>(
    txn: &mut Txn<'_, S>,
    sponsor: &User,
) -> CoreResult<()> {
    let mut visited: HashSet<UserId> = HashSet::new();
    visited.insert(sponsor.id);

    let mut cursor = sponsor.sponsor_id;
    let mut depth = 0usize;
    while let Some(ancestor_id) = cursor {
        depth += 1;
        if depth > MAX_PLACEMENT_DEPTH {
            return Err(CoreError::ValidationFailed(
                "sponsor chain exceeds maximum depth".into(),
            ));
        }
        if !visited.insert(ancestor_id) {
            return Err(CoreError::ValidationFailed(
                "sponsor chain contains a cycle".into(),
            ));
        }
        match txn.get::<User>(collections::USERS, &ancestor_id.to_string())? {
            Some(ancestor) => cursor = ancestor.sponsor_id,
            // Broken link: the chain is short but acyclic, placement is
            // still valid.
            None => break,
        }
    }
    Ok(())
}
