//! Shared platform fixture.
//!
//! One in-memory store with every service wired over it, plus seeded
//! rank definitions. Amounts are minor units throughout: rank 1 costs
//! 100.00, rank 2 costs 250.00, rank 3 costs 500.00.

use shared_types::{
    Claims, IncomePool, Money, PaymentMethod, PoolId, RankId, StaticIdentityProvider,
    SystemClock, Transaction, TxnId, User, UserId,
};
use std::sync::Arc;
use uplinq_activation::{ActivationOutcome, ActivationRequest, ActivationService, PoolService};
use uplinq_admin::AdminService;
use uplinq_enrollment::{EnrollmentService, SignupRequest};
use uplinq_ledger::{credit_available, PayoutService, WithdrawalService};
use uplinq_store::{collections, run_transaction, DocumentStore, MemoryStore};
use uplinq_telemetry::NullAuditSink;

pub const RANK_1_COST: Money = Money(10_000);
pub const RANK_2_COST: Money = Money(25_000);
pub const RANK_3_COST: Money = Money(50_000);

pub struct TestPlatform {
    pub store: Arc<MemoryStore>,
    pub identity: Arc<StaticIdentityProvider>,
    pub enrollment: EnrollmentService<MemoryStore>,
    pub activations: Arc<ActivationService<MemoryStore>>,
    pub pools: Arc<PoolService<MemoryStore>>,
    pub withdrawals: WithdrawalService<MemoryStore>,
    pub payouts: PayoutService<MemoryStore>,
    pub admin: AdminService<MemoryStore>,
    pub admin_claims: Claims,
}

impl TestPlatform {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let identity = Arc::new(StaticIdentityProvider::new());
        let clock = Arc::new(SystemClock);
        let admin = AdminService::new(store.clone(), clock.clone(), Arc::new(NullAuditSink));
        let admin_claims = Claims::admin(UserId::generate());

        let platform = Self {
            enrollment: EnrollmentService::new(store.clone(), identity.clone(), clock.clone()),
            activations: Arc::new(ActivationService::new(store.clone(), clock.clone())),
            pools: Arc::new(PoolService::new(store.clone(), clock.clone())),
            withdrawals: WithdrawalService::new(store.clone(), clock.clone()),
            payouts: PayoutService::new(store.clone(), clock),
            admin,
            admin_claims,
            store,
            identity,
        };
        for (id, cost) in [
            (RankId(1), RANK_1_COST),
            (RankId(2), RANK_2_COST),
            (RankId(3), RANK_3_COST),
        ] {
            platform
                .admin
                .upsert_rank(
                    &platform.admin_claims,
                    shared_types::Rank {
                        id,
                        name: format!("tier-{}", id.0),
                        activation_cost: cost,
                    },
                )
                .unwrap();
        }
        platform
    }

    pub fn signup(&self, sponsor: Option<UserId>) -> User {
        self.enrollment
            .signup(SignupRequest { sponsor_id: sponsor })
            .unwrap()
            .user
    }

    /// Test shortcut: put funds on the wallet without a payout round trip.
    pub fn fund(&self, user_id: UserId, amount: Money) {
        run_transaction(self.store.as_ref(), |txn| {
            credit_available(txn, user_id, amount, chrono::Utc::now())?;
            Ok(())
        })
        .unwrap();
    }

    pub fn activate_wallet(&self, user_id: UserId, rank: RankId) -> ActivationOutcome {
        self.activations
            .activate(
                user_id,
                ActivationRequest {
                    rank,
                    payment: PaymentMethod::Wallet,
                },
            )
            .unwrap()
    }

    /// Sign up under `sponsor`, fund the rank-1 cost, and activate.
    pub fn enroll_active_member(&self, sponsor: Option<UserId>) -> (User, ActivationOutcome) {
        let user = self.signup(sponsor);
        self.fund(user.id, RANK_1_COST);
        let outcome = self.activate_wallet(user.id, RankId(1));
        (self.user(user.id), outcome)
    }

    pub fn user(&self, id: UserId) -> User {
        self.store
            .get(collections::USERS, &id.to_string())
            .unwrap()
            .unwrap()
            .parse()
            .unwrap()
    }

    pub fn pool(&self, id: PoolId) -> IncomePool {
        self.store
            .get(collections::INCOME_POOLS, &id.to_string())
            .unwrap()
            .unwrap()
            .parse()
            .unwrap()
    }

    pub fn transaction(&self, id: TxnId) -> Transaction {
        self.store
            .get(collections::TRANSACTIONS, &id.to_string())
            .unwrap()
            .unwrap()
            .parse()
            .unwrap()
    }
}
