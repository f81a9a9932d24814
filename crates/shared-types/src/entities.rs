//! Core domain entities.
//!
//! Documents are persisted as JSON values in the document store; every
//! entity here derives `Serialize`/`Deserialize` and is the single schema
//! definition for its collection.
//!
//! ## Invariants
//!
//! - A user's `sponsor_id`, once set at creation, is never changed
//!   (no re-parenting). The sponsor forest stays a forest.
//! - Balance fields are mutated only inside store transactions, never by
//!   unconditional overwrites.
//! - A `Transaction` that reached `Completed` never changes amount or owner.

use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random id.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(
    /// Identifies a user document.
    UserId
);
id_type!(
    /// Identifies a money-moving transaction record.
    TxnId
);
id_type!(
    /// Identifies an income/commission entry.
    EntryId
);
id_type!(
    /// Identifies an income pool.
    PoolId
);
id_type!(
    /// Identifies a payout-queue entry.
    PayoutId
);

/// Ordinal rank tier. Ordering of the wrapped `u8` is the rank ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankId(pub u8);

impl RankId {
    /// The rank immediately above this one.
    pub fn next(self) -> RankId {
        RankId(self.0.saturating_add(1))
    }
}

impl fmt::Display for RankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rank-{}", self.0)
    }
}

/// User lifecycle status. Users are never hard-deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

/// A platform member and their position in the sponsor forest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Direct sponsor. Immutable after creation.
    pub sponsor_id: Option<UserId>,
    /// Currently activated rank, if any.
    pub rank: Option<RankId>,
    pub status: UserStatus,
    pub available_balance: Money,
    pub locked_balance: Money,
    pub total_earnings: Money,
    /// Count of users whose `sponsor_id` points at this user.
    pub direct_referrals: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// Reference data for one rank tier. Seeded once, admin-editable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rank {
    pub id: RankId,
    pub name: String,
    pub activation_cost: Money,
}

/// Kind of money movement a transaction records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Activation,
    Topup,
    Withdrawal,
    Commission,
    PoolClaim,
    PayoutClaim,
}

/// One-way status: `Pending` may become `Completed` or `Failed`, nothing
/// transitions out of the terminal states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

/// How an activation or top-up was funded. Each variant carries exactly
/// the fields that payment method requires.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Deducted synchronously from the user's available balance.
    Wallet,
    /// On-chain deposit awaiting confirmation.
    OnChain { tx_hash: String },
    /// Peer-to-peer transfer awaiting confirmation.
    P2p { reference: String },
}

impl PaymentMethod {
    /// The external payment reference, when this method carries one.
    /// A reference may be consumed by at most one transaction record.
    pub fn external_reference(&self) -> Option<&str> {
        match self {
            PaymentMethod::Wallet => None,
            PaymentMethod::OnChain { tx_hash } => Some(tx_hash),
            PaymentMethod::P2p { reference } => Some(reference),
        }
    }

    /// Wallet payments settle inside the request; the others stay pending
    /// until an administrator confirms the external payment.
    pub fn settles_synchronously(&self) -> bool {
        matches!(self, PaymentMethod::Wallet)
    }
}

/// Immutable record of one money-moving event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxnId,
    pub user_id: UserId,
    pub kind: TransactionKind,
    pub amount: Money,
    pub status: TransactionStatus,
    pub payment: PaymentMethod,
    /// Rank being activated, for Activation/Topup kinds.
    pub rank: Option<RankId>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Which commission scheme produced an income entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IncomeKind {
    /// Direct-sponsor share, credited to the sponsor's income pool.
    Referral,
    /// Per-level upline share, credited to available balance.
    Level { level: u8 },
    /// Platform-wide accumulator share.
    Global,
}

/// Append-only record of one individual commission payment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IncomeEntry {
    pub id: EntryId,
    pub recipient_id: UserId,
    /// The downline user whose activation generated this income.
    pub source_user_id: UserId,
    pub income: IncomeKind,
    pub amount: Money,
    pub source_transaction_id: TxnId,
    pub created_at: DateTime<Utc>,
}

/// Per-(user, rank) income accumulator.
///
/// Lifecycle: created locked on rank activation; becomes claimable when
/// the owner's direct-referral count meets the platform requirement;
/// a successful claim drains it into available balance and is terminal
/// for this pool instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IncomePool {
    pub id: PoolId,
    pub user_id: UserId,
    pub rank: RankId,
    pub pool_income: Money,
    /// Cap: 100 x activation cost. Credits clamp here.
    pub max_pool_income: Money,
    /// Frozen from settings at creation; updated only by the
    /// referral-count recount path.
    pub can_claim: bool,
    pub is_locked: bool,
    /// Set exactly once, by a successful claim.
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IncomePool {
    /// Both gates re-verified inside the claiming transaction.
    pub fn is_claimable(&self) -> bool {
        self.is_locked && self.can_claim && self.claimed_at.is_none()
    }

    /// Headroom left under the cap.
    pub fn remaining_capacity(&self) -> Money {
        self.max_pool_income
            .checked_sub(self.pool_income)
            .unwrap_or(Money::ZERO)
    }
}

/// Platform-wide accumulator fed by the global commission share.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalPool {
    pub total: Money,
    pub last_source_transaction: Option<TxnId>,
}

/// Global configuration singleton. Loaded once per operation, never
/// cached as ambient state; mutated only through the admin path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlatformSettings {
    /// Direct referrals required before income pools unlock for claiming.
    pub direct_referral_requirement: u32,
    /// When set, all money-moving operations are rejected.
    pub maintenance_mode: bool,
    /// When unset, signup is rejected.
    pub registration_open: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<UserId>,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            direct_referral_requirement: 2,
            maintenance_mode: false,
            registration_open: true,
            updated_at: None,
            updated_by: None,
        }
    }
}

/// Payout-queue entry status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Queued,
    Ready,
    Claimed,
    Rejected,
}

/// A queued payout awaiting readiness and then a user claim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub id: PayoutId,
    pub user_id: UserId,
    pub amount: Money,
    pub status: PayoutStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
}

/// Audit-trail record written by administrative paths. Best-effort:
/// a failed audit write never fails the primary operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub actor: UserId,
    pub action: String,
    pub subject: String,
    pub detail: serde_json::Value,
    pub at: DateTime<Utc>,
}
