//! Wire-level request/response types.
//!
//! These are the public contract; internal entities never cross the API
//! boundary directly. Errors leave as an [`ErrorBody`] carrying the
//! stable kind plus a caller-safe message.

use serde::{Deserialize, Serialize};
use shared_types::{
    CoreError, ErrorKind, Money, PaymentMethod, PayoutId, PoolId, RankId, TransactionStatus,
    TxnId, User, UserId, UserStatus,
};

/// Error payload returned by every failing endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<CoreError> for ErrorBody {
    fn from(err: CoreError) -> Self {
        if matches!(err, CoreError::Internal(_)) {
            // Full detail stays on the server.
            tracing::error!(error = %err, "internal error crossing the api boundary");
        }
        Self {
            kind: err.kind(),
            message: err.public_message(),
        }
    }
}

pub type ApiResult<T> = Result<T, ErrorBody>;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SignupBody {
    pub sponsor_id: Option<UserId>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SignupResponse {
    pub user_id: UserId,
    /// Bearer token for the created identity.
    pub token: String,
    pub status: UserStatus,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ActivateBody {
    pub rank: RankId,
    pub payment: PaymentMethod,
}

#[derive(Clone, Debug, Serialize)]
pub struct ActivationResponse {
    pub transaction_id: TxnId,
    pub activated_rank: RankId,
    pub total_cost: Money,
    pub status: TransactionStatus,
    pub pool_id: Option<PoolId>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WithdrawBody {
    pub amount: Money,
}

#[derive(Clone, Debug, Serialize)]
pub struct WithdrawResponse {
    pub transaction_id: TxnId,
    pub amount: Money,
    pub status: TransactionStatus,
}

#[derive(Clone, Debug, Serialize)]
pub struct PoolClaimResponse {
    pub pool_id: PoolId,
    pub claimed_amount: Money,
    pub new_available_balance: Money,
}

#[derive(Clone, Debug, Serialize)]
pub struct PayoutClaimResponse {
    pub payout_id: PayoutId,
    pub claimed_amount: Money,
    pub new_available_balance: Money,
}

/// Member-facing view of their own account.
#[derive(Clone, Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: UserId,
    pub sponsor_id: Option<UserId>,
    pub rank: Option<RankId>,
    pub status: UserStatus,
    pub available_balance: Money,
    pub locked_balance: Money,
    pub total_earnings: Money,
    pub direct_referrals: u32,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            sponsor_id: user.sponsor_id,
            rank: user.rank,
            status: user.status,
            available_balance: user.available_balance,
            locked_balance: user.locked_balance,
            total_earnings: user.total_earnings,
            direct_referrals: user.direct_referrals,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SettingsBody {
    pub direct_referral_requirement: Option<u32>,
    pub maintenance_mode: Option<bool>,
    pub registration_open: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RankBody {
    pub id: RankId,
    pub name: String,
    pub activation_cost: Money,
}
