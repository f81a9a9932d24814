//! Wallet and external-payment activation flows.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{TestPlatform, RANK_1_COST, RANK_2_COST};
    use shared_types::{
        CoreError, Money, PaymentMethod, RankId, TransactionStatus, UserStatus,
    };
    use uplinq_activation::ActivationRequest;

    #[test]
    fn test_wallet_activation_balances_and_pool() {
        let platform = TestPlatform::new();
        let user = platform.signup(None);
        platform.fund(user.id, Money(15_000)); // 150.00

        let outcome = platform.activate_wallet(user.id, RankId(1));
        assert_eq!(outcome.total_cost, RANK_1_COST);
        assert_eq!(outcome.status, TransactionStatus::Completed);

        let user_now = platform.user(user.id);
        assert_eq!(user_now.available_balance, Money(5_000)); // 50.00 left
        assert_eq!(user_now.rank, Some(RankId(1)));
        assert_eq!(user_now.status, UserStatus::Active);

        let pool = platform.pool(outcome.pool_id.unwrap());
        assert_eq!(pool.pool_income, Money::ZERO);
        assert_eq!(pool.max_pool_income, Money(1_000_000)); // 100 x cost
        assert!(pool.is_locked);
        assert!(!pool.can_claim);
    }

    #[test]
    fn test_rank_progression_is_sequential() {
        let platform = TestPlatform::new();
        let user = platform.signup(None);
        platform.fund(user.id, Money(100_000));

        // Cannot start above the entry rank.
        let err = platform
            .activations
            .activate(
                user.id,
                ActivationRequest {
                    rank: RankId(2),
                    payment: PaymentMethod::Wallet,
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::PreconditionFailed(_)));

        platform.activate_wallet(user.id, RankId(1));

        // Cannot skip rank 2.
        let err = platform
            .activations
            .activate(
                user.id,
                ActivationRequest {
                    rank: RankId(3),
                    payment: PaymentMethod::Wallet,
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::PreconditionFailed(_)));

        let next = platform.activate_wallet(user.id, RankId(2));
        assert_eq!(next.total_cost, RANK_2_COST);
        assert_eq!(platform.user(user.id).rank, Some(RankId(2)));
    }

    #[test]
    fn test_onchain_hash_consumed_once_across_users() {
        let platform = TestPlatform::new();
        let a = platform.signup(None);
        let b = platform.signup(None);
        let payment = PaymentMethod::OnChain {
            tx_hash: "0x6fd2c4a1".into(),
        };

        platform
            .activations
            .activate(
                a.id,
                ActivationRequest {
                    rank: RankId(1),
                    payment: payment.clone(),
                },
            )
            .unwrap();

        let err = platform
            .activations
            .activate(b.id, ActivationRequest { rank: RankId(1), payment })
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn test_admin_confirmation_settles_pending_activation() {
        let platform = TestPlatform::new();
        let user = platform.signup(None);

        let pending = platform
            .activations
            .activate(
                user.id,
                ActivationRequest {
                    rank: RankId(1),
                    payment: PaymentMethod::P2p {
                        reference: "UPI-2201".into(),
                    },
                },
            )
            .unwrap();
        assert_eq!(pending.status, TransactionStatus::Pending);
        assert_eq!(platform.user(user.id).rank, None);

        let confirmed = platform
            .admin
            .confirm_activation(&platform.admin_claims, pending.transaction_id)
            .unwrap();
        assert_eq!(confirmed.status, TransactionStatus::Completed);

        let user_now = platform.user(user.id);
        assert_eq!(user_now.rank, Some(RankId(1)));
        assert_eq!(user_now.status, UserStatus::Active);
        // External payments never touch the wallet balance.
        assert_eq!(user_now.available_balance, Money::ZERO);

        let record = platform.transaction(pending.transaction_id);
        assert_eq!(record.status, TransactionStatus::Completed);
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn test_admin_rejection_fails_pending_activation() {
        let platform = TestPlatform::new();
        let user = platform.signup(None);

        let pending = platform
            .activations
            .activate(
                user.id,
                ActivationRequest {
                    rank: RankId(1),
                    payment: PaymentMethod::P2p {
                        reference: "UPI-2202".into(),
                    },
                },
            )
            .unwrap();

        platform
            .admin
            .reject_activation(&platform.admin_claims, pending.transaction_id)
            .unwrap();

        assert_eq!(
            platform.transaction(pending.transaction_id).status,
            TransactionStatus::Failed
        );
        assert_eq!(platform.user(user.id).rank, None);
    }
}
