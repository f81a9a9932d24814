//! Withdrawal and payout review flows.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::TestPlatform;
    use shared_types::{CoreError, Money, PayoutStatus, TransactionStatus};

    #[test]
    fn test_withdrawal_approved_by_admin() {
        let platform = TestPlatform::new();
        let user = platform.signup(None);
        platform.fund(user.id, Money(1_000));

        let record = platform.withdrawals.request(user.id, Money(400)).unwrap();
        let mid = platform.user(user.id);
        assert_eq!(mid.available_balance, Money(600));
        assert_eq!(mid.locked_balance, Money(400));

        platform
            .admin
            .approve_withdrawal(&platform.admin_claims, record.id)
            .unwrap();

        let after = platform.user(user.id);
        assert_eq!(after.available_balance, Money(600));
        assert_eq!(after.locked_balance, Money::ZERO);
        assert_eq!(
            platform.transaction(record.id).status,
            TransactionStatus::Completed
        );
    }

    #[test]
    fn test_withdrawal_rejection_returns_funds() {
        let platform = TestPlatform::new();
        let user = platform.signup(None);
        platform.fund(user.id, Money(1_000));

        let record = platform.withdrawals.request(user.id, Money(400)).unwrap();
        platform
            .admin
            .reject_withdrawal(&platform.admin_claims, record.id)
            .unwrap();

        let after = platform.user(user.id);
        assert_eq!(after.available_balance, Money(1_000));
        assert_eq!(after.locked_balance, Money::ZERO);
        assert_eq!(
            platform.transaction(record.id).status,
            TransactionStatus::Failed
        );
    }

    #[test]
    fn test_payout_full_lifecycle() {
        let platform = TestPlatform::new();
        let user = platform.signup(None);

        let payout = platform
            .admin
            .queue_payout(&platform.admin_claims, user.id, Money(750))
            .unwrap();
        assert_eq!(payout.status, PayoutStatus::Queued);

        // Cannot claim before it is marked ready.
        let err = platform.payouts.claim(user.id, payout.id).unwrap_err();
        assert!(matches!(err, CoreError::PreconditionFailed(_)));

        platform
            .admin
            .mark_payout_ready(&platform.admin_claims, payout.id)
            .unwrap();
        let outcome = platform.payouts.claim(user.id, payout.id).unwrap();
        assert_eq!(outcome.claimed_amount, Money(750));
        assert_eq!(platform.user(user.id).available_balance, Money(750));

        let err = platform.payouts.claim(user.id, payout.id).unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn test_withdrawing_more_than_available_rejected() {
        let platform = TestPlatform::new();
        let user = platform.signup(None);
        platform.fund(user.id, Money(100));

        let err = platform
            .withdrawals
            .request(user.id, Money(101))
            .unwrap_err();
        assert!(matches!(err, CoreError::PreconditionFailed(_)));
        assert_eq!(platform.user(user.id).available_balance, Money(100));
    }
}
