//! Placement and referral recounting across crates.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{TestPlatform, RANK_1_COST};
    use shared_types::{CoreError, Money, RankId, UserStatus};
    use uplinq_admin::SettingsUpdate;
    use uplinq_enrollment::SignupRequest;

    #[test]
    fn test_signup_chain_counts_direct_referrals_only() {
        let platform = TestPlatform::new();
        let root = platform.signup(None);
        let child = platform.signup(Some(root.id));
        platform.signup(Some(root.id));
        platform.signup(Some(child.id)); // grandchild, not root's direct

        assert_eq!(platform.user(root.id).direct_referrals, 2);
        assert_eq!(platform.user(child.id).direct_referrals, 1);
    }

    #[test]
    fn test_new_users_start_inactive_and_rankless() {
        let platform = TestPlatform::new();
        let user = platform.signup(None);
        assert_eq!(user.status, UserStatus::Inactive);
        assert_eq!(user.rank, None);
        assert_eq!(user.available_balance, Money::ZERO);
    }

    #[test]
    fn test_referral_threshold_unlocks_existing_pool() {
        let platform = TestPlatform::new();
        let member = platform.signup(None);
        platform.fund(member.id, RANK_1_COST);
        let outcome = platform.activate_wallet(member.id, RankId(1));
        let pool_id = outcome.pool_id.unwrap();

        // Created below the default requirement of two referrals.
        assert!(!platform.pool(pool_id).can_claim);

        platform.signup(Some(member.id));
        assert!(!platform.pool(pool_id).can_claim);

        // The second referral crosses the threshold; signup's follow-up
        // refresh flips the pool.
        platform.signup(Some(member.id));
        assert!(platform.pool(pool_id).can_claim);
    }

    #[test]
    fn test_closed_registration_rejects_signup() {
        let platform = TestPlatform::new();
        platform
            .admin
            .update_settings(
                &platform.admin_claims,
                SettingsUpdate {
                    registration_open: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        let err = platform
            .enrollment
            .signup(SignupRequest::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::PreconditionFailed(_)));
    }
}
