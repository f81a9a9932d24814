//! Income-pool gating and claims end to end.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{TestPlatform, RANK_1_COST};
    use shared_types::{CoreError, Money, TransactionKind};
    use uplinq_commission::REFERRAL_INCOME_BPS;
    use uplinq_store::{collections, DocumentStore};

    #[test]
    fn test_claim_after_meeting_referral_requirement() {
        let platform = TestPlatform::new();
        let (sponsor, outcome) = platform.enroll_active_member(None);
        let pool_id = outcome.pool_id.unwrap();

        // Two active downline members: pool income and the claim gate.
        platform.enroll_active_member(Some(sponsor.id));
        platform.enroll_active_member(Some(sponsor.id));

        let pool = platform.pool(pool_id);
        assert!(pool.is_claimable());
        let expected = RANK_1_COST
            .apply_bps(REFERRAL_INCOME_BPS)
            .checked_mul(2)
            .unwrap();
        assert_eq!(pool.pool_income, expected);

        let before = platform.user(sponsor.id).available_balance;
        let claim = platform.pools.claim(sponsor.id, pool_id).unwrap();
        assert_eq!(claim.claimed_amount, expected);
        assert_eq!(
            claim.new_available_balance,
            before.checked_add(expected).unwrap()
        );

        // The pool document shows the drain: income zeroed, claim stamped.
        let pool_after = platform.pool(pool_id);
        assert_eq!(pool_after.pool_income, Money::ZERO);
        assert!(pool_after.claimed_at.is_some());

        // Terminal: second claim fails, and exactly one PoolClaim record
        // exists.
        let err = platform.pools.claim(sponsor.id, pool_id).unwrap_err();
        assert!(matches!(err, CoreError::PreconditionFailed(_)));
        let claims = platform
            .store
            .query(collections::TRANSACTIONS, &[], None)
            .unwrap()
            .iter()
            .filter(|doc| {
                doc.parse::<shared_types::Transaction>()
                    .is_ok_and(|t| t.kind == TransactionKind::PoolClaim)
            })
            .count();
        assert_eq!(claims, 1);
    }

    #[test]
    fn test_claim_blocked_below_requirement() {
        let platform = TestPlatform::new();
        let (sponsor, outcome) = platform.enroll_active_member(None);
        let pool_id = outcome.pool_id.unwrap();

        // One referral only; income exists but the gate is closed.
        platform.enroll_active_member(Some(sponsor.id));
        let pool = platform.pool(pool_id);
        assert!(!pool.pool_income.is_zero());
        assert!(!pool.can_claim);

        let err = platform.pools.claim(sponsor.id, pool_id).unwrap_err();
        assert!(matches!(err, CoreError::PreconditionFailed(_)));
    }

    #[test]
    fn test_pool_credit_clamps_at_cap_end_to_end() {
        let platform = TestPlatform::new();
        let (sponsor, outcome) = platform.enroll_active_member(None);
        let pool_id = outcome.pool_id.unwrap();

        // Shrink the cap below one referral share.
        let mut pool = platform.pool(pool_id);
        pool.max_pool_income = Money(500);
        uplinq_store::run_transaction(platform.store.as_ref(), |txn| {
            txn.set(collections::INCOME_POOLS, &pool_id.to_string(), &pool)?;
            Ok(())
        })
        .unwrap();

        platform.enroll_active_member(Some(sponsor.id));

        let pool_now = platform.pool(pool_id);
        assert_eq!(pool_now.pool_income, Money(500));
        assert!(pool_now.pool_income <= pool_now.max_pool_income);
    }
}
