//! Racing writers over one store.
//!
//! These tests drive the real services from multiple OS threads against
//! a single in-memory store, exercising the optimistic-commit retry path
//! rather than mocking it.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{TestPlatform, RANK_1_COST};
    use shared_types::{CoreError, Money, RankId, TransactionKind, TransactionStatus};
    use std::sync::Arc;
    use std::thread;
    use uplinq_activation::ActivationRequest;
    use uplinq_ledger::credit_earnings;
    use uplinq_store::{collections, run_transaction, DocumentStore};

    #[test]
    fn test_concurrent_credits_commute() {
        let platform = TestPlatform::new();
        let user = platform.signup(None);
        let threads = 4;
        let credits_per_thread = 5;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let store = platform.store.clone();
                let user_id = user.id;
                thread::spawn(move || {
                    for _ in 0..credits_per_thread {
                        // Bounded-retry transactions can exhaust under
                        // heavy contention; a real caller re-submits.
                        let mut attempts = 0;
                        loop {
                            let result = run_transaction(store.as_ref(), |txn| {
                                credit_earnings(txn, user_id, Money(7), chrono::Utc::now())?;
                                Ok(())
                            });
                            match result {
                                Ok(()) => break,
                                Err(CoreError::Internal(_)) if attempts < 100 => attempts += 1,
                                Err(e) => panic!("unexpected credit failure: {e}"),
                            }
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let expected = Money(7)
            .checked_mul(threads as u64 * credits_per_thread as u64)
            .unwrap();
        let user_now = platform.user(user.id);
        assert_eq!(user_now.available_balance, expected);
        assert_eq!(user_now.total_earnings, expected);
    }

    #[test]
    fn test_limited_balance_admits_one_activation() {
        let platform = TestPlatform::new();
        let user = platform.signup(None);
        // Exactly one activation's worth of funds.
        platform.fund(user.id, RANK_1_COST);

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let activations = platform.activations.clone();
                let user_id = user.id;
                thread::spawn(move || {
                    activations.activate(
                        user_id,
                        ActivationRequest {
                            rank: RankId(1),
                            payment: shared_types::PaymentMethod::Wallet,
                        },
                    )
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);

        // The winner drained the wallet; nothing was double-applied.
        let user_now = platform.user(user.id);
        assert_eq!(user_now.available_balance, Money::ZERO);
        assert_eq!(user_now.rank, Some(RankId(1)));

        let completed_activations = platform
            .store
            .query(collections::TRANSACTIONS, &[], None)
            .unwrap()
            .iter()
            .filter(|doc| {
                doc.parse::<shared_types::Transaction>().is_ok_and(|t| {
                    t.kind == TransactionKind::Activation
                        && t.status == TransactionStatus::Completed
                })
            })
            .count();
        assert_eq!(completed_activations, 1);
        assert_eq!(
            platform
                .store
                .query(collections::INCOME_POOLS, &[], None)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_pool_claim_admits_one_winner() {
        let platform = TestPlatform::new();
        let (sponsor, outcome) = platform.enroll_active_member(None);
        let pool_id = outcome.pool_id.unwrap();
        platform.enroll_active_member(Some(sponsor.id));
        platform.enroll_active_member(Some(sponsor.id));
        assert!(platform.pool(pool_id).is_claimable());

        let before = platform.user(sponsor.id).available_balance;
        let pool_income = platform.pool(pool_id).pool_income;

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pools = platform.pools.clone();
                let claimant = sponsor.id;
                thread::spawn(move || pools.claim(claimant, pool_id))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        // Credited exactly once.
        assert_eq!(
            platform.user(sponsor.id).available_balance,
            before.checked_add(pool_income).unwrap()
        );
        assert!(platform.pool(pool_id).claimed_at.is_some());
    }

    #[test]
    fn test_racing_payment_references_single_consumer() {
        let platform = TestPlatform::new();
        let a = platform.signup(None);
        let b = platform.signup(None);

        let handles: Vec<_> = [a.id, b.id]
            .into_iter()
            .map(|user_id| {
                let activations = platform.activations.clone();
                thread::spawn(move || {
                    activations.activate(
                        user_id,
                        ActivationRequest {
                            rank: RankId(1),
                            payment: shared_types::PaymentMethod::OnChain {
                                tx_hash: "0xracing".into(),
                            },
                        },
                    )
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            platform
                .store
                .query(collections::PAYMENT_REFS, &[], None)
                .unwrap()
                .len(),
            1
        );
    }
}
