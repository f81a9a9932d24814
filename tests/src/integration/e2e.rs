//! Full member journey over the API facade.

#[cfg(test)]
mod tests {
    use shared_types::{
        Claims, IdentityProvider, Money, PaymentMethod, RankId, StaticIdentityProvider,
        SystemClock, TransactionStatus, UserId,
    };
    use std::sync::Arc;
    use uplinq_api::dto::{ActivateBody, RankBody, SignupBody, WithdrawBody};
    use uplinq_api::{MemberApi, UplinqApi};
    use uplinq_store::MemoryStore;
    use uplinq_telemetry::{init_telemetry, TelemetryConfig, TracingAuditSink};

    fn platform() -> (UplinqApi<MemoryStore>, String) {
        // Full production wiring: real subscriber and the tracing audit
        // sink. A second init reports an error; only the first one wins.
        let _ = init_telemetry(TelemetryConfig::from_env());
        let store = Arc::new(MemoryStore::default());
        let identity = Arc::new(StaticIdentityProvider::new());
        let admin_token = identity
            .create_identity(Claims::admin(UserId::generate()))
            .unwrap();
        let api = UplinqApi::new(
            store,
            identity,
            Arc::new(SystemClock),
            Arc::new(TracingAuditSink),
        );
        (api, admin_token)
    }

    #[tokio::test]
    async fn test_member_journey_signup_to_withdrawal() {
        let (api, admin_token) = platform();
        api.admin_upsert_rank(
            &admin_token,
            RankBody {
                id: RankId(1),
                name: "starter".into(),
                activation_cost: Money(10_000),
            },
        )
        .await
        .unwrap();

        // Sponsor signs up and funds the wallet through a payout.
        let sponsor = api.signup(SignupBody::default()).await.unwrap();
        let payout = api
            .admin_queue_payout(&admin_token, sponsor.user_id, Money(15_000))
            .await
            .unwrap();
        api.admin_mark_payout_ready(&admin_token, payout)
            .await
            .unwrap();
        api.claim_payout(&sponsor.token, payout).await.unwrap();

        let activated = api
            .activate(
                &sponsor.token,
                ActivateBody {
                    rank: RankId(1),
                    payment: PaymentMethod::Wallet,
                },
            )
            .await
            .unwrap();
        assert_eq!(activated.status, TransactionStatus::Completed);

        // A downline member joins under the sponsor and pays externally.
        let downline = api
            .signup(SignupBody {
                sponsor_id: Some(sponsor.user_id),
            })
            .await
            .unwrap();
        let pending = api
            .activate(
                &downline.token,
                ActivateBody {
                    rank: RankId(1),
                    payment: PaymentMethod::P2p {
                        reference: "UPI-7781".into(),
                    },
                },
            )
            .await
            .unwrap();
        assert_eq!(pending.status, TransactionStatus::Pending);
        api.admin_confirm_activation(&admin_token, pending.transaction_id)
            .await
            .unwrap();

        // Confirmation distributed commissions: the sponsor's wallet got
        // the level-1 share (50% of 100.00).
        let profile = api.profile(&sponsor.token).await.unwrap();
        assert_eq!(profile.available_balance, Money(10_000)); // 5_000 left + 5_000
        assert_eq!(profile.total_earnings, Money(5_000));

        // The sponsor withdraws most of it.
        let withdrawal = api
            .request_withdrawal(&sponsor.token, WithdrawBody { amount: Money(8_000) })
            .await
            .unwrap();
        api.admin_approve_withdrawal(&admin_token, withdrawal.transaction_id)
            .await
            .unwrap();

        let final_profile = api.profile(&sponsor.token).await.unwrap();
        assert_eq!(final_profile.available_balance, Money(2_000));
        assert_eq!(final_profile.locked_balance, Money::ZERO);
        assert_eq!(final_profile.direct_referrals, 1);
    }
}
