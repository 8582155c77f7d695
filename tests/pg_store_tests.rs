//! Postgres store tests
//!
//! Run with `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.

#[cfg(test)]
mod tests {
    use detectus_server::db;
    use detectus_server::error::ApiError;
    use detectus_server::models::{
        RiskClassification, RiskLevel, TransactionEvent, TxAmount, WalletAddress,
    };
    use detectus_server::store::{PgStore, UserStore, WalletPatch, WalletStore};
    use sqlx::PgPool;
    use uuid::Uuid;

    async fn setup_test_db() -> PgPool {
        let url = std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must be set for database tests");
        let pool = db::create_pool(&url, "<test database>", 2)
            .await
            .expect("Failed to connect to test database");
        db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    /// Unique address per test run so tests don't collide
    fn fresh_address() -> WalletAddress {
        WalletAddress::parse(&format!("0xtest{}", Uuid::new_v4().simple())).unwrap()
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_patch_is_applied_atomically() {
        let store = PgStore::new(setup_test_db().await);
        let address = fresh_address();
        store.upsert(&address, None).await.unwrap();

        let updated = store
            .apply_update(
                &address,
                WalletPatch {
                    trust_score: Some(355),
                    risk: Some(RiskClassification::Computed {
                        level: RiskLevel::Suspicious,
                        from_score: 355,
                    }),
                    append_event: Some(TransactionEvent {
                        amount: Some(TxAmount::Number(10.0)),
                        recipient: Some("0xpeer".to_string()),
                        score_impact: -145,
                        ..Default::default()
                    }),
                    add_tags: vec!["no-data".to_string(), "no-data".to_string()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.trust_score, 355);
        assert_eq!(updated.risk_level(), RiskLevel::Suspicious);
        assert_eq!(updated.history.len(), 1);
        assert_eq!(updated.history[0].score_impact, -145);
        assert_eq!(updated.tags, vec!["no-data"]);
        assert!(!updated.frozen);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_tags_union_across_patches() {
        let store = PgStore::new(setup_test_db().await);
        let address = fresh_address();
        store.upsert(&address, None).await.unwrap();

        for tags in [vec!["a", "b"], vec!["b", "c"]] {
            store
                .apply_update(
                    &address,
                    WalletPatch {
                        add_tags: tags.into_iter().map(str::to_string).collect(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let wallet = store.find(&address).await.unwrap().unwrap();
        assert_eq!(wallet.tags, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_upsert_fills_missing_owner_only() {
        let store = PgStore::new(setup_test_db().await);
        let first = format!("user-{}@example.com", Uuid::new_v4().simple());
        let second = format!("user-{}@example.com", Uuid::new_v4().simple());
        store.create_user(&first).await.unwrap();
        store.create_user(&second).await.unwrap();
        let address = fresh_address();

        let unowned = store.upsert(&address, None).await.unwrap();
        assert!(unowned.owner_username.is_none());

        let owned = store.upsert(&address, Some(&first)).await.unwrap();
        assert_eq!(owned.owner_username.as_deref(), Some(first.as_str()));

        let kept = store.upsert(&address, Some(&second)).await.unwrap();
        assert_eq!(kept.owner_username.as_deref(), Some(first.as_str()));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_missing_wallet_is_not_found() {
        let store = PgStore::new(setup_test_db().await);
        let result = store
            .apply_update(
                &fresh_address(),
                WalletPatch {
                    increment_unblacklist: true,
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_link_wallet_once() {
        let store = PgStore::new(setup_test_db().await);
        let username = format!("user-{}@example.com", Uuid::new_v4().simple());
        let address = fresh_address();

        store.create_user(&username).await.unwrap();
        store.upsert(&address, Some(&username)).await.unwrap();

        assert!(store.link_wallet(&username, &address).await.unwrap());
        assert!(!store.link_wallet(&username, &address).await.unwrap());

        let user = store.find_user(&username).await.unwrap().unwrap();
        assert_eq!(user.wallets, vec![address.as_str().to_string()]);
        assert_eq!(store.list_by_owner(&username).await.unwrap().len(), 1);
    }
}
