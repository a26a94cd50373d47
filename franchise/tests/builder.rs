//! Tests for the Franchise builder

use std::sync::Arc;

use franchise::{
    AccountConfig, FranchiseBuilder, FranchiseBuilderError, InMemoryRateLimitStore, JwtConfig,
    LockoutConfig, RateLimitConfig, RateLimitStore,
};

fn jwt() -> JwtConfig {
    JwtConfig::new_hs256(b"builder-test-secret".to_vec())
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_builder_with_sqlite() {
    let franchise = FranchiseBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite")
        .with_jwt_config(jwt())
        .apply_migrations(true)
        .build()
        .await
        .expect("Failed to build Franchise");

    franchise.health_check().await.expect("Health check failed");
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_builder_with_sqlite_pool() {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite");

    let franchise = FranchiseBuilder::new()
        .with_sqlite_pool(pool)
        .with_jwt_config(jwt())
        .apply_migrations(true)
        .build()
        .await
        .expect("Failed to build Franchise");

    franchise.health_check().await.expect("Health check failed");
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_builder_manual_migration() {
    let franchise = FranchiseBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite")
        .with_jwt_config(jwt())
        .build()
        .await
        .expect("Failed to build Franchise");

    // Tables do not exist yet, so lookups fail until migrated.
    assert!(franchise.validate_invitation_code("ANY").await.is_err());

    franchise.migrate().await.expect("Migration failed");
    let err = franchise.validate_invitation_code("ANY").await.unwrap_err();
    assert!(err.is_invitation_error());
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_builder_requires_jwt_config() {
    let result = FranchiseBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite")
        .build()
        .await;

    assert!(matches!(
        result,
        Err(FranchiseBuilderError::InvalidConfiguration(_))
    ));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_builder_rejects_zero_limits() {
    let result = FranchiseBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite")
        .with_jwt_config(jwt())
        .with_account_config(
            AccountConfig::default().with_lockout(LockoutConfig::default().with_max_failed_attempts(0)),
        )
        .build()
        .await;
    assert!(matches!(
        result,
        Err(FranchiseBuilderError::InvalidConfiguration(_))
    ));

    let result = FranchiseBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite")
        .with_jwt_config(jwt())
        .with_signup_rate_limit(RateLimitConfig::default().with_max_attempts(0))
        .build()
        .await;
    assert!(matches!(
        result,
        Err(FranchiseBuilderError::InvalidConfiguration(_))
    ));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_builder_with_custom_signup_limit() {
    let franchise = FranchiseBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite")
        .with_jwt_config(jwt())
        .with_signup_rate_limit(RateLimitConfig::default().with_max_attempts(2))
        .build()
        .await
        .expect("Failed to build Franchise");

    assert!(franchise.admit_signup("198.51.100.4").is_allowed());
    assert!(franchise.admit_signup("198.51.100.4").is_allowed());
    assert!(!franchise.admit_signup("198.51.100.4").is_allowed());
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_builder_connection_failure() {
    let result = FranchiseBuilder::new()
        .with_sqlite("sqlite:///nonexistent-franchise-dir/franchise.db")
        .await;

    assert!(matches!(
        result,
        Err(FranchiseBuilderError::StorageConnection(_))
    ));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_instances_share_rate_limit_store() {
    let store = Arc::new(InMemoryRateLimitStore::new());
    let limit = RateLimitConfig::default().with_max_attempts(2);

    let mut instances = Vec::new();
    for _ in 0..2 {
        let franchise = FranchiseBuilder::new()
            .with_sqlite("sqlite::memory:")
            .await
            .expect("Failed to connect to SQLite")
            .with_jwt_config(jwt())
            .with_signup_rate_limit(limit.clone())
            .with_rate_limit_store(store.clone())
            .build()
            .await
            .expect("Failed to build Franchise");
        instances.push(franchise);
    }

    assert!(instances[0].admit_signup("203.0.113.50").is_allowed());
    assert!(instances[1].admit_signup("203.0.113.50").is_allowed());
    assert!(!instances[0].admit_signup("203.0.113.50").is_allowed());
    assert!(!instances[1].admit_signup("203.0.113.50").is_allowed());
    assert_eq!(store.len(), 1);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_default_rate_limit_store_is_per_instance() {
    let mut instances = Vec::new();
    for _ in 0..2 {
        let franchise = FranchiseBuilder::new()
            .with_sqlite("sqlite::memory:")
            .await
            .expect("Failed to connect to SQLite")
            .with_jwt_config(jwt())
            .with_signup_rate_limit(RateLimitConfig::default().with_max_attempts(1))
            .build()
            .await
            .expect("Failed to build Franchise");
        instances.push(franchise);
    }

    assert!(instances[0].admit_signup("203.0.113.51").is_allowed());
    assert!(instances[1].admit_signup("203.0.113.51").is_allowed());
    assert_eq!(instances[0].signup_limiter().store().len(), 1);
}
