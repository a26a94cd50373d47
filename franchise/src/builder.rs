//! Builder for constructing [`Franchise`] instances
//!
//! The builder tracks whether storage has been configured in its type, so
//! `build()` only exists once a repository provider is in place.
//!
//! # Example
//!
//! ```rust,no_run
//! use franchise::{FranchiseBuilder, JwtConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let franchise = FranchiseBuilder::new()
//!         .with_sqlite("sqlite://franchise.db")
//!         .await?
//!         .with_jwt_config(JwtConfig::new_hs256(b"change-me".to_vec()))
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     franchise.health_check().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use franchise_core::repositories::RepositoryProvider;

use crate::{
    AccountConfig, Franchise, FranchiseConfig, InMemoryRateLimitStore, JwtConfig, RateLimitConfig,
    RateLimitStore,
};

/// Errors that can occur when building a Franchise instance.
#[derive(Debug, thiserror::Error)]
pub enum FranchiseBuilderError {
    /// Failed to connect to storage backend
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    /// Failed to run database migrations
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Marker type indicating no storage has been configured yet.
pub struct NoStorage;

/// Marker type indicating storage has been configured.
pub struct WithStorage<R: RepositoryProvider> {
    repositories: Arc<R>,
}

/// A type-safe builder for [`Franchise`].
///
/// Defaults:
///
/// - bcrypt cost 12, email verification tokens valid for 24 hours
/// - lockout after 5 failed logins for 15 minutes
/// - 5 signups per client per 15 minute window, swept hourly, counted in a
///   process-local store
/// - migrations are not applied
///
/// A [`JwtConfig`] has no default and must be supplied.
pub struct FranchiseBuilder<Storage> {
    storage: Storage,
    jwt_config: Option<JwtConfig>,
    account_config: AccountConfig,
    signup_rate_limit: RateLimitConfig,
    rate_limit_store: Option<Arc<dyn RateLimitStore>>,
    apply_migrations: bool,
}

impl Default for FranchiseBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl FranchiseBuilder<NoStorage> {
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            jwt_config: None,
            account_config: AccountConfig::default(),
            signup_rate_limit: RateLimitConfig::default(),
            rate_limit_store: None,
            apply_migrations: false,
        }
    }

    /// Use an already constructed repository provider.
    pub fn with_repositories<R: RepositoryProvider>(
        self,
        repositories: Arc<R>,
    ) -> FranchiseBuilder<WithStorage<R>> {
        FranchiseBuilder {
            storage: WithStorage { repositories },
            jwt_config: self.jwt_config,
            account_config: self.account_config,
            signup_rate_limit: self.signup_rate_limit,
            rate_limit_store: self.rate_limit_store,
            apply_migrations: self.apply_migrations,
        }
    }
}

#[cfg(feature = "sqlite")]
impl FranchiseBuilder<NoStorage> {
    /// Configure SQLite storage by connecting to the given URL.
    ///
    /// * `url` - SQLite connection URL (e.g., "sqlite::memory:" or "sqlite://path/to/db.sqlite")
    pub async fn with_sqlite(
        self,
        url: &str,
    ) -> Result<FranchiseBuilder<WithStorage<crate::SqliteRepositoryProvider>>, FranchiseBuilderError>
    {
        let provider = crate::SqliteRepositoryProvider::connect(url)
            .await
            .map_err(|e| FranchiseBuilderError::StorageConnection(e.to_string()))?;

        Ok(self.with_repositories(Arc::new(provider)))
    }

    /// Configure SQLite storage with an existing connection pool.
    pub fn with_sqlite_pool(
        self,
        pool: franchise_storage_sqlite::SqlitePool,
    ) -> FranchiseBuilder<WithStorage<crate::SqliteRepositoryProvider>> {
        self.with_repositories(Arc::new(crate::SqliteRepositoryProvider::new(pool)))
    }
}

impl<S> FranchiseBuilder<S> {
    pub fn with_jwt_config(mut self, jwt_config: JwtConfig) -> Self {
        self.jwt_config = Some(jwt_config);
        self
    }

    pub fn with_account_config(mut self, account_config: AccountConfig) -> Self {
        self.account_config = account_config;
        self
    }

    pub fn with_signup_rate_limit(mut self, signup_rate_limit: RateLimitConfig) -> Self {
        self.signup_rate_limit = signup_rate_limit;
        self
    }

    /// Count signup attempts in `store` instead of a store owned by the
    /// built instance.
    pub fn with_rate_limit_store(mut self, store: Arc<dyn RateLimitStore>) -> Self {
        self.rate_limit_store = Some(store);
        self
    }

    /// Run migrations during [`build`](FranchiseBuilder::build).
    pub fn apply_migrations(mut self, apply: bool) -> Self {
        self.apply_migrations = apply;
        self
    }
}

impl<R: RepositoryProvider> FranchiseBuilder<WithStorage<R>> {
    pub async fn build(self) -> Result<Franchise<R>, FranchiseBuilderError> {
        let jwt = self.jwt_config.ok_or_else(|| {
            FranchiseBuilderError::InvalidConfiguration(
                "a JWT configuration is required".to_string(),
            )
        })?;

        if self.account_config.lockout.max_failed_attempts == 0 {
            return Err(FranchiseBuilderError::InvalidConfiguration(
                "lockout threshold must be at least 1".to_string(),
            ));
        }

        if self.signup_rate_limit.max_attempts == 0 {
            return Err(FranchiseBuilderError::InvalidConfiguration(
                "signup rate limit must admit at least 1 attempt".to_string(),
            ));
        }

        let repositories = self.storage.repositories;

        if self.apply_migrations {
            repositories.migrate().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to apply migrations");
                FranchiseBuilderError::Migration(e.to_string())
            })?;
        }

        let config = FranchiseConfig::new(jwt)
            .with_account(self.account_config)
            .with_signup_rate_limit(self.signup_rate_limit);

        let store: Arc<dyn RateLimitStore> = match self.rate_limit_store {
            Some(store) => store,
            None => Arc::new(InMemoryRateLimitStore::new()),
        };

        tracing::info!(migrated = self.apply_migrations, "Franchise instance built");
        Ok(Franchise::with_rate_limit_store(
            repositories,
            config,
            store,
        ))
    }
}
