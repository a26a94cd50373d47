//! Repository implementations for SQLite storage

pub mod account;
pub mod audit;
pub mod branch;
pub mod inventory;
pub mod invitation;
pub mod product;
pub mod sale;

pub use account::SqliteAccountRepository;
pub use audit::SqliteAuditLogRepository;
pub use branch::SqliteBranchRepository;
pub use inventory::SqliteInventoryRepository;
pub use invitation::SqliteInvitationCodeRepository;
pub use product::SqliteProductRepository;
pub use sale::SqliteSaleRepository;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use franchise_core::{
    Error,
    error::{StorageError, utilities::DatabaseResultExt},
    repositories::{
        AccountRepositoryProvider, AuditLogRepositoryProvider, BranchRepositoryProvider,
        InventoryRepositoryProvider, InvitationCodeRepositoryProvider, ProductRepositoryProvider,
        RepositoryProvider, SaleRepositoryProvider,
    },
};
use franchise_migration::MigrationManager;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::migrations::{self, SqliteMigrationManager};

/// Repository provider implementation for SQLite
///
/// Implements every individual repository provider trait as well as the
/// unified [`RepositoryProvider`] trait. All repositories share one pool.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    account: Arc<SqliteAccountRepository>,
    invitation_code: Arc<SqliteInvitationCodeRepository>,
    audit_log: Arc<SqliteAuditLogRepository>,
    branch: Arc<SqliteBranchRepository>,
    product: Arc<SqliteProductRepository>,
    inventory: Arc<SqliteInventoryRepository>,
    sale: Arc<SqliteSaleRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let account = Arc::new(SqliteAccountRepository::new(pool.clone()));
        let invitation_code = Arc::new(SqliteInvitationCodeRepository::new(pool.clone()));
        let audit_log = Arc::new(SqliteAuditLogRepository::new(pool.clone()));
        let branch = Arc::new(SqliteBranchRepository::new(pool.clone()));
        let product = Arc::new(SqliteProductRepository::new(pool.clone()));
        let inventory = Arc::new(SqliteInventoryRepository::new(pool.clone()));
        let sale = Arc::new(SqliteSaleRepository::new(pool.clone()));

        Self {
            pool,
            account,
            invitation_code,
            audit_log,
            branch,
            product,
            inventory,
            sale,
        }
    }

    /// Open a pool for `url`, creating the database file if needed.
    ///
    /// In-memory databases are held on a single connection that is never
    /// recycled: each SQLite connection to `:memory:` is its own database.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| {
                tracing::error!(error = %e, "Invalid SQLite connection string");
                Error::Storage(StorageError::Connection(
                    "Invalid SQLite connection string".to_string(),
                ))
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to connect to SQLite database");
                Error::Storage(StorageError::Connection(
                    "Failed to connect to SQLite database".to_string(),
                ))
            })?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl AccountRepositoryProvider for SqliteRepositoryProvider {
    type AccountRepo = SqliteAccountRepository;

    fn account(&self) -> &Self::AccountRepo {
        &self.account
    }
}

impl InvitationCodeRepositoryProvider for SqliteRepositoryProvider {
    type InvitationCodeRepo = SqliteInvitationCodeRepository;

    fn invitation_code(&self) -> &Self::InvitationCodeRepo {
        &self.invitation_code
    }
}

impl AuditLogRepositoryProvider for SqliteRepositoryProvider {
    type AuditLogRepo = SqliteAuditLogRepository;

    fn audit_log(&self) -> &Self::AuditLogRepo {
        &self.audit_log
    }
}

impl BranchRepositoryProvider for SqliteRepositoryProvider {
    type BranchRepo = SqliteBranchRepository;

    fn branch(&self) -> &Self::BranchRepo {
        &self.branch
    }
}

impl ProductRepositoryProvider for SqliteRepositoryProvider {
    type ProductRepo = SqliteProductRepository;

    fn product(&self) -> &Self::ProductRepo {
        &self.product
    }
}

impl InventoryRepositoryProvider for SqliteRepositoryProvider {
    type InventoryRepo = SqliteInventoryRepository;

    fn inventory(&self) -> &Self::InventoryRepo {
        &self.inventory
    }
}

impl SaleRepositoryProvider for SqliteRepositoryProvider {
    type SaleRepo = SqliteSaleRepository;

    fn sale(&self) -> &Self::SaleRepo {
        &self.sale
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        manager.up(&migrations::all()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_db_err_with_context("Health check failed")?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn setup_test() {
        let _ = tracing_subscriber::fmt().try_init();
    }

    /// A migrated provider over a private in-memory database.
    pub(crate) async fn migrated_provider() -> SqliteRepositoryProvider {
        setup_test();
        let provider = SqliteRepositoryProvider::connect("sqlite::memory:")
            .await
            .expect("Failed to connect");
        provider.migrate().await.expect("Failed to migrate");
        provider
    }

    #[tokio::test]
    async fn test_migrate_and_health_check() {
        let provider = migrated_provider().await;
        provider.health_check().await.unwrap();

        // Running migrations again is a no-op.
        provider.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_fails_for_missing_directory() {
        setup_test();
        let result =
            SqliteRepositoryProvider::connect("sqlite:///nonexistent-franchise-dir/franchise.db").await;
        assert!(matches!(
            result,
            Err(Error::Storage(StorageError::Connection(_)))
        ));
    }
}
