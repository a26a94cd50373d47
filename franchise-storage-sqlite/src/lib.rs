//! SQLite storage backend for franchise accounts and branch operations.
//!
//! Timestamps are stored as unix seconds in `INTEGER` columns and booleans
//! as `0`/`1`. Money is whole centavos in `INTEGER` columns; stock
//! quantities are `REAL`.
//!
//! ```rust,ignore
//! use franchise_core::repositories::RepositoryProvider;
//! use franchise_storage_sqlite::SqliteRepositoryProvider;
//!
//! let provider = SqliteRepositoryProvider::connect("sqlite://franchise.db").await?;
//! provider.migrate().await?;
//! ```

pub mod migrations;
pub mod repositories;

pub use migrations::SqliteMigrationManager;
pub use repositories::{
    SqliteAccountRepository, SqliteAuditLogRepository, SqliteBranchRepository,
    SqliteInventoryRepository, SqliteInvitationCodeRepository, SqliteProductRepository,
    SqliteRepositoryProvider, SqliteSaleRepository,
};
pub use sqlx::SqlitePool;

use chrono::{DateTime, Utc};
use franchise_core::{Error, StorageError};

pub(crate) fn from_timestamp(secs: i64) -> Result<DateTime<Utc>, Error> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        tracing::error!(timestamp = secs, "Stored timestamp is out of range");
        Error::Storage(StorageError::Database(
            "Stored timestamp is out of range".to_string(),
        ))
    })
}

pub(crate) fn from_optional_timestamp(secs: Option<i64>) -> Result<Option<DateTime<Utc>>, Error> {
    secs.map(from_timestamp).transpose()
}

pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}
