//! Versioned schema migrations
//!
//! A storage crate defines one [`Migration`] per schema change and a
//! [`MigrationManager`] that records applied versions in a tracking table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use franchise_core::{Error, StorageError};
use sqlx::Database;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Duplicate migration version {version}: {first} and {second}")]
    DuplicateVersion {
        version: i64,
        first: String,
        second: String,
    },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<MigrationError> for Error {
    fn from(value: MigrationError) -> Self {
        Error::Storage(StorageError::Migration(value.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;

#[async_trait]
pub trait Migration<DB: Database>: Send + Sync {
    /// Execute the migration
    async fn up<'a>(&'a self, conn: &'a mut <DB as Database>::Connection) -> Result<()>;

    /// Rollback the migration
    async fn down<'a>(&'a self, conn: &'a mut <DB as Database>::Connection) -> Result<()>;

    /// Unique version number for ordering migrations
    fn version(&self) -> i64;

    /// Human readable name of the migration
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    /// Unix seconds
    pub applied_at: i64,
}

impl MigrationRecord {
    pub fn applied_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.applied_at, 0)
    }
}

/// Reject migration lists that reuse a version number.
pub fn check_versions<DB: Database>(migrations: &[Box<dyn Migration<DB>>]) -> Result<()> {
    let mut seen: Vec<(i64, &str)> = Vec::with_capacity(migrations.len());

    for migration in migrations {
        if let Some((version, first)) = seen.iter().find(|(v, _)| *v == migration.version()) {
            return Err(MigrationError::DuplicateVersion {
                version: *version,
                first: first.to_string(),
                second: migration.name().to_string(),
            });
        }
        seen.push((migration.version(), migration.name()));
    }

    Ok(())
}

/// Versions from `migrations` that are not in `applied`, in ascending order.
pub fn pending_versions<DB: Database>(
    migrations: &[Box<dyn Migration<DB>>],
    applied: &[MigrationRecord],
) -> Vec<i64> {
    let mut pending: Vec<i64> = migrations
        .iter()
        .map(|m| m.version())
        .filter(|version| !applied.iter().any(|record| record.version == *version))
        .collect();
    pending.sort_unstable();
    pending
}

#[async_trait]
pub trait MigrationManager<DB: Database>: Send + Sync {
    fn get_migration_table_name(&self) -> &str {
        "_franchise_migrations"
    }

    /// Initialize migration tracking table
    async fn initialize(&self) -> Result<()>;

    /// Apply pending migrations in version order
    async fn up(&self, migrations: &[Box<dyn Migration<DB>>]) -> Result<()>;

    /// Roll back applied migrations in reverse version order
    async fn down(&self, migrations: &[Box<dyn Migration<DB>>]) -> Result<()>;

    async fn get_applied_migrations(&self) -> Result<Vec<MigrationRecord>>;

    async fn is_applied(&self, version: i64) -> Result<bool>;
}
