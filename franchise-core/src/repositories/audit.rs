//! Repository trait for the audit log.

use async_trait::async_trait;

use crate::{AccountId, AuditEntry, Error, NewAuditEntry};

/// Append-only storage for audit entries.
#[async_trait]
pub trait AuditLogRepository: Send + Sync + 'static {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, Error>;

    /// Most recent entries first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<AuditEntry>, Error>;

    /// Entries whose actor is `account_id`, most recent first.
    async fn list_by_account(
        &self,
        account_id: &AccountId,
        limit: u32,
    ) -> Result<Vec<AuditEntry>, Error>;
}
