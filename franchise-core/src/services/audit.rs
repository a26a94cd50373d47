use std::sync::Arc;

use crate::{NewAuditEntry, repositories::AuditLogRepository};

/// Writes audit entries without letting storage failures escape.
///
/// A failed write is reported through `tracing` and otherwise ignored, so
/// the outcome of the audited operation never depends on the audit store.
pub struct AuditLogger<L: AuditLogRepository> {
    repository: Arc<L>,
}

impl<L: AuditLogRepository> Clone for AuditLogger<L> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<L: AuditLogRepository> AuditLogger<L> {
    pub fn new(repository: Arc<L>) -> Self {
        Self { repository }
    }

    pub async fn record(&self, entry: NewAuditEntry) {
        let action = entry.action.clone();

        match self.repository.append(entry).await {
            Ok(saved) => {
                tracing::debug!(id = saved.id, action = %saved.action, "Audit entry recorded");
            }
            Err(e) => {
                tracing::error!(action = %action, error = %e, "Failed to write audit log entry");
            }
        }
    }

    pub fn repository(&self) -> &L {
        &self.repository
    }
}
