use async_trait::async_trait;
use chrono::Utc;
use franchise_core::{
    AccountId, AuditEntry, Error, NewAuditEntry,
    error::utilities::DatabaseResultExt,
    repositories::AuditLogRepository,
};
use sqlx::SqlitePool;

use crate::from_timestamp;

pub struct SqliteAuditLogRepository {
    pool: SqlitePool,
}

impl SqliteAuditLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuditEntryRow {
    id: i64,
    user_id: Option<String>,
    action: String,
    entity_type: Option<String>,
    entity_id: Option<String>,
    details: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: i64,
}

impl TryFrom<AuditEntryRow> for AuditEntry {
    type Error = Error;

    fn try_from(row: AuditEntryRow) -> Result<Self, Self::Error> {
        let details = serde_json::from_str(&row.details)
            .map_db_err_with_context("Stored audit details are not valid JSON")?;

        Ok(AuditEntry {
            id: row.id,
            account_id: row.user_id.map(AccountId::from),
            action: row.action,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            details,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: from_timestamp(row.created_at)?,
        })
    }
}

#[async_trait]
impl AuditLogRepository for SqliteAuditLogRepository {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, Error> {
        let row = sqlx::query_as::<_, AuditEntryRow>(
            r#"
            INSERT INTO audit_logs (
                user_id, action, entity_type, entity_id, details, ip_address, user_agent, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING *
            "#,
        )
        .bind(entry.account_id.as_ref().map(|id| id.as_str()))
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(&entry.entity_id)
        .bind(entry.details.to_string())
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_db_err_with_context("Failed to append audit entry")?;

        row.try_into()
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<AuditEntry>, Error> {
        let rows = sqlx::query_as::<_, AuditEntryRow>(
            "SELECT * FROM audit_logs ORDER BY created_at DESC, id DESC LIMIT ?1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_db_err_with_context("Failed to query audit log")?;

        rows.into_iter().map(AuditEntry::try_from).collect()
    }

    async fn list_by_account(
        &self,
        account_id: &AccountId,
        limit: u32,
    ) -> Result<Vec<AuditEntry>, Error> {
        let rows = sqlx::query_as::<_, AuditEntryRow>(
            r#"
            SELECT * FROM audit_logs
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            "#,
        )
        .bind(account_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_db_err_with_context("Failed to query audit log")?;

        rows.into_iter().map(AuditEntry::try_from).collect()
    }
}
