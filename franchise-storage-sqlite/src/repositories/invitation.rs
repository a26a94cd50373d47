use async_trait::async_trait;
use chrono::Utc;
use franchise_core::{
    Error, InvitationCode, InvitationCodeId, NewInvitationCode, Role,
    error::{
        StorageError,
        utilities::{DatabaseResultExt, database_error},
    },
    repositories::InvitationCodeRepository,
};
use sqlx::SqlitePool;

use crate::{from_optional_timestamp, from_timestamp, is_unique_violation};

pub struct SqliteInvitationCodeRepository {
    pool: SqlitePool,
}

impl SqliteInvitationCodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvitationCodeRow {
    id: String,
    code: String,
    description: Option<String>,
    max_uses: Option<i64>,
    current_uses: i64,
    is_active: bool,
    expires_at: Option<i64>,
    role: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<InvitationCodeRow> for InvitationCode {
    type Error = Error;

    fn try_from(row: InvitationCodeRow) -> Result<Self, Self::Error> {
        Ok(InvitationCode {
            id: InvitationCodeId::new(&row.id),
            code: row.code,
            description: row.description,
            max_uses: row.max_uses.map(|max| u32::try_from(max).unwrap_or(0)),
            current_uses: u32::try_from(row.current_uses).unwrap_or(0),
            is_active: row.is_active,
            expires_at: from_optional_timestamp(row.expires_at)?,
            role: row.role.parse::<Role>()?,
            created_at: from_timestamp(row.created_at)?,
            updated_at: from_timestamp(row.updated_at)?,
        })
    }
}

#[async_trait]
impl InvitationCodeRepository for SqliteInvitationCodeRepository {
    async fn create(&self, code: NewInvitationCode) -> Result<InvitationCode, Error> {
        let now = Utc::now().timestamp();

        let row = sqlx::query_as::<_, InvitationCodeRow>(
            r#"
            INSERT INTO invitation_codes (
                id, code, description, max_uses, current_uses, is_active, expires_at, role,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7, ?8, ?8)
            RETURNING *
            "#,
        )
        .bind(code.id.as_str())
        .bind(&code.code)
        .bind(&code.description)
        .bind(code.max_uses.map(i64::from))
        .bind(code.is_active)
        .bind(code.expires_at.map(|at| at.timestamp()))
        .bind(code.role.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Storage(StorageError::Constraint(
                    "Invitation code already exists".to_string(),
                ))
            } else {
                database_error("Failed to create invitation code", e)
            }
        })?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &InvitationCodeId) -> Result<Option<InvitationCode>, Error> {
        let row =
            sqlx::query_as::<_, InvitationCodeRow>("SELECT * FROM invitation_codes WHERE id = ?1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_db_err_with_context("Failed to find invitation code")?;

        row.map(InvitationCode::try_from).transpose()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<InvitationCode>, Error> {
        let row = sqlx::query_as::<_, InvitationCodeRow>(
            "SELECT * FROM invitation_codes WHERE code = ?1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_db_err_with_context("Failed to find invitation code")?;

        row.map(InvitationCode::try_from).transpose()
    }

    async fn redeem(&self, id: &InvitationCodeId) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE invitation_codes
            SET current_uses = current_uses + 1, updated_at = ?2
            WHERE id = ?1
              AND is_active = 1
              AND (max_uses IS NULL OR current_uses < max_uses)
            "#,
        )
        .bind(id.as_str())
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_db_err_with_context("Failed to redeem invitation code")?;

        Ok(result.rows_affected() == 1)
    }

    async fn release(&self, id: &InvitationCodeId) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE invitation_codes
            SET current_uses = current_uses - 1, updated_at = ?2
            WHERE id = ?1 AND current_uses > 0
            "#,
        )
        .bind(id.as_str())
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_db_err_with_context("Failed to release invitation code use")?;

        Ok(())
    }

    async fn set_active(&self, id: &InvitationCodeId, is_active: bool) -> Result<(), Error> {
        let result =
            sqlx::query("UPDATE invitation_codes SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id.as_str())
                .bind(is_active)
                .bind(Utc::now().timestamp())
                .execute(&self.pool)
                .await
                .map_db_err_with_context("Failed to update invitation code")?;

        if result.rows_affected() == 0 {
            return Err(Error::Storage(StorageError::NotFound));
        }

        Ok(())
    }
}
