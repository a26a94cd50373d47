use async_trait::async_trait;
use chrono::Utc;
use franchise_core::{
    Branch, BranchId, BranchStatus, Error, NewBranch,
    error::{StorageError, utilities::DatabaseResultExt},
    repositories::BranchRepository,
};
use sqlx::SqlitePool;

use crate::from_timestamp;

pub struct SqliteBranchRepository {
    pool: SqlitePool,
}

impl SqliteBranchRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BranchRow {
    id: String,
    name: String,
    location: String,
    franchisee_name: String,
    contact_number: Option<String>,
    email: Option<String>,
    status: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<BranchRow> for Branch {
    type Error = Error;

    fn try_from(row: BranchRow) -> Result<Self, Self::Error> {
        Ok(Branch {
            id: BranchId::from(row.id),
            name: row.name,
            location: row.location,
            franchisee_name: row.franchisee_name,
            contact_number: row.contact_number,
            email: row.email,
            status: row.status.parse::<BranchStatus>()?,
            created_at: from_timestamp(row.created_at)?,
            updated_at: from_timestamp(row.updated_at)?,
        })
    }
}

#[async_trait]
impl BranchRepository for SqliteBranchRepository {
    async fn create(&self, branch: NewBranch) -> Result<Branch, Error> {
        let row = sqlx::query_as::<_, BranchRow>(
            r#"
            INSERT INTO branches (
                id, name, location, franchisee_name, contact_number, email, status,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            RETURNING *
            "#,
        )
        .bind(branch.id.as_str())
        .bind(&branch.name)
        .bind(&branch.location)
        .bind(&branch.franchisee_name)
        .bind(&branch.contact_number)
        .bind(&branch.email)
        .bind(branch.status.as_str())
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_db_err_with_context("Failed to create branch")?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &BranchId) -> Result<Option<Branch>, Error> {
        let row = sqlx::query_as::<_, BranchRow>("SELECT * FROM branches WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_db_err_with_context("Failed to find branch")?;

        row.map(Branch::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Branch>, Error> {
        let rows = sqlx::query_as::<_, BranchRow>("SELECT * FROM branches ORDER BY name, id")
            .fetch_all(&self.pool)
            .await
            .map_db_err_with_context("Failed to list branches")?;

        rows.into_iter().map(Branch::try_from).collect()
    }

    async fn set_status(&self, id: &BranchId, status: BranchStatus) -> Result<Branch, Error> {
        let row = sqlx::query_as::<_, BranchRow>(
            "UPDATE branches SET status = ?2, updated_at = ?3 WHERE id = ?1 RETURNING *",
        )
        .bind(id.as_str())
        .bind(status.as_str())
        .bind(Utc::now().timestamp())
        .fetch_optional(&self.pool)
        .await
        .map_db_err_with_context("Failed to update branch")?
        .ok_or(Error::Storage(StorageError::NotFound))?;

        row.try_into()
    }
}
