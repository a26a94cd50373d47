use async_trait::async_trait;
use chrono::{DateTime, Utc};
use franchise_core::{
    BranchId, Error, InventoryId, InventoryItem, NewInventoryItem, ProductId,
    error::{
        StorageError,
        utilities::{DatabaseResultExt, database_error},
    },
    repositories::InventoryRepository,
};
use sqlx::SqlitePool;

use crate::{from_optional_timestamp, from_timestamp, is_unique_violation};

pub struct SqliteInventoryRepository {
    pool: SqlitePool,
}

impl SqliteInventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InventoryRow {
    id: String,
    branch_id: String,
    product_id: String,
    quantity: f64,
    min_threshold: Option<f64>,
    last_restock_date: Option<i64>,
    created_at: i64,
    last_updated: i64,
}

impl TryFrom<InventoryRow> for InventoryItem {
    type Error = Error;

    fn try_from(row: InventoryRow) -> Result<Self, Self::Error> {
        Ok(InventoryItem {
            id: InventoryId::from(row.id),
            branch_id: BranchId::from(row.branch_id),
            product_id: ProductId::from(row.product_id),
            quantity: row.quantity,
            min_threshold: row.min_threshold,
            last_restock_date: from_optional_timestamp(row.last_restock_date)?,
            created_at: from_timestamp(row.created_at)?,
            last_updated: from_timestamp(row.last_updated)?,
        })
    }
}

#[async_trait]
impl InventoryRepository for SqliteInventoryRepository {
    async fn create(&self, item: NewInventoryItem) -> Result<InventoryItem, Error> {
        let row = sqlx::query_as::<_, InventoryRow>(
            r#"
            INSERT INTO inventory (
                id, branch_id, product_id, quantity, min_threshold, last_restock_date,
                created_at, last_updated
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?6)
            RETURNING *
            "#,
        )
        .bind(item.id.as_str())
        .bind(item.branch_id.as_str())
        .bind(item.product_id.as_str())
        .bind(item.quantity)
        .bind(item.min_threshold)
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Storage(StorageError::Constraint(
                    "This product is already stocked at the branch".to_string(),
                ))
            } else {
                database_error("Failed to create inventory item", e)
            }
        })?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &InventoryId) -> Result<Option<InventoryItem>, Error> {
        let row = sqlx::query_as::<_, InventoryRow>("SELECT * FROM inventory WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_db_err_with_context("Failed to find inventory item")?;

        row.map(InventoryItem::try_from).transpose()
    }

    async fn list_by_branch(&self, branch_id: &BranchId) -> Result<Vec<InventoryItem>, Error> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            r#"
            SELECT inventory.* FROM inventory
            JOIN products ON products.id = inventory.product_id
            WHERE inventory.branch_id = ?1
            ORDER BY products.name
            "#,
        )
        .bind(branch_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_db_err_with_context("Failed to list inventory")?;

        rows.into_iter().map(InventoryItem::try_from).collect()
    }

    async fn set_quantity(
        &self,
        id: &InventoryId,
        quantity: f64,
        at: DateTime<Utc>,
    ) -> Result<InventoryItem, Error> {
        // Column references in SET see the pre-update row.
        let row = sqlx::query_as::<_, InventoryRow>(
            r#"
            UPDATE inventory
            SET last_restock_date = CASE WHEN ?2 > quantity THEN ?3 ELSE last_restock_date END,
                quantity = ?2,
                last_updated = ?3
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id.as_str())
        .bind(quantity)
        .bind(at.timestamp())
        .fetch_optional(&self.pool)
        .await
        .map_db_err_with_context("Failed to update inventory")?
        .ok_or(Error::Storage(StorageError::NotFound))?;

        row.try_into()
    }
}
