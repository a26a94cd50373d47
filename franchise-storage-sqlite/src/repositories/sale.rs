use async_trait::async_trait;
use chrono::Utc;
use franchise_core::{
    AccountId, BranchId, Error, NewSale, PaymentMethod, ProductId, Sale, SaleFilter, SaleId,
    error::utilities::DatabaseResultExt, repositories::SaleRepository,
};
use sqlx::SqlitePool;

use crate::from_timestamp;

pub struct SqliteSaleRepository {
    pool: SqlitePool,
}

impl SqliteSaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    branch_id: String,
    product_id: String,
    quantity: f64,
    unit_price_cents: i64,
    total_price_cents: i64,
    discount_percent: f64,
    discount_amount_cents: i64,
    final_amount_cents: i64,
    recorded_by: String,
    payment_method: String,
    transaction_reference: Option<String>,
    sale_date: i64,
}

impl TryFrom<SaleRow> for Sale {
    type Error = Error;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        Ok(Sale {
            id: SaleId::from(row.id),
            branch_id: BranchId::from(row.branch_id),
            product_id: ProductId::from(row.product_id),
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            total_price_cents: row.total_price_cents,
            discount_percent: row.discount_percent,
            discount_amount_cents: row.discount_amount_cents,
            final_amount_cents: row.final_amount_cents,
            recorded_by: AccountId::new(&row.recorded_by),
            payment_method: row.payment_method.parse::<PaymentMethod>()?,
            transaction_reference: row.transaction_reference,
            sale_date: from_timestamp(row.sale_date)?,
        })
    }
}

#[async_trait]
impl SaleRepository for SqliteSaleRepository {
    async fn create(&self, sale: NewSale) -> Result<Sale, Error> {
        let amounts = sale.amounts();

        let row = sqlx::query_as::<_, SaleRow>(
            r#"
            INSERT INTO sales (
                id, branch_id, product_id, quantity, unit_price_cents, total_price_cents,
                discount_percent, discount_amount_cents, final_amount_cents, recorded_by,
                payment_method, transaction_reference, sale_date
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            RETURNING *
            "#,
        )
        .bind(sale.id.as_str())
        .bind(sale.branch_id.as_str())
        .bind(sale.product_id.as_str())
        .bind(sale.quantity)
        .bind(sale.unit_price_cents)
        .bind(amounts.total_price_cents)
        .bind(sale.discount_percent)
        .bind(amounts.discount_amount_cents)
        .bind(amounts.final_amount_cents)
        .bind(sale.recorded_by.as_str())
        .bind(sale.payment_method.as_str())
        .bind(&sale.transaction_reference)
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_db_err_with_context("Failed to record sale")?;

        row.try_into()
    }

    async fn list(&self, filter: &SaleFilter) -> Result<Vec<Sale>, Error> {
        let rows = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT * FROM sales
            WHERE (?1 IS NULL OR branch_id = ?1)
              AND (?2 IS NULL OR sale_date >= ?2)
              AND (?3 IS NULL OR sale_date < ?3)
            ORDER BY sale_date DESC, id DESC
            "#,
        )
        .bind(filter.branch_id.as_ref().map(|id| id.as_str()))
        .bind(filter.since.map(|at| at.timestamp()))
        .bind(filter.until.map(|at| at.timestamp()))
        .fetch_all(&self.pool)
        .await
        .map_db_err_with_context("Failed to list sales")?;

        rows.into_iter().map(Sale::try_from).collect()
    }
}
