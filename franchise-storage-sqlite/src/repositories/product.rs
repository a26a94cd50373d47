use async_trait::async_trait;
use chrono::Utc;
use franchise_core::{
    Error, NewProduct, Product, ProductCategory, ProductId,
    error::{
        StorageError,
        utilities::{DatabaseResultExt, database_error},
    },
    repositories::ProductRepository,
};
use sqlx::SqlitePool;

use crate::{from_timestamp, is_unique_violation};

pub struct SqliteProductRepository {
    pool: SqlitePool,
}

impl SqliteProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: Option<String>,
    category: String,
    price_cents: i64,
    unit: String,
    sku: Option<String>,
    is_active: bool,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<ProductRow> for Product {
    type Error = Error;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: ProductId::from(row.id),
            name: row.name,
            description: row.description,
            category: row.category.parse::<ProductCategory>()?,
            price_cents: row.price_cents,
            unit: row.unit,
            sku: row.sku,
            is_active: row.is_active,
            created_at: from_timestamp(row.created_at)?,
            updated_at: from_timestamp(row.updated_at)?,
        })
    }
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn create(&self, product: NewProduct) -> Result<Product, Error> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (
                id, name, description, category, price_cents, unit, sku, is_active,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)
            RETURNING *
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category.as_str())
        .bind(product.price_cents)
        .bind(&product.unit)
        .bind(&product.sku)
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Storage(StorageError::Constraint(
                    "A product with this SKU already exists".to_string(),
                ))
            } else {
                database_error("Failed to create product", e)
            }
        })?;

        row.try_into()
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, Error> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_db_err_with_context("Failed to find product")?;

        row.map(Product::try_from).transpose()
    }

    async fn list_active(&self) -> Result<Vec<Product>, Error> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT * FROM products WHERE is_active = 1 ORDER BY category, name",
        )
        .fetch_all(&self.pool)
        .await
        .map_db_err_with_context("Failed to list products")?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn set_active(&self, id: &ProductId, is_active: bool) -> Result<(), Error> {
        let result =
            sqlx::query("UPDATE products SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id.as_str())
                .bind(is_active)
                .bind(Utc::now().timestamp())
                .execute(&self.pool)
                .await
                .map_db_err_with_context("Failed to update product")?;

        if result.rows_affected() == 0 {
            return Err(Error::Storage(StorageError::NotFound));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::tests::migrated_provider;
    use franchise_core::repositories::ProductRepositoryProvider;

    #[tokio::test]
    async fn test_create_and_list_active() {
        let provider = migrated_provider().await;
        let repo = provider.product();

        let syrup = repo
            .create(
                NewProduct::new("Brown Sugar Syrup", 45_000, "liters")
                    .with_category(ProductCategory::Ingredient)
                    .with_sku("BSS-1L"),
            )
            .await
            .unwrap();
        let cups = repo
            .create(
                NewProduct::new("Cups 16oz", 250, "pieces")
                    .with_category(ProductCategory::Packaging),
            )
            .await
            .unwrap();

        assert!(syrup.is_active);
        assert_eq!(syrup.price_cents, 45_000);
        assert_eq!(
            repo.find_by_id(&syrup.id).await.unwrap().unwrap().sku.as_deref(),
            Some("BSS-1L")
        );

        repo.set_active(&cups.id, false).await.unwrap();
        let active: Vec<ProductId> = repo
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|product| product.id)
            .collect();
        assert_eq!(active, vec![syrup.id]);
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_rejected() {
        let provider = migrated_provider().await;
        let repo = provider.product();

        repo.create(NewProduct::new("Tapioca Pearls", 9_000, "kg").with_sku("TP-1KG"))
            .await
            .unwrap();
        let err = repo
            .create(NewProduct::new("Pearls (dup)", 9_000, "kg").with_sku("TP-1KG"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Constraint(_))));

        let err = repo
            .set_active(&ProductId::new_random(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::NotFound)));
    }
}
