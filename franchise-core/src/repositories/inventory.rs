//! Repository trait for branch stock levels.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{BranchId, Error, InventoryId, InventoryItem, NewInventoryItem};

#[async_trait]
pub trait InventoryRepository: Send + Sync + 'static {
    /// Store a stock row. A branch holds one row per product; a second row
    /// for the same pair is a constraint violation.
    async fn create(&self, item: NewInventoryItem) -> Result<InventoryItem, Error>;

    async fn find_by_id(&self, id: &InventoryId) -> Result<Option<InventoryItem>, Error>;

    async fn list_by_branch(&self, branch_id: &BranchId) -> Result<Vec<InventoryItem>, Error>;

    /// Overwrite the stock level. When the quantity goes up, `at` becomes
    /// the last restock date.
    async fn set_quantity(
        &self,
        id: &InventoryId,
        quantity: f64,
        at: DateTime<Utc>,
    ) -> Result<InventoryItem, Error>;
}
