//! Repository trait for product catalog access.

use async_trait::async_trait;

use crate::{Error, NewProduct, Product, ProductId};

#[async_trait]
pub trait ProductRepository: Send + Sync + 'static {
    /// Store a new product. SKUs are unique when present.
    async fn create(&self, product: NewProduct) -> Result<Product, Error>;

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, Error>;

    /// Active products ordered by category, then name.
    async fn list_active(&self) -> Result<Vec<Product>, Error>;

    async fn set_active(&self, id: &ProductId, is_active: bool) -> Result<(), Error>;
}
