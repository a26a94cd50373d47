//! Repository trait for recorded sales.

use async_trait::async_trait;

use crate::{Error, NewSale, Sale, SaleFilter};

#[async_trait]
pub trait SaleRepository: Send + Sync + 'static {
    /// Store a sale with its amounts computed by [`NewSale::amounts`].
    async fn create(&self, sale: NewSale) -> Result<Sale, Error>;

    /// Sales matching `filter`, newest first.
    async fn list(&self, filter: &SaleFilter) -> Result<Vec<Sale>, Error>;
}
