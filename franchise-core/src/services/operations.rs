//! Branch operations: branches, the product catalog, stock levels and sales.
//!
//! Every call takes the acting [`Account`]. Headquarters manages the catalog
//! and branch list, franchise owners see every branch, and franchisees and
//! crew are confined to the branch they are assigned to. Refusals come back
//! as [`AuthError::Forbidden`].

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use crate::{
    Account, AccountId, Branch, BranchId, BranchStatus, Error, InventoryId, InventoryItem,
    NewBranch, NewInventoryItem, NewProduct, NewSale, PaymentMethod, Product, ProductId, Sale,
    SaleFilter, SaleId,
    error::{AuthError, StorageError, ValidationError},
    inventory::validate_quantity,
    repositories::{
        AccountRepository, BranchRepository, InventoryRepository, ProductRepository,
        SaleRepository,
    },
};

/// A sale as submitted by a client.
///
/// The unit price defaults to the product's catalog price.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    pub branch_id: BranchId,
    pub product_id: ProductId,
    pub quantity: f64,
    #[serde(default)]
    pub unit_price_cents: Option<i64>,
    #[serde(default)]
    pub discount_percent: f64,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub transaction_reference: Option<String>,
}

pub struct OperationsService<A, B, P, V, S>
where
    A: AccountRepository,
    B: BranchRepository,
    P: ProductRepository,
    V: InventoryRepository,
    S: SaleRepository,
{
    accounts: Arc<A>,
    branches: Arc<B>,
    products: Arc<P>,
    inventory: Arc<V>,
    sales: Arc<S>,
}

impl<A, B, P, V, S> OperationsService<A, B, P, V, S>
where
    A: AccountRepository,
    B: BranchRepository,
    P: ProductRepository,
    V: InventoryRepository,
    S: SaleRepository,
{
    pub fn new(
        accounts: Arc<A>,
        branches: Arc<B>,
        products: Arc<P>,
        inventory: Arc<V>,
        sales: Arc<S>,
    ) -> Self {
        Self {
            accounts,
            branches,
            products,
            inventory,
            sales,
        }
    }

    pub async fn create_branch(&self, actor: &Account, branch: NewBranch) -> Result<Branch, Error> {
        ensure_manages_catalog(actor)?;
        branch.validate()?;

        let created = self.branches.create(branch).await?;
        tracing::info!(
            branch_id = %created.id,
            created_by = %actor.id,
            "Branch created"
        );
        Ok(created)
    }

    /// Branches visible to `actor`: all of them, or only the assigned one.
    pub async fn list_branches(&self, actor: &Account) -> Result<Vec<Branch>, Error> {
        if actor.role.sees_all_branches() {
            return self.branches.list().await;
        }

        match &actor.branch_id {
            Some(branch_id) => Ok(self
                .branches
                .find_by_id(branch_id)
                .await?
                .into_iter()
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    pub async fn branch(&self, actor: &Account, id: &BranchId) -> Result<Branch, Error> {
        ensure_branch_access(actor, id)?;
        self.branches
            .find_by_id(id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))
    }

    pub async fn set_branch_status(
        &self,
        actor: &Account,
        id: &BranchId,
        status: BranchStatus,
    ) -> Result<Branch, Error> {
        ensure_manages_catalog(actor)?;
        let branch = self.branches.set_status(id, status).await?;
        tracing::info!(branch_id = %id, status = %status, "Branch status changed");
        Ok(branch)
    }

    /// Attach `account_id` to a branch, or detach it with `None`.
    pub async fn assign_branch(
        &self,
        actor: &Account,
        account_id: &AccountId,
        branch_id: Option<BranchId>,
    ) -> Result<Account, Error> {
        ensure_manages_catalog(actor)?;

        if let Some(branch_id) = &branch_id {
            self.existing_branch(branch_id).await?;
        }

        let mut account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))?;
        account.branch_id = branch_id;

        let updated = self.accounts.update(&account).await?;
        tracing::info!(
            account_id = %updated.id,
            branch_id = ?updated.branch_id,
            "Account branch assignment changed"
        );
        Ok(updated)
    }

    pub async fn create_product(
        &self,
        actor: &Account,
        product: NewProduct,
    ) -> Result<Product, Error> {
        ensure_manages_catalog(actor)?;
        product.validate()?;

        let created = self.products.create(product).await?;
        tracing::info!(product_id = %created.id, "Product created");
        Ok(created)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, Error> {
        self.products.list_active().await
    }

    pub async fn set_product_active(
        &self,
        actor: &Account,
        id: &ProductId,
        is_active: bool,
    ) -> Result<(), Error> {
        ensure_manages_catalog(actor)?;
        self.products.set_active(id, is_active).await
    }

    /// Start tracking a product's stock at a branch.
    pub async fn add_inventory(
        &self,
        actor: &Account,
        item: NewInventoryItem,
    ) -> Result<InventoryItem, Error> {
        ensure_branch_access(actor, &item.branch_id)?;
        item.validate()?;
        self.existing_branch(&item.branch_id).await?;
        self.existing_product(&item.product_id).await?;

        self.inventory.create(item).await
    }

    pub async fn list_inventory(
        &self,
        actor: &Account,
        branch_id: &BranchId,
    ) -> Result<Vec<InventoryItem>, Error> {
        ensure_branch_access(actor, branch_id)?;
        self.inventory.list_by_branch(branch_id).await
    }

    pub async fn update_inventory_quantity(
        &self,
        actor: &Account,
        id: &InventoryId,
        quantity: f64,
    ) -> Result<InventoryItem, Error> {
        validate_quantity(quantity)?;

        let item = self
            .inventory
            .find_by_id(id)
            .await?
            .ok_or(Error::Storage(StorageError::NotFound))?;
        ensure_branch_access(actor, &item.branch_id)?;

        let updated = self.inventory.set_quantity(id, quantity, Utc::now()).await?;
        if updated.is_low_stock() {
            tracing::warn!(
                inventory_id = %updated.id,
                branch_id = %updated.branch_id,
                quantity = updated.quantity,
                "Stock at or below minimum threshold"
            );
        }
        Ok(updated)
    }

    /// Record a sale made by `actor`.
    ///
    /// The branch must be active and the product active in the catalog.
    pub async fn record_sale(&self, actor: &Account, request: SaleRequest) -> Result<Sale, Error> {
        ensure_branch_access(actor, &request.branch_id)?;

        let branch = self.existing_branch(&request.branch_id).await?;
        if branch.status != BranchStatus::Active {
            return Err(ValidationError::InvalidField(
                "Sales can only be recorded for active branches".to_string(),
            )
            .into());
        }

        let product = self.existing_product(&request.product_id).await?;
        if !product.is_active {
            return Err(ValidationError::InvalidField(
                "Product is no longer sold".to_string(),
            )
            .into());
        }

        let sale = NewSale {
            id: SaleId::new_random(),
            branch_id: request.branch_id,
            product_id: request.product_id,
            quantity: request.quantity,
            unit_price_cents: request.unit_price_cents.unwrap_or(product.price_cents),
            discount_percent: request.discount_percent,
            recorded_by: actor.id.clone(),
            payment_method: request.payment_method,
            transaction_reference: request.transaction_reference,
        };
        sale.validate()?;

        let recorded = self.sales.create(sale).await?;
        tracing::info!(
            sale_id = %recorded.id,
            branch_id = %recorded.branch_id,
            final_amount_cents = recorded.final_amount_cents,
            "Sale recorded"
        );
        Ok(recorded)
    }

    /// Sales visible to `actor` matching `filter`.
    ///
    /// Without a branch in the filter, franchisees and crew get their own
    /// branch's sales and nothing if they have no branch.
    pub async fn list_sales(&self, actor: &Account, filter: SaleFilter) -> Result<Vec<Sale>, Error> {
        let filter = match &filter.branch_id {
            Some(branch_id) => {
                ensure_branch_access(actor, branch_id)?;
                filter
            }
            None if actor.role.sees_all_branches() => filter,
            None => match &actor.branch_id {
                Some(own) => SaleFilter {
                    branch_id: Some(own.clone()),
                    ..filter
                },
                None => return Ok(Vec::new()),
            },
        };

        self.sales.list(&filter).await
    }

    async fn existing_branch(&self, id: &BranchId) -> Result<Branch, Error> {
        self.branches
            .find_by_id(id)
            .await?
            .ok_or_else(|| ValidationError::InvalidField("Unknown branch".to_string()).into())
    }

    async fn existing_product(&self, id: &ProductId) -> Result<Product, Error> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or_else(|| ValidationError::InvalidField("Unknown product".to_string()).into())
    }
}

fn ensure_manages_catalog(actor: &Account) -> Result<(), Error> {
    if actor.role.manages_catalog() {
        Ok(())
    } else {
        tracing::warn!(account_id = %actor.id, role = %actor.role, "Administrative action refused");
        Err(AuthError::Forbidden.into())
    }
}

fn ensure_branch_access(actor: &Account, branch_id: &BranchId) -> Result<(), Error> {
    if actor.can_access_branch(branch_id) {
        Ok(())
    } else {
        tracing::warn!(
            account_id = %actor.id,
            branch_id = %branch_id,
            "Branch access refused"
        );
        Err(AuthError::Forbidden.into())
    }
}
