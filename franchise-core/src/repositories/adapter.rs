use crate::{
    Account, AccountId, AuditEntry, Branch, BranchId, BranchStatus, Error, FailedLogin,
    InventoryId, InventoryItem, InvitationCode, InvitationCodeId, NewAccount, NewAuditEntry,
    NewBranch, NewInventoryItem, NewInvitationCode, NewProduct, NewSale, Product, ProductId, Sale,
    SaleFilter,
    repositories::{
        AccountRepository, AuditLogRepository, BranchRepository, InventoryRepository,
        InvitationCodeRepository, ProductRepository, RepositoryProvider, SaleRepository,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Adapter that wraps a RepositoryProvider and implements [`AccountRepository`]
pub struct AccountRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> AccountRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> AccountRepository for AccountRepositoryAdapter<R> {
    async fn create(&self, account: NewAccount) -> Result<Account, Error> {
        self.provider.account().create(account).await
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error> {
        self.provider.account().find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error> {
        self.provider.account().find_by_email(email).await
    }

    async fn record_failed_login(
        &self,
        id: &AccountId,
        max_attempts: u32,
        lock_until: DateTime<Utc>,
    ) -> Result<FailedLogin, Error> {
        self.provider
            .account()
            .record_failed_login(id, max_attempts, lock_until)
            .await
    }

    async fn record_successful_login(
        &self,
        id: &AccountId,
        at: DateTime<Utc>,
    ) -> Result<Account, Error> {
        self.provider.account().record_successful_login(id, at).await
    }

    async fn update(&self, account: &Account) -> Result<Account, Error> {
        self.provider.account().update(account).await
    }
}

pub struct InvitationCodeRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> InvitationCodeRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> InvitationCodeRepository for InvitationCodeRepositoryAdapter<R> {
    async fn create(&self, code: NewInvitationCode) -> Result<InvitationCode, Error> {
        self.provider.invitation_code().create(code).await
    }

    async fn find_by_id(&self, id: &InvitationCodeId) -> Result<Option<InvitationCode>, Error> {
        self.provider.invitation_code().find_by_id(id).await
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<InvitationCode>, Error> {
        self.provider.invitation_code().find_by_code(code).await
    }

    async fn redeem(&self, id: &InvitationCodeId) -> Result<bool, Error> {
        self.provider.invitation_code().redeem(id).await
    }

    async fn release(&self, id: &InvitationCodeId) -> Result<(), Error> {
        self.provider.invitation_code().release(id).await
    }

    async fn set_active(&self, id: &InvitationCodeId, is_active: bool) -> Result<(), Error> {
        self.provider.invitation_code().set_active(id, is_active).await
    }
}

pub struct AuditLogRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> AuditLogRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> AuditLogRepository for AuditLogRepositoryAdapter<R> {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, Error> {
        self.provider.audit_log().append(entry).await
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<AuditEntry>, Error> {
        self.provider.audit_log().list_recent(limit).await
    }

    async fn list_by_account(
        &self,
        account_id: &AccountId,
        limit: u32,
    ) -> Result<Vec<AuditEntry>, Error> {
        self.provider
            .audit_log()
            .list_by_account(account_id, limit)
            .await
    }
}

pub struct BranchRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> BranchRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> BranchRepository for BranchRepositoryAdapter<R> {
    async fn create(&self, branch: NewBranch) -> Result<Branch, Error> {
        self.provider.branch().create(branch).await
    }

    async fn find_by_id(&self, id: &BranchId) -> Result<Option<Branch>, Error> {
        self.provider.branch().find_by_id(id).await
    }

    async fn list(&self) -> Result<Vec<Branch>, Error> {
        self.provider.branch().list().await
    }

    async fn set_status(&self, id: &BranchId, status: BranchStatus) -> Result<Branch, Error> {
        self.provider.branch().set_status(id, status).await
    }
}

pub struct ProductRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> ProductRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> ProductRepository for ProductRepositoryAdapter<R> {
    async fn create(&self, product: NewProduct) -> Result<Product, Error> {
        self.provider.product().create(product).await
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, Error> {
        self.provider.product().find_by_id(id).await
    }

    async fn list_active(&self) -> Result<Vec<Product>, Error> {
        self.provider.product().list_active().await
    }

    async fn set_active(&self, id: &ProductId, is_active: bool) -> Result<(), Error> {
        self.provider.product().set_active(id, is_active).await
    }
}

pub struct InventoryRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> InventoryRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> InventoryRepository for InventoryRepositoryAdapter<R> {
    async fn create(&self, item: NewInventoryItem) -> Result<InventoryItem, Error> {
        self.provider.inventory().create(item).await
    }

    async fn find_by_id(&self, id: &InventoryId) -> Result<Option<InventoryItem>, Error> {
        self.provider.inventory().find_by_id(id).await
    }

    async fn list_by_branch(&self, branch_id: &BranchId) -> Result<Vec<InventoryItem>, Error> {
        self.provider.inventory().list_by_branch(branch_id).await
    }

    async fn set_quantity(
        &self,
        id: &InventoryId,
        quantity: f64,
        at: DateTime<Utc>,
    ) -> Result<InventoryItem, Error> {
        self.provider.inventory().set_quantity(id, quantity, at).await
    }
}

pub struct SaleRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> SaleRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> SaleRepository for SaleRepositoryAdapter<R> {
    async fn create(&self, sale: NewSale) -> Result<Sale, Error> {
        self.provider.sale().create(sale).await
    }

    async fn list(&self, filter: &SaleFilter) -> Result<Vec<Sale>, Error> {
        self.provider.sale().list(filter).await
    }
}
