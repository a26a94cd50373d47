//! # Franchise
//!
//! Accounts and branch operations for the franchise management backend.
//!
//! Registration is gated by invitation codes that carry the role granted to
//! the new account. Passwords are hashed with bcrypt, repeated failed logins
//! lock the account for a while, successful logins receive a signed JWT and
//! every signup and login decision lands in an append-only audit log.
//!
//! Signed-in accounts work with branches, the product catalog, branch stock
//! and sales. Headquarters administers the catalog; franchisees and crew
//! only reach the branch they are assigned to.
//!
//! [`Franchise`] ties the services in [`franchise_core`] to a storage
//! backend. The HTTP surface lives in the `franchise-axum` crate.
//!
//! ## Example
//!
//! ```rust,no_run
//! use franchise::{ClientContext, FranchiseBuilder, JwtConfig, SignupRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let franchise = FranchiseBuilder::new()
//!         .with_sqlite("sqlite::memory:")
//!         .await?
//!         .with_jwt_config(JwtConfig::new_hs256(b"change-me".to_vec()))
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     let request = SignupRequest {
//!         invitation_code: "FRANCHISE2025".to_string(),
//!         full_name: "Maria Santos".to_string(),
//!         email: "maria@example.com".to_string(),
//!         password: "Abc12345!".to_string(),
//!         confirm_password: "Abc12345!".to_string(),
//!     };
//!     let created = franchise.signup(request, &ClientContext::default()).await?;
//!     println!("{}", created.message);
//!
//!     Ok(())
//! }
//! ```

mod builder;

use std::sync::Arc;

use franchise_core::{
    repositories::{
        AccountRepositoryAdapter, AuditLogRepositoryAdapter, BranchRepositoryAdapter,
        InventoryRepositoryAdapter, InvitationCodeRepositoryAdapter, ProductRepositoryAdapter,
        RepositoryProvider, SaleRepositoryAdapter,
    },
    services::{AccountService, AuditLogger, InvitationCodeService, OperationsService},
    session::JwtIssuer,
};

pub use builder::{FranchiseBuilder, FranchiseBuilderError, NoStorage, WithStorage};

/// Re-export core types from franchise_core
pub use franchise_core::{
    Account, AccountId, AccountView, AuditEntry, Branch, BranchId, BranchStatus, ClientContext,
    Error, InventoryId, InventoryItem, InvitationCode, InvitationCodeId, JwtConfig, NewBranch,
    NewInventoryItem, NewInvitationCode, NewProduct, PaymentMethod, Product, ProductCategory,
    ProductId, Role, Sale, SaleFilter, SaleId, SessionClaims,
    services::{
        AccountConfig, Admission, InMemoryRateLimitStore, LockoutConfig, LoginRequest,
        LoginResponse, RateLimitConfig, RateLimitStore, RateLimitWindow, RateLimiter,
        SaleRequest, SignupRequest, SignupResponse,
    },
};

/// Re-export storage backends
#[cfg(feature = "sqlite")]
pub use franchise_storage_sqlite::SqliteRepositoryProvider;

/// Account service wired to a repository provider.
pub type Accounts<R> = AccountService<
    AccountRepositoryAdapter<R>,
    InvitationCodeRepositoryAdapter<R>,
    AuditLogRepositoryAdapter<R>,
>;

/// Branch operations service wired to a repository provider.
pub type Operations<R> = OperationsService<
    AccountRepositoryAdapter<R>,
    BranchRepositoryAdapter<R>,
    ProductRepositoryAdapter<R>,
    InventoryRepositoryAdapter<R>,
    SaleRepositoryAdapter<R>,
>;

/// Configuration for a [`Franchise`] instance.
///
/// There is no `Default`: tokens cannot be issued without a signing key.
#[derive(Debug, Clone)]
pub struct FranchiseConfig {
    pub jwt: JwtConfig,
    pub account: AccountConfig,
    /// Limits applied to signup attempts per client
    pub signup_rate_limit: RateLimitConfig,
}

impl FranchiseConfig {
    pub fn new(jwt: JwtConfig) -> Self {
        Self {
            jwt,
            account: AccountConfig::default(),
            signup_rate_limit: RateLimitConfig::default(),
        }
    }

    pub fn with_account(mut self, account: AccountConfig) -> Self {
        self.account = account;
        self
    }

    pub fn with_signup_rate_limit(mut self, signup_rate_limit: RateLimitConfig) -> Self {
        self.signup_rate_limit = signup_rate_limit;
        self
    }
}

/// The entry point for accounts, invitation codes and branch operations.
///
/// Cheap to share behind an `Arc`; every service inside holds its
/// repositories by reference count.
pub struct Franchise<R: RepositoryProvider> {
    repositories: Arc<R>,
    accounts: Arc<Accounts<R>>,
    operations: Operations<R>,
    invitations: InvitationCodeService<InvitationCodeRepositoryAdapter<R>>,
    audit: AuditLogger<AuditLogRepositoryAdapter<R>>,
    signup_limiter: RateLimiter<dyn RateLimitStore>,
}

impl<R: RepositoryProvider> Franchise<R> {
    /// Signup attempts are counted in a process-local store.
    pub fn new(repositories: Arc<R>, config: FranchiseConfig) -> Self {
        Self::with_rate_limit_store(repositories, config, Arc::new(InMemoryRateLimitStore::new()))
    }

    /// Count signup attempts in `store`, which may be shared with other
    /// instances.
    pub fn with_rate_limit_store(
        repositories: Arc<R>,
        config: FranchiseConfig,
        store: Arc<dyn RateLimitStore>,
    ) -> Self {
        let account_repo = Arc::new(AccountRepositoryAdapter::new(repositories.clone()));
        let invitations = InvitationCodeService::new(Arc::new(
            InvitationCodeRepositoryAdapter::new(repositories.clone()),
        ));
        let audit = AuditLogger::new(Arc::new(AuditLogRepositoryAdapter::new(
            repositories.clone(),
        )));

        let operations = OperationsService::new(
            account_repo.clone(),
            Arc::new(BranchRepositoryAdapter::new(repositories.clone())),
            Arc::new(ProductRepositoryAdapter::new(repositories.clone())),
            Arc::new(InventoryRepositoryAdapter::new(repositories.clone())),
            Arc::new(SaleRepositoryAdapter::new(repositories.clone())),
        );

        let accounts = Arc::new(AccountService::new(
            account_repo,
            invitations.clone(),
            audit.clone(),
            JwtIssuer::new(config.jwt),
            config.account,
        ));

        Self {
            repositories,
            accounts,
            operations,
            invitations,
            audit,
            signup_limiter: RateLimiter::new(store, config.signup_rate_limit),
        }
    }

    /// Run storage migrations.
    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    pub fn accounts(&self) -> &Accounts<R> {
        &self.accounts
    }

    pub fn operations(&self) -> &Operations<R> {
        &self.operations
    }

    /// Register a new account. Does not consult the signup rate limiter;
    /// callers facing the network check [`admit_signup`](Self::admit_signup) first.
    pub async fn signup(
        &self,
        request: SignupRequest,
        client: &ClientContext,
    ) -> Result<SignupResponse, Error> {
        self.accounts.signup(request, client).await
    }

    pub async fn login(
        &self,
        request: LoginRequest,
        client: &ClientContext,
    ) -> Result<LoginResponse, Error> {
        self.accounts.login(request, client).await
    }

    /// Resolve a bearer token to its active account.
    pub async fn authenticate(&self, token: &str) -> Result<Account, Error> {
        self.accounts.authenticate(token).await
    }

    /// Check whether `code` could be redeemed right now, without redeeming it.
    pub async fn validate_invitation_code(&self, code: &str) -> Result<InvitationCode, Error> {
        self.invitations.validate(code).await
    }

    pub async fn create_invitation_code(
        &self,
        code: NewInvitationCode,
    ) -> Result<InvitationCode, Error> {
        self.invitations.create(code).await
    }

    pub async fn deactivate_invitation_code(&self, id: &InvitationCodeId) -> Result<(), Error> {
        self.invitations.deactivate(id).await
    }

    /// Count one signup attempt from `client_key` against the rate limit.
    pub fn admit_signup(&self, client_key: &str) -> Admission {
        self.signup_limiter.admit(client_key)
    }

    pub fn signup_limiter(&self) -> &RateLimiter<dyn RateLimitStore> {
        &self.signup_limiter
    }

    /// Most recent audit entries first.
    pub async fn recent_audit_entries(&self, limit: u32) -> Result<Vec<AuditEntry>, Error> {
        use franchise_core::repositories::AuditLogRepository;

        self.audit.repository().list_recent(limit).await
    }

    pub async fn create_branch(&self, actor: &Account, branch: NewBranch) -> Result<Branch, Error> {
        self.operations.create_branch(actor, branch).await
    }

    pub async fn list_branches(&self, actor: &Account) -> Result<Vec<Branch>, Error> {
        self.operations.list_branches(actor).await
    }

    pub async fn branch(&self, actor: &Account, id: &BranchId) -> Result<Branch, Error> {
        self.operations.branch(actor, id).await
    }

    pub async fn set_branch_status(
        &self,
        actor: &Account,
        id: &BranchId,
        status: BranchStatus,
    ) -> Result<Branch, Error> {
        self.operations.set_branch_status(actor, id, status).await
    }

    /// Attach an account to a branch, or detach it with `None`.
    pub async fn assign_branch(
        &self,
        actor: &Account,
        account_id: &AccountId,
        branch_id: Option<BranchId>,
    ) -> Result<Account, Error> {
        self.operations
            .assign_branch(actor, account_id, branch_id)
            .await
    }

    pub async fn create_product(
        &self,
        actor: &Account,
        product: NewProduct,
    ) -> Result<Product, Error> {
        self.operations.create_product(actor, product).await
    }

    /// Products currently sold, grouped by category.
    pub async fn list_products(&self) -> Result<Vec<Product>, Error> {
        self.operations.list_products().await
    }

    pub async fn set_product_active(
        &self,
        actor: &Account,
        id: &ProductId,
        is_active: bool,
    ) -> Result<(), Error> {
        self.operations.set_product_active(actor, id, is_active).await
    }

    pub async fn add_inventory(
        &self,
        actor: &Account,
        item: NewInventoryItem,
    ) -> Result<InventoryItem, Error> {
        self.operations.add_inventory(actor, item).await
    }

    pub async fn list_inventory(
        &self,
        actor: &Account,
        branch_id: &BranchId,
    ) -> Result<Vec<InventoryItem>, Error> {
        self.operations.list_inventory(actor, branch_id).await
    }

    pub async fn update_inventory_quantity(
        &self,
        actor: &Account,
        id: &InventoryId,
        quantity: f64,
    ) -> Result<InventoryItem, Error> {
        self.operations
            .update_inventory_quantity(actor, id, quantity)
            .await
    }

    pub async fn record_sale(&self, actor: &Account, request: SaleRequest) -> Result<Sale, Error> {
        self.operations.record_sale(actor, request).await
    }

    pub async fn list_sales(&self, actor: &Account, filter: SaleFilter) -> Result<Vec<Sale>, Error> {
        self.operations.list_sales(actor, filter).await
    }

    /// Start background maintenance, currently the rate limiter sweep.
    ///
    /// The task stops when `shutdown` changes.
    pub fn start_background_tasks(
        &self,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        tracing::info!(
            sweep_interval_secs = self.signup_limiter.config().sweep_interval.as_secs(),
            "Starting signup rate limit sweep"
        );
        self.signup_limiter.start_sweep_task(shutdown)
    }
}
