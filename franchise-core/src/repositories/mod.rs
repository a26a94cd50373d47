//! Repository traits for data access layer
//!
//! Services talk to storage only through these traits.
//!
//! # Trait Hierarchy
//!
//! - Individual `*Repository` traits define the operations for each data domain
//! - Individual `*RepositoryProvider` traits provide access to each repository type
//! - [`RepositoryProvider`] combines all provider traits plus lifecycle methods

pub mod account;
pub mod adapter;
pub mod audit;
pub mod branch;
pub mod inventory;
pub mod invitation;
pub mod product;
pub mod sale;

pub use account::AccountRepository;
pub use adapter::{
    AccountRepositoryAdapter, AuditLogRepositoryAdapter, BranchRepositoryAdapter,
    InventoryRepositoryAdapter, InvitationCodeRepositoryAdapter, ProductRepositoryAdapter,
    SaleRepositoryAdapter,
};
pub use audit::AuditLogRepository;
pub use branch::BranchRepository;
pub use inventory::InventoryRepository;
pub use invitation::InvitationCodeRepository;
pub use product::ProductRepository;
pub use sale::SaleRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for account repository access.
pub trait AccountRepositoryProvider: Send + Sync + 'static {
    type AccountRepo: AccountRepository;

    fn account(&self) -> &Self::AccountRepo;
}

/// Provider trait for invitation code repository access.
pub trait InvitationCodeRepositoryProvider: Send + Sync + 'static {
    type InvitationCodeRepo: InvitationCodeRepository;

    fn invitation_code(&self) -> &Self::InvitationCodeRepo;
}

/// Provider trait for audit log repository access.
pub trait AuditLogRepositoryProvider: Send + Sync + 'static {
    type AuditLogRepo: AuditLogRepository;

    fn audit_log(&self) -> &Self::AuditLogRepo;
}

pub trait BranchRepositoryProvider: Send + Sync + 'static {
    type BranchRepo: BranchRepository;

    fn branch(&self) -> &Self::BranchRepo;
}

pub trait ProductRepositoryProvider: Send + Sync + 'static {
    type ProductRepo: ProductRepository;

    fn product(&self) -> &Self::ProductRepo;
}

pub trait InventoryRepositoryProvider: Send + Sync + 'static {
    type InventoryRepo: InventoryRepository;

    fn inventory(&self) -> &Self::InventoryRepo;
}

pub trait SaleRepositoryProvider: Send + Sync + 'static {
    type SaleRepo: SaleRepository;

    fn sale(&self) -> &Self::SaleRepo;
}

/// Provider trait that storage implementations must implement to provide all repositories.
///
/// # Implementing a Custom Storage Backend
///
/// 1. Implement each individual `*Repository` trait for your backend
/// 2. Implement each individual `*RepositoryProvider` trait
/// 3. Implement this trait with `migrate()` and `health_check()`
///
/// ```rust,ignore
/// use franchise_core::repositories::*;
///
/// impl AccountRepositoryProvider for MyStorage {
///     type AccountRepo = MyAccountRepository;
///     fn account(&self) -> &Self::AccountRepo { &self.accounts }
/// }
///
/// #[async_trait]
/// impl RepositoryProvider for MyStorage {
///     async fn migrate(&self) -> Result<(), Error> { /* ... */ }
///     async fn health_check(&self) -> Result<(), Error> { /* ... */ }
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider:
    AccountRepositoryProvider
    + InvitationCodeRepositoryProvider
    + AuditLogRepositoryProvider
    + BranchRepositoryProvider
    + ProductRepositoryProvider
    + InventoryRepositoryProvider
    + SaleRepositoryProvider
{
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
