//! Core functionality for the franchise backend
//!
//! This crate holds the account and invitation code models, the repository
//! traits storage backends implement, and the services that implement signup
//! and login on top of them.
//!
//! See [`Account`] for the core account struct, [`InvitationCode`] for the
//! codes that gate signup, and [`services::AccountService`] for the signup and
//! login flows. Branch operations ([`Branch`], [`Product`], [`InventoryItem`]
//! and [`Sale`]) go through [`services::OperationsService`].
//!
pub mod account;
pub mod audit;
pub mod branch;
pub mod crypto;
pub mod error;
pub mod id;
pub mod inventory;
pub mod invitation;
pub mod product;
pub mod repositories;
pub mod sale;
pub mod services;
pub mod session;
pub mod validation;

pub use account::{Account, AccountId, AccountView, FailedLogin, NewAccount, Role};
pub use audit::{AuditEntry, ClientContext, NewAuditEntry};
pub use error::{
    AuthError, CryptoError, Error, InvitationError, SessionError, StorageError, ValidationError,
};
pub use branch::{Branch, BranchId, BranchStatus, NewBranch};
pub use inventory::{InventoryId, InventoryItem, NewInventoryItem};
pub use invitation::{InvitationCode, InvitationCodeId, NewInvitationCode};
pub use product::{NewProduct, Product, ProductCategory, ProductId};
pub use sale::{NewSale, PaymentMethod, Sale, SaleAmounts, SaleFilter, SaleId};
pub use session::{AccessToken, JwtConfig, SessionClaims};
