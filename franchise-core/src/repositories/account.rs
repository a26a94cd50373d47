//! Repository trait for account data access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Account, AccountId, Error, FailedLogin, NewAccount};

/// Repository for account data access.
///
/// Emails are compared case-insensitively; implementations store them
/// lower-cased.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Insert a new account.
    ///
    /// Fails with [`AuthError::EmailAlreadyExists`](crate::error::AuthError::EmailAlreadyExists)
    /// when the email is already taken.
    async fn create(&self, account: NewAccount) -> Result<Account, Error>;

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, Error>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, Error>;

    /// Record one failed login in a single atomic step.
    ///
    /// Increments `login_attempts`. When the new count reaches `max_attempts`
    /// the account is locked until `lock_until` and the counter returns to 0.
    async fn record_failed_login(
        &self,
        id: &AccountId,
        max_attempts: u32,
        lock_until: DateTime<Utc>,
    ) -> Result<FailedLogin, Error>;

    /// Reset the failure counter, clear any lockout and stamp `last_login`.
    async fn record_successful_login(
        &self,
        id: &AccountId,
        at: DateTime<Utc>,
    ) -> Result<Account, Error>;

    /// Persist changes to the mutable profile and status fields.
    async fn update(&self, account: &Account) -> Result<Account, Error>;
}
