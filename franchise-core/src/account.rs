//! Accounts
//!
//! An account is a person who can sign in to the franchise backend. The core
//! account struct is defined as follows:
//!
//! | Field                        | Type                       | Description                                          |
//! | ---------------------------- | -------------------------- | ---------------------------------------------------- |
//! | `id`                         | `AccountId`                | The unique identifier for the account.               |
//! | `email`                      | `String`                   | Lower-cased, unique email address.                   |
//! | `full_name`                  | `String`                   | Display name.                                        |
//! | `password_hash`              | `String`                   | bcrypt digest, never serialized.                     |
//! | `role`                       | `Role`                     | Access level granted at signup.                      |
//! | `branch_id`                  | `Option<BranchId>`         | Branch a franchisee or crew member works at.         |
//! | `is_active`                  | `bool`                     | Deactivated accounts cannot sign in.                 |
//! | `is_email_verified`          | `bool`                     | Whether the verification token was redeemed.         |
//! | `email_verification_token`   | `Option<String>`           | One-time email verification token.                   |
//! | `password_reset_token`       | `Option<String>`           | One-time password reset token.                       |
//! | `last_login`                 | `Option<DateTime>`         | Timestamp of the last successful login.              |
//! | `login_attempts`             | `u32`                      | Consecutive failed logins since the last reset.      |
//! | `locked_until`               | `Option<DateTime>`         | Logins are refused until this instant.               |
//! | `invitation_code_id`         | `Option<InvitationCodeId>` | The invitation code redeemed at signup.              |
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    BranchId, Error, InvitationCodeId,
    error::ValidationError,
    id::{generate_prefixed_id, validate_prefixed_id},
};

/// A unique, stable identifier for an account
///
/// This value should be treated as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: &str) -> Self {
        AccountId(id.to_string())
    }

    pub fn new_random() -> Self {
        AccountId(generate_prefixed_id("usr"))
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this ID has the correct format for an account ID
    pub fn is_valid(&self) -> bool {
        validate_prefixed_id(&self.0, "usr")
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new_random()
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fixed set of roles an account can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Headquarters administrator
    HqAdmin,
    /// Owns one or more franchise branches
    #[default]
    FranchiseOwner,
    /// Operates a single branch
    Franchisee,
    /// Branch staff
    Crew,
}

impl Role {
    /// Get the string representation for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::HqAdmin => "hq_admin",
            Role::FranchiseOwner => "franchise_owner",
            Role::Franchisee => "franchisee",
            Role::Crew => "crew",
        }
    }
}

impl Role {
    pub fn sees_all_branches(&self) -> bool {
        matches!(self, Role::HqAdmin | Role::FranchiseOwner)
    }

    /// Only headquarters opens branches and edits the product catalog.
    pub fn manages_catalog(&self) -> bool {
        matches!(self, Role::HqAdmin)
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hq_admin" => Ok(Role::HqAdmin),
            "franchise_owner" => Ok(Role::FranchiseOwner),
            "franchisee" => Ok(Role::Franchisee),
            "crew" => Ok(Role::Crew),
            _ => Err(ValidationError::InvalidField(format!("Invalid role: {s}")).into()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored account, including its credentials.
///
/// `Account` deliberately does not implement `Serialize`; use [`AccountView`]
/// for anything that leaves the process.
#[derive(Clone)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
    pub branch_id: Option<BranchId>,
    pub invitation_code_id: Option<InvitationCodeId>,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub email_verification_token: Option<String>,
    pub email_verification_expires: Option<DateTime<Utc>>,
    pub password_reset_token: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub login_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Whole minutes (rounded up) until the lockout ends, or `None` if the
    /// account is not locked at `now`.
    pub fn lockout_minutes_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        let until = self.locked_until?;
        if until <= now {
            return None;
        }
        let remaining_ms = (until - now).num_milliseconds();
        Some((remaining_ms + 59_999) / 60_000)
    }

    pub fn is_locked(&self) -> bool {
        self.lockout_minutes_remaining(Utc::now()).is_some()
    }

    /// The public projection of this account.
    pub fn view(&self) -> AccountView {
        AccountView::from(self)
    }

    /// Whether this account may read or write data of `branch_id`.
    ///
    /// Headquarters and franchise owners see every branch; franchisees and
    /// crew only the branch they are assigned to.
    pub fn can_access_branch(&self, branch_id: &BranchId) -> bool {
        self.role.sees_all_branches() || self.branch_id.as_ref() == Some(branch_id)
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .field("branch_id", &self.branch_id)
            .field("invitation_code_id", &self.invitation_code_id)
            .field("is_active", &self.is_active)
            .field("is_email_verified", &self.is_email_verified)
            .field("email_verification_token", &"[REDACTED]")
            .field("email_verification_expires", &self.email_verification_expires)
            .field("password_reset_token", &"[REDACTED]")
            .field("password_reset_expires", &self.password_reset_expires)
            .field("last_login", &self.last_login)
            .field("login_attempts", &self.login_attempts)
            .field("locked_until", &self.locked_until)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Account data safe to return to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: AccountId,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub branch_id: Option<BranchId>,
    pub invitation_code_id: Option<InvitationCodeId>,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            full_name: account.full_name.clone(),
            role: account.role,
            branch_id: account.branch_id.clone(),
            invitation_code_id: account.invitation_code_id.clone(),
            is_active: account.is_active,
            is_email_verified: account.is_email_verified,
            last_login: account.last_login,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Data required to insert a new account.
#[derive(Clone)]
pub struct NewAccount {
    pub id: AccountId,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
    pub invitation_code_id: Option<InvitationCodeId>,
    pub email_verification_token: Option<String>,
    pub email_verification_expires: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl NewAccount {
    pub fn builder() -> NewAccountBuilder {
        NewAccountBuilder::default()
    }
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .field("invitation_code_id", &self.invitation_code_id)
            .field("is_active", &self.is_active)
            .finish()
    }
}

#[derive(Default)]
pub struct NewAccountBuilder {
    id: Option<AccountId>,
    email: Option<String>,
    full_name: Option<String>,
    password_hash: Option<String>,
    role: Option<Role>,
    invitation_code_id: Option<InvitationCodeId>,
    email_verification_token: Option<String>,
    email_verification_expires: Option<DateTime<Utc>>,
    is_active: Option<bool>,
}

impl NewAccountBuilder {
    pub fn id(mut self, id: AccountId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the email; it is stored lower-cased.
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn password_hash(mut self, password_hash: impl Into<String>) -> Self {
        self.password_hash = Some(password_hash.into());
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn invitation_code_id(mut self, invitation_code_id: Option<InvitationCodeId>) -> Self {
        self.invitation_code_id = invitation_code_id;
        self
    }

    pub fn email_verification(mut self, token: String, expires: DateTime<Utc>) -> Self {
        self.email_verification_token = Some(token);
        self.email_verification_expires = Some(expires);
        self
    }

    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn build(self) -> Result<NewAccount, Error> {
        use crate::error::utilities::RequiredFieldExt;

        Ok(NewAccount {
            id: self.id.unwrap_or_default(),
            email: self.email.require_field("Email")?.to_lowercase(),
            full_name: self.full_name.require_field("Full name")?,
            password_hash: self.password_hash.require_field("Password hash")?,
            role: self.role.unwrap_or_default(),
            invitation_code_id: self.invitation_code_id,
            email_verification_token: self.email_verification_token,
            email_verification_expires: self.email_verification_expires,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

/// Result of recording one failed login against an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailedLogin {
    /// Consecutive failures including this one (the lockout threshold when it triggered a lock)
    pub attempts: u32,
    /// Set when this failure locked the account
    pub locked_until: Option<DateTime<Utc>>,
}

impl FailedLogin {
    pub fn locked(&self) -> bool {
        self.locked_until.is_some()
    }
}
