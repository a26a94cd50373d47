pub mod utilities;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Invitation error: {0}")]
    Invitation(#[from] InvitationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Rejections produced by the signup and login flows.
///
/// The `Display` text of each variant is the message returned to clients.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailAlreadyExists,

    #[error("This account has been deactivated")]
    AccountInactive,

    #[error(
        "Account is temporarily locked due to too many failed login attempts. Please try again in {minutes} minutes."
    )]
    AccountLocked { minutes: i64 },

    #[error("Account not found")]
    AccountNotFound,

    #[error("You do not have access to this resource")]
    Forbidden,
}

/// Reasons an invitation code cannot be redeemed, in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvitationError {
    #[error("Invalid invitation code")]
    NotFound,

    #[error("This invitation code has been deactivated")]
    Deactivated,

    #[error("This invitation code has expired")]
    Expired,

    #[error("This invitation code has reached its maximum number of uses")]
    Exhausted,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session expired")]
    Expired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Record not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0}")]
    InvalidEmail(String),

    #[error("{0}")]
    InvalidPassword(String),

    #[error("{0}")]
    InvalidName(String),

    #[error("{0}")]
    InvalidField(String),

    #[error("{0}")]
    MissingField(String),
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("JWT signing failed: {0}")]
    JwtSigning(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Random number generation failed: {0}")]
    Random(String),
}

impl Error {
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    pub fn is_invitation_error(&self) -> bool {
        matches!(self, Error::Invitation(_))
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    pub fn is_session_error(&self) -> bool {
        matches!(self, Error::Session(_))
    }

    pub fn is_crypto_error(&self) -> bool {
        matches!(self, Error::Crypto(_))
    }
}
