//! Service layer for business logic
//!
//! Services are generic over the repository traits in
//! [`repositories`](crate::repositories) and hold no storage details.

pub mod account;
pub mod audit;
pub mod invitation;
pub mod operations;
pub mod rate_limit;

pub use account::{
    AccountConfig, AccountService, LockoutConfig, LoginRequest, LoginResponse, SignupRequest,
    SignupResponse,
};
pub use audit::AuditLogger;
pub use invitation::InvitationCodeService;
pub use operations::{OperationsService, SaleRequest};
pub use rate_limit::{
    Admission, InMemoryRateLimitStore, RateLimitConfig, RateLimitStore, RateLimitWindow,
    RateLimiter,
};
