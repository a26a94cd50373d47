//! # Franchise Axum Integration
//!
//! JSON HTTP routes for the franchise accounts and operations backend.
//!
//! | Method    | Path                                  | Notes                          |
//! | --------- | ------------------------------------- | ------------------------------ |
//! | GET       | `/api/health`                         | storage health check           |
//! | POST      | `/api/auth/signup`                    | rate limited per client        |
//! | POST      | `/api/auth/login`                     | returns a bearer JWT           |
//! | GET       | `/api/auth/invitation-code/validate`  | `?code=...`                    |
//! | GET       | `/api/auth/me`                        | requires `Authorization`       |
//! | GET, POST | `/api/branches`                       | creating is headquarters only  |
//! | GET       | `/api/branches/{id}`                  |                                |
//! | PATCH     | `/api/branches/{id}/status`           | headquarters only              |
//! | GET, POST | `/api/products`                       | creating is headquarters only  |
//! | PATCH     | `/api/products/{id}`                  | `{ "isActive": bool }`         |
//! | GET, POST | `/api/inventory`                      | `?branchId=...`                |
//! | PATCH     | `/api/inventory/{id}`                 | `{ "quantity": number }`       |
//! | GET, POST | `/api/sales`                          | `?branchId&startDate&endDate`  |
//! | PATCH     | `/api/users/{id}/branch`              | headquarters only              |
//!
//! Everything below `/api/auth/me` requires `Authorization` as well. Branch
//! scoped routes answer `403` outside the caller's branch.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::{net::SocketAddr, sync::Arc};
//! use axum::http::HeaderValue;
//! use franchise::{FranchiseBuilder, JwtConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let franchise = FranchiseBuilder::new()
//!         .with_sqlite("sqlite://franchise.db")
//!         .await?
//!         .with_jwt_config(JwtConfig::new_hs256(b"change-me".to_vec()))
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     let app = franchise_axum::routes(Arc::new(franchise))
//!         .with_cors_origin(HeaderValue::from_static("http://localhost:3000"))
//!         .build();
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(
//!         listener,
//!         app.into_make_service_with_connect_info::<SocketAddr>(),
//!     )
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! Serve with `into_make_service_with_connect_info::<SocketAddr>()` so the
//! signup rate limit can key on the peer address when no proxy headers are
//! present.

mod error;
mod extractors;
mod middleware;
mod routes;
mod types;

pub use error::{ApiError, Result};
pub use extractors::{AuthAccount, ClientInfo, UNKNOWN_CLIENT, client_address};
pub use middleware::{AppState, require_auth};
pub use routes::create_router;
pub use types::{
    AccountResponse, AssignBranchRequest, BranchStatusRequest, DataResponse, HealthResponse,
    InventoryQuery, InvitationCodeCheck, InvitationCodeQuery, ProductActiveRequest, SalesQuery,
    UpdateInventoryRequest,
};

use std::sync::Arc;

use axum::{Router, http::HeaderValue};
use franchise::Franchise;
use franchise_core::repositories::RepositoryProvider;

/// Start configuring the API router for `franchise`.
pub fn routes<R>(franchise: Arc<Franchise<R>>) -> ApiRouterBuilder<R>
where
    R: RepositoryProvider + 'static,
{
    ApiRouterBuilder {
        franchise,
        cors_origin: None,
    }
}

/// Builder for the API router
pub struct ApiRouterBuilder<R: RepositoryProvider> {
    franchise: Arc<Franchise<R>>,
    cors_origin: Option<HeaderValue>,
}

impl<R: RepositoryProvider + 'static> ApiRouterBuilder<R> {
    /// Allow credentialed cross-origin requests from `origin`.
    pub fn with_cors_origin(mut self, origin: HeaderValue) -> Self {
        self.cors_origin = Some(origin);
        self
    }

    pub fn build(self) -> Router {
        create_router(self.franchise, self.cors_origin)
    }
}

impl<R: RepositoryProvider + 'static> From<ApiRouterBuilder<R>> for Router {
    fn from(builder: ApiRouterBuilder<R>) -> Self {
        builder.build()
    }
}
