use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use franchise::Franchise;
use franchise_core::repositories::RepositoryProvider;

use crate::error::ApiError;

pub struct AppState<R: RepositoryProvider> {
    pub franchise: Arc<Franchise<R>>,
}

impl<R: RepositoryProvider> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            franchise: self.franchise.clone(),
        }
    }
}

/// Reject requests without a valid bearer token.
///
/// On success the active [`Account`](franchise::Account) is stored in the
/// request extensions for [`AuthAccount`](crate::extractors::AuthAccount).
pub async fn require_auth<R>(
    State(state): State<AppState<R>>,
    mut request: Request,
    next: Next,
) -> Response
where
    R: RepositoryProvider,
{
    let Some(Authorization(bearer)) = request.headers().typed_get::<Authorization<Bearer>>()
    else {
        return ApiError::Unauthorized.into_response();
    };

    match state.franchise.authenticate(bearer.token()).await {
        Ok(account) => {
            request.extensions_mut().insert(account);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "Bearer token rejected");
            ApiError::from(e).into_response()
        }
    }
}
