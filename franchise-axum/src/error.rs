use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use franchise::Error;
use franchise_core::{AuthError, SessionError, StorageError};
use serde_json::json;
use thiserror::Error;

/// Error returned by every handler.
///
/// Responses carry `{ "success": false, "error": <message> }`. Storage and
/// crypto failures are logged and reported with a fixed message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Franchise(#[from] Error),

    #[error("Too many signup attempts. Please try again later.")]
    RateLimited { retry_after_secs: u64 },

    #[error("{0}")]
    BadRequest(String),

    #[error("Authentication required")]
    Unauthorized,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Franchise(err) => match err {
                Error::Validation(_) | Error::Invitation(_) => StatusCode::BAD_REQUEST,
                Error::Auth(AuthError::EmailAlreadyExists) => StatusCode::CONFLICT,
                Error::Auth(AuthError::Forbidden) => StatusCode::FORBIDDEN,
                Error::Auth(_) | Error::Session(_) => StatusCode::UNAUTHORIZED,
                Error::Storage(StorageError::NotFound) => StatusCode::NOT_FOUND,
                Error::Storage(StorageError::Constraint(_)) => StatusCode::CONFLICT,
                Error::Storage(_) | Error::Crypto(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    /// The message shown to clients.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Franchise(err) => match err {
                Error::Validation(e) => e.to_string(),
                Error::Invitation(e) => e.to_string(),
                Error::Auth(e) => e.to_string(),
                Error::Session(SessionError::Expired) => "Session expired".to_string(),
                Error::Session(SessionError::InvalidToken(_)) => {
                    "Invalid or expired token".to_string()
                }
                Error::Storage(StorageError::NotFound) => "Record not found".to_string(),
                Error::Storage(StorageError::Constraint(message)) => message.clone(),
                Error::Storage(_) | Error::Crypto(_) => "Internal server error".to_string(),
            },
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        if let ApiError::RateLimited { retry_after_secs } = self {
            let body = Json(json!({
                "success": false,
                "error": self.client_message(),
                "retryAfter": retry_after_secs,
            }));
            let mut response = (status, body).into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
            return response;
        }

        let body = Json(json!({
            "success": false,
            "error": self.client_message(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
