use std::{convert::Infallible, net::SocketAddr};

use axum::{
    Extension, RequestPartsExt,
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use axum_extra::{TypedHeader, headers::UserAgent};
use franchise::{Account, ClientContext};

use crate::error::ApiError;

/// Key used when a request carries no address information at all.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Who is calling: the rate limit key plus what goes into the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Rate limit key, never empty
    pub key: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn context(&self) -> ClientContext {
        ClientContext::new(self.ip_address.clone(), self.user_agent.clone())
    }
}

/// Resolve the client address from proxy headers, falling back to the peer
/// address of the connection.
///
/// The first entry of `X-Forwarded-For` wins over `X-Real-IP`.
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // An unreadable user agent is only lost from the audit entry.
        let user_agent = parts
            .extract::<Option<TypedHeader<UserAgent>>>()
            .await
            .ok()
            .flatten()
            .map(|TypedHeader(ua)| ua.to_string());

        let peer = parts
            .extract::<ConnectInfo<SocketAddr>>()
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr);

        let ip_address = client_address(&parts.headers, peer);
        let key = ip_address
            .clone()
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

        Ok(ClientInfo {
            key,
            ip_address,
            user_agent,
        })
    }
}

/// The account resolved by [`require_auth`](crate::middleware::require_auth).
pub struct AuthAccount(pub Account);

impl<S> FromRequestParts<S> for AuthAccount
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Extension(account): Extension<Account> =
            parts.extract().await.map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthAccount(account))
    }
}
