//! Authentication extractor for axum.
//!
//! Token verification happens upstream: the API gateway validates the
//! client's credentials and forwards the verified user id in the
//! `x-user-id` header. This service only trusts and parses that header.
//!
//! ```text
//! Client → gateway (verifies token, sets x-user-id) → RequireUser → handler
//! ```
//!
//! # Example
//!
//! ```ignore
//! async fn ws_handler(RequireUser(user_id): RequireUser, ws: WebSocketUpgrade) -> Response {
//!     ws.on_upgrade(move |socket| handle_socket(socket, user_id))
//! }
//! ```

use axum::{
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::foundation::UserId;

/// Header carrying the gateway-verified user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor that requires a verified user id.
///
/// Rejects with 401 when the header is missing or not a valid user id.
#[derive(Debug, Clone, Copy)]
pub struct RequireUser(pub UserId);

impl RequireUser {
    fn from_parts(parts: &Parts) -> Result<Self, AuthRejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(AuthRejection::MissingUser)?
            .to_str()
            .map_err(|_| AuthRejection::InvalidUser)?;

        raw.trim()
            .parse::<UserId>()
            .map(RequireUser)
            .map_err(|_| AuthRejection::InvalidUser)
    }
}

impl<S> axum::extract::FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move { Self::from_parts(parts) })
    }
}

/// Rejection type for authentication failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No user id header was forwarded.
    MissingUser,
    /// The forwarded user id is not a valid id.
    InvalidUser,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            AuthRejection::MissingUser => "Authentication required",
            AuthRejection::InvalidUser => "Invalid user identity",
        };

        tracing::debug!(rejection = ?self, "Rejecting unauthenticated request");

        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": message,
                "code": "UNAUTHENTICATED"
            })),
        )
            .into_response()
    }
}
