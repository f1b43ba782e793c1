//! Bearer token authentication for protected routes.
//!
//! Extracts the token from the `Authorization` header, validates it with the
//! [`TokenService`], and inserts the resulting [`Identity`] into request
//! extensions for handlers to pick up with `Extension<Identity>`.

use crate::errors::{NkError, TokenError};
use crate::models::Identity;
use crate::services::TokenService;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::IntoResponse,
};
use common::jwt::bearer_token;
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub token_service: Arc<TokenService>,
}

/// Reject the request with 401 unless it carries a valid bearer token.
///
/// A missing header or non-Bearer scheme is reported like a malformed token.
#[instrument(skip_all, name = "nk.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, NkError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| {
            tracing::debug!(target: "nk.middleware.auth", "Missing or non-Bearer Authorization header");
            NkError::InvalidToken(TokenError::Malformed)
        })?;

    let identity: Identity = state.token_service.validate(token)?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
