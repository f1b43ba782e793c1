use crate::models::NoteId;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Generic message returned for every token failure.
///
/// The specific [`TokenError`] kind is only logged and counted.
pub const INVALID_TOKEN_MESSAGE: &str = "The access token is invalid or expired";

/// Reasons a bearer token is rejected, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token has expired")]
    Expired,

    #[error("token algorithm is not supported")]
    Unsupported,
}

impl TokenError {
    /// Bounded label for metrics and logs.
    pub fn kind(self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::SignatureInvalid => "signature_invalid",
            TokenError::Expired => "expired",
            TokenError::Unsupported => "unsupported",
        }
    }
}

/// Crate-wide error.
///
/// `Clone` because a single load result is shared by every waiter of a
/// collapsed cache miss.
#[derive(Debug, Clone, Error)]
pub enum NkError {
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Note not found: {0}")]
    NotFound(NoteId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for NkError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            NkError::AuthenticationFailed | NkError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_FAILED",
                "Invalid username or password".to_string(),
            ),
            NkError::InvalidToken(_) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                INVALID_TOKEN_MESSAGE.to_string(),
            ),
            NkError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Note with id {id} not found"),
            ),
            NkError::Validation(reason) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                reason.clone(),
            ),
            NkError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "An internal storage error occurred".to_string(),
            ),
            NkError::Crypto(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CRYPTO_ERROR",
                "An internal cryptographic error occurred".to_string(),
            ),
            NkError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        // RFC 6750: 401 responses carry a Bearer challenge
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer realm=\"notekeeper\""),
            );
        }

        response
    }
}
