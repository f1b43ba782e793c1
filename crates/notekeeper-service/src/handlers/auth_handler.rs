use crate::errors::NkError;
use crate::models::{AuthRequest, AuthResponse};
use crate::routes::AppState;
use axum::{body::Bytes, extract::State, Json};
use std::sync::Arc;

/// Exchange a username and password for a bearer token.
///
/// POST /api/v1/auth
pub async fn handle_authenticate(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<AuthResponse>, NkError> {
    // Deserialize manually so a bad body is a 400 with our error shape
    let request: AuthRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(target: "nk.handlers.auth", error = %e, "Invalid authentication request body");
        NkError::Validation("Invalid request body".to_string())
    })?;

    let response = state
        .auth
        .authenticate(&request.username, &request.password)
        .await?;

    Ok(Json(response))
}
