use crate::errors::NkError;
use crate::models::{Identity, Note, NoteId, NoteRequest};
use crate::observability::hash_for_correlation;
use crate::routes::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Create a note.
///
/// POST /api/v1/notes
#[instrument(skip_all, fields(user = %hash_for_correlation(&identity.username)))]
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    body: Bytes,
) -> Result<(StatusCode, Json<Note>), NkError> {
    let request: NoteRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(target: "nk.handlers.notes", error = %e, "Invalid note request body");
        NkError::Validation("Invalid request body".to_string())
    })?;
    request.validate()?;

    let note = state.notes.create(&request.title, &request.content).await?;

    Ok((StatusCode::CREATED, Json(note)))
}

/// List all notes, newest first.
///
/// GET /api/v1/notes
pub async fn list_notes(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Note>>, NkError> {
    Ok(Json(state.notes.get_all().await?))
}

/// Fetch one note.
///
/// GET /api/v1/notes/:id
///
/// A non-numeric id is a validation error, reported in the usual error body.
pub async fn get_note(
    State(state): State<Arc<AppState>>,
    id: Result<Path<NoteId>, PathRejection>,
) -> Result<Json<Note>, NkError> {
    let Path(id) = id.map_err(|e| {
        tracing::debug!(target: "nk.handlers.notes", error = %e, "Invalid note id in path");
        NkError::Validation("Invalid note id".to_string())
    })?;

    Ok(Json(state.notes.get_by_id(id).await?))
}
