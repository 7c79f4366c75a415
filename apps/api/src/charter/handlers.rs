//! Axum route handlers for charter generation.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::charter::{generate_charter, CharterFields, CharterResult};
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/v1/ai/project_charter
///
/// Generates a charter from caller-supplied fields. Not tied to a backlog project.
pub async fn handle_project_charter(
    State(state): State<AppState>,
    Json(fields): Json<CharterFields>,
) -> Result<Json<CharterResult>, AppError> {
    let llm = state.model_client()?;
    let charter = generate_charter(llm, &fields, None).await?;
    Ok(Json(charter))
}

/// POST /api/v1/projects/:id/charter
///
/// Generates a charter for a backlog project; the result carries the project id.
pub async fn handle_charter_for_project(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<CharterResult>, AppError> {
    let project = state
        .repo
        .get(project_id)
        .ok_or_else(|| AppError::NotFound(format!("Project {project_id} not found")))?;
    let llm = state.model_client()?;

    let charter = generate_charter(llm, &project.charter_fields(), Some(project.id)).await?;
    Ok(Json(charter))
}
