//! Axum route handlers for the AI scoring API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::scoring::{score_project, ScoreResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub description: String,
    /// Optional; `null` or absent means no systems listed.
    pub systems: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectScoreRequest {
    pub project_id: i64,
    pub description_override: Option<String>,
    pub systems_override: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScoringStatusResponse {
    pub scoring_enabled: bool,
    pub provider: &'static str,
    pub model: String,
    pub notice: Option<String>,
}

/// GET /api/v1/ai/status
///
/// Lets the dashboard show the "scoring disabled" notice up front.
pub async fn handle_scoring_status(State(state): State<AppState>) -> Json<ScoringStatusResponse> {
    Json(ScoringStatusResponse {
        scoring_enabled: state.llm.is_ok(),
        provider: state.config.provider.as_str(),
        model: state.config.model().to_string(),
        notice: state.llm.as_ref().err().cloned(),
    })
}

/// POST /api/v1/ai/score_project
///
/// Scores free-text project details. Decision support only; nothing is persisted.
pub async fn handle_score_project(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResult>, AppError> {
    let llm = state.model_client()?;
    let systems = request.systems.as_deref().unwrap_or_default();
    let result = score_project(llm, &request.description, systems).await?;
    Ok(Json(result))
}

/// POST /api/v1/ai/score_project_by_id
///
/// Scores a backlog project. Empty overrides fall back to the stored pain points / systems.
pub async fn handle_score_project_by_id(
    State(state): State<AppState>,
    Json(request): Json<ProjectScoreRequest>,
) -> Result<Json<ScoreResult>, AppError> {
    let project = state
        .repo
        .get(request.project_id)
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    let llm = state.model_client()?;

    let description = non_empty_or(request.description_override.as_deref(), &project.pain_points);
    let systems = non_empty_or(request.systems_override.as_deref(), &project.systems_touched);

    let result = score_project(llm, description, systems).await?;
    Ok(Json(result))
}

fn non_empty_or<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    value.filter(|v| !v.is_empty()).unwrap_or(fallback)
}
