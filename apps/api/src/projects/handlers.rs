use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::projects::{FilterOptions, Project, ProjectFilter};
use crate::state::AppState;

#[derive(Serialize)]
pub struct BacklogResponse {
    pub projects: Vec<Project>,
    pub filtered_count: usize,
    pub total_count: usize,
}

/// GET /api/v1/projects
///
/// Filtered backlog sorted by human-set priority score.
pub async fn handle_list_projects(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> Json<BacklogResponse> {
    let projects: Vec<Project> = state.repo.filter(&filter).into_iter().cloned().collect();
    Json(BacklogResponse {
        filtered_count: projects.len(),
        total_count: state.repo.len(),
        projects,
    })
}

/// GET /api/v1/projects/filters
pub async fn handle_filter_options(State(state): State<AppState>) -> Json<FilterOptions> {
    Json(state.repo.filter_options())
}

/// GET /api/v1/projects/:id
pub async fn handle_get_project(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<Project>, AppError> {
    state
        .repo
        .get(project_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Project {project_id} not found")))
}
