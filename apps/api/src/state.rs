use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::ModelClient;
use crate::projects::ProjectRepository;

/// Shared application state injected into all route handlers via Axum extractors.
/// Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<ProjectRepository>,
    /// The model client, or the notice explaining why scoring is disabled.
    pub llm: Result<ModelClient, String>,
    pub config: Config,
}

impl AppState {
    /// The model client for AI endpoints; `ScoringDisabled` when configuration is missing.
    pub fn model_client(&self) -> Result<&ModelClient, AppError> {
        self.llm
            .as_ref()
            .map_err(|notice| AppError::ScoringDisabled(notice.clone()))
    }
}
