//! Project Charter generation — markdown document from the six charter fields.

pub mod handlers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::llm_client::{LlmError, ModelClient};
use crate::scoring::normalizer::normalize_charter;

/// The fixed set of project attributes a charter is written from. Empty strings allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharterFields {
    pub name: String,
    pub project_type: String,
    pub pain_points: String,
    pub systems_touched: String,
    pub revenue_flow_impacted: String,
    pub audit_critical: String,
}

/// A generated charter. Carries the project it was generated for so callers
/// never show it against another project.
#[derive(Debug, Clone, Serialize)]
pub struct CharterResult {
    /// `None` when generated from ad-hoc fields rather than a repository project.
    pub project_id: Option<i64>,
    pub charter_markdown: String,
    pub generated_at: DateTime<Utc>,
}

/// Calls the model for a charter and passes the markdown through unmodified.
pub async fn generate_charter(
    llm: &ModelClient,
    fields: &CharterFields,
    project_id: Option<i64>,
) -> Result<CharterResult, LlmError> {
    let raw = llm.request_charter(fields).await?;
    let charter_markdown = normalize_charter(raw)?;

    info!(
        "Generated charter for '{}' ({} chars)",
        fields.name,
        charter_markdown.len()
    );

    Ok(CharterResult {
        project_id,
        charter_markdown,
        generated_at: Utc::now(),
    })
}
