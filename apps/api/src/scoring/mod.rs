//! AI Priority Scoring — model call → normalization → priority calculation.
//!
//! All model calls go through `llm_client`. Results are decision support only
//! and are never written back to the project table.

pub mod handlers;
pub mod normalizer;
pub mod priority;

use serde::Serialize;
use tracing::{debug, info};

use crate::llm_client::{LlmError, ModelClient};
use priority::compute_priority;

/// The six 1–5 dimensions. The range is intended, not enforced.
/// Serialized with the short names the model is asked to return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubScores {
    #[serde(rename = "bi")]
    pub business_impact: i32,
    pub risk: i32,
    #[serde(rename = "align")]
    pub alignment: i32,
    pub urgency: i32,
    pub complexity: i32,
    pub cost: i32,
}

/// A normalized scoring suggestion.
///
/// `priority_score` is always derived from `scores` by the only constructor;
/// it is never taken from the model and never reconciled with `recommended_priority`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    #[serde(flatten)]
    scores: SubScores,
    priority_score: i64,
    pub rationale: String,
    pub lenses: Vec<String>,
    /// Model-suggested rank (1 = highest). Unvalidated.
    pub recommended_priority: i64,
}

impl ScoreResult {
    pub fn new(
        scores: SubScores,
        rationale: String,
        lenses: Vec<String>,
        recommended_priority: i64,
    ) -> Self {
        Self {
            priority_score: compute_priority(&scores),
            scores,
            rationale,
            lenses,
            recommended_priority,
        }
    }

    pub fn scores(&self) -> &SubScores {
        &self.scores
    }

    pub fn priority_score(&self) -> i64 {
        self.priority_score
    }
}

/// Full scoring pipeline for one request. Each call is independent: no caching,
/// no de-duplication, and repeated calls may return different suggestions.
pub async fn score_project(
    llm: &ModelClient,
    description: &str,
    systems: &str,
) -> Result<ScoreResult, LlmError> {
    let raw = llm.request_scoring(description, systems).await?;
    let result = normalizer::normalize_score(raw)?;

    debug!("Normalized sub-scores: {:?}", result.scores());
    info!(
        "Scored project: priority_score={}, recommended_priority={}, lenses={}",
        result.priority_score(),
        result.recommended_priority,
        result.lenses.len()
    );

    Ok(result)
}
