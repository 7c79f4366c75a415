//! Project Repository — the backlog table, loaded once from CSV at startup.
//!
//! Read-only: scoring and charter results are never written back.

pub mod handlers;

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::charter::CharterFields;

/// Filter value that disables a filter.
pub const ALL: &str = "All";

/// One backlog row. Missing text columns load as empty strings; human-set score
/// columns load as `None` when blank or non-numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, rename = "type")]
    pub project_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub revenue_flow_impacted: String,
    #[serde(default)]
    pub audit_critical: String,
    #[serde(default)]
    pub systems_touched: String,
    #[serde(default)]
    pub pain_points: String,
    #[serde(default, deserialize_with = "lenient_int")]
    pub bi: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub risk: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub align: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub urgency: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub complexity: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub cost: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub priority_score: Option<i64>,
}

impl Project {
    pub fn charter_fields(&self) -> CharterFields {
        CharterFields {
            name: self.name.clone(),
            project_type: self.project_type.clone(),
            pain_points: self.pain_points.clone(),
            systems_touched: self.systems_touched.clone(),
            revenue_flow_impacted: self.revenue_flow_impacted.clone(),
            audit_critical: self.audit_critical.clone(),
        }
    }
}

/// Numeric cell coercion: integers, or integral-valued decimals ("4.0"); anything else is `None`.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let cell: Option<String> = Option::deserialize(deserializer)?;
    Ok(cell.and_then(|raw| {
        let raw = raw.trim();
        raw.parse::<i64>().ok().or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        })
    }))
}

/// Exact-match backlog filters. `None` or `"All"` means "do not filter".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilter {
    #[serde(rename = "type")]
    pub project_type: Option<String>,
    #[serde(rename = "flow")]
    pub revenue_flow: Option<String>,
    #[serde(rename = "audit")]
    pub audit_critical: Option<String>,
}

impl ProjectFilter {
    fn matches(&self, project: &Project) -> bool {
        accepts(&self.project_type, &project.project_type)
            && accepts(&self.revenue_flow, &project.revenue_flow_impacted)
            && accepts(&self.audit_critical, &project.audit_critical)
    }
}

fn accepts(wanted: &Option<String>, actual: &str) -> bool {
    match wanted.as_deref() {
        None | Some(ALL) => true,
        Some(value) => value == actual,
    }
}

/// Choices offered by the dashboard sidebar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub types: Vec<String>,
    pub revenue_flows: Vec<String>,
    pub audit: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectRepository {
    projects: Vec<Project>,
}

impl ProjectRepository {
    pub fn new(projects: Vec<Project>) -> Self {
        Self { projects }
    }

    /// Loads the backlog CSV. A missing file or an unreadable row is a startup error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_path(path)
            .with_context(|| format!("Failed to open projects file {}", path.display()))?;

        let projects = reader
            .deserialize::<Project>()
            .enumerate()
            .map(|(idx, row)| {
                row.with_context(|| {
                    format!("Invalid project row {} in {}", idx + 1, path.display())
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!("Loaded {} projects from {}", projects.len(), path.display());
        Ok(Self::new(projects))
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Applies the filter and sorts by human-set `priority_score`, highest first.
    /// Projects without a score go last; ties keep file order.
    pub fn filter(&self, filter: &ProjectFilter) -> Vec<&Project> {
        let mut matched: Vec<&Project> =
            self.projects.iter().filter(|p| filter.matches(p)).collect();
        matched.sort_by(|a, b| match (a.priority_score, b.priority_score) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        matched
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            types: self.distinct(|p| p.project_type.as_str()),
            revenue_flows: self.distinct(|p| p.revenue_flow_impacted.as_str()),
            audit: vec!["Yes".to_string(), "No".to_string()],
        }
    }

    /// Sorted distinct non-blank values of one column.
    fn distinct(&self, column: fn(&Project) -> &str) -> Vec<String> {
        self.projects
            .iter()
            .map(column)
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
