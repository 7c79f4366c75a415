// Prompt constants and prompt-building utilities for scoring and charter calls.
// Inputs are embedded verbatim; the JSON transport handles escaping.

use crate::charter::CharterFields;

/// System prompt for scoring. Enforces JSON-only output.
pub const SCORE_SYSTEM: &str = "You are a senior Finance Transformation PMO helping score \
    revenue-impacting projects. You ALWAYS respond in valid JSON.";

/// The six scoring dimensions and their qualitative triggers. Stated once, shared by every call.
pub const SCORING_RUBRIC: &str = "\
Score this project from 1-5 in six areas:
- bi: Business Impact
- risk: Risk Exposure
- align: Strategic Alignment
- urgency: Time sensitivity
- complexity: Implementation Complexity
- cost: Effort/Cost

Rules of thumb:
- High revenue, DSO, or margin impact => bi 4-5.
- Regulatory / ASC 606 / tax risk => risk 4-5.
- Data foundation and scaling enablers => align 4-5.
- Needs to land this or next quarter => urgency 4-5.
- Multi-system or heavy migration => complexity 4-5.
- Requires significant Eng + PM + testing => cost 4-5.

Also return:
- rationale: short explanation string
- lenses: list of transformation lenses (e.g. [\"Revenue Leakage Prevention\", \"Audit & Compliance\"])
- recommended_priority: integer 1-5 (1 = highest priority)";

/// Scoring prompt template. Replace `{rubric}`, `{description}` and `{systems}` before sending.
pub const SCORE_PROMPT_TEMPLATE: &str = "{rubric}

Project description:
{description}

Systems touched:
{systems}

Respond ONLY with a JSON object, no extra text.";

/// System prompt for charter generation. Markdown, not JSON.
pub const CHARTER_SYSTEM: &str = "You are a senior Finance Transformation leader creating clear, \
    concise project charters for revenue-impacting initiatives.";

/// Charter prompt template. Every `{field}` placeholder is replaced before sending.
pub const CHARTER_PROMPT_TEMPLATE: &str = r#"Create a standardized project charter in clear Markdown for the following project.

Project Name: {name}
Project Type: {project_type}
Revenue Flow Impacted: {revenue_flow_impacted}
Audit Critical: {audit_critical}

Systems Touched:
{systems_touched}

Pain Points / Problem Description:
{pain_points}

The charter must use the following sections as Markdown headings:

# Project Charter - (use the project name in the title)

## 1. Problem Statement
- Summarize the core problem in 2-4 bullet points.

## 2. Objectives & Success Metrics
- List 3-5 concrete objectives.
- Include 3-5 example KPIs with directional targets (e.g. "Reduce revenue reclass volume by 40-60%").

## 3. Scope
- In-Scope: bullets.
- Out-of-Scope: bullets (call out what this project will NOT do).

## 4. Systems & Data Impact
- List the main systems and typical objects/tables impacted.
- Note any key data lineage considerations.

## 5. Risks, Dependencies & Assumptions
- Risks: bullets (especially if Audit Critical = Yes).
- Dependencies: bullets (e.g. other projects, teams, or data readiness).
- Assumptions: bullets.

## 6. Timeline & Phasing (High-Level)
- Phase 1: name + 1-2 bullets.
- Phase 2: name + 1-2 bullets.
- Phase 3: name + 1-2 bullets.

## 7. Stakeholders & RACI (Lite)
- List key roles (e.g. RevRec Lead, Billing PM, Data Engineering, FP&A).
- For each, indicate R/A/C/I in a simple text-friendly way (no tables required, a bullet list is fine).

Write in a professional but concise tone. Do NOT add any extra commentary outside of the Markdown charter."#;

/// Builds the scoring prompt. Substitution runs over the template only, so braces or
/// placeholder-looking text inside the inputs are left untouched.
pub fn build_score_prompt(description: &str, systems: &str) -> String {
    fill(
        SCORE_PROMPT_TEMPLATE,
        &[
            ("rubric", SCORING_RUBRIC),
            ("description", description),
            ("systems", systems),
        ],
    )
}

pub fn build_charter_prompt(fields: &CharterFields) -> String {
    fill(
        CHARTER_PROMPT_TEMPLATE,
        &[
            ("name", &fields.name),
            ("project_type", &fields.project_type),
            ("revenue_flow_impacted", &fields.revenue_flow_impacted),
            ("audit_critical", &fields.audit_critical),
            ("systems_touched", &fields.systems_touched),
            ("pain_points", &fields.pain_points),
        ],
    )
}

/// Single-pass `{key}` substitution. Unknown placeholders are kept literally.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match replacement {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
