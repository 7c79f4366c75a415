//! Priority Calculator — the fixed linear aggregate over the six sub-scores.

use crate::scoring::SubScores;

/// Midpoint complement on the 1–5 scale. Complexity and cost are penalties,
/// so `6 - x` turns them into "higher is more attractive" like the other four.
const PENALTY_PIVOT: i64 = 6;

/// `bi + risk + align + urgency + (6 - complexity) + (6 - cost)`.
///
/// No clamping: out-of-range and zero-default inputs flow through literally.
/// Computed in `i64`, so every `i32` input is representable and the function is total.
pub fn compute_priority(scores: &SubScores) -> i64 {
    i64::from(scores.business_impact)
        + i64::from(scores.risk)
        + i64::from(scores.alignment)
        + i64::from(scores.urgency)
        + (PENALTY_PIVOT - i64::from(scores.complexity))
        + (PENALTY_PIVOT - i64::from(scores.cost))
}
