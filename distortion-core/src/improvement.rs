//! Improvement scoring between a before/after chart pair
//!
//! Global invariants enforced:
//! - `delta` lies in [0, 1]; a regression scores 0, never a negative value
//! - Identical before/after parameters score exactly 0
//!
//! When the original chart is already near-perfect (total close to 0) the
//! epsilon-guarded denominator leaves nothing to eliminate, so `delta` is 0:
//! no further credit is possible. This is not an error.

use crate::distortion::{clamp_unit, estimate_error_with_policy, DistortionPolicy, ErrorEstimate};
use crate::params::ChartParameters;
use serde::{Deserialize, Serialize};

/// Fraction of distortion eliminated by a correction, with awarded points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorDrop {
    pub delta: f64,
    pub percent: f64,
    pub points: u32,
    pub max_points: u32,
    pub total_before: f64,
    pub total_after: f64,
    pub explain: Vec<String>,
}

/// Compute the error drop with the default policy
pub fn compute_error_drop(before: &ChartParameters, after: &ChartParameters) -> ErrorDrop {
    compute_error_drop_with_policy(before, after, &DistortionPolicy::default())
}

/// Compute the error drop with a custom policy
pub fn compute_error_drop_with_policy(
    before: &ChartParameters,
    after: &ChartParameters,
    policy: &DistortionPolicy,
) -> ErrorDrop {
    let estimate_before = estimate_error_with_policy(before, policy);
    let estimate_after = estimate_error_with_policy(after, policy);
    drop_between(&estimate_before, &estimate_after, policy)
}

/// Derive the error drop from two existing estimates
pub fn drop_between(
    before: &ErrorEstimate,
    after: &ErrorEstimate,
    policy: &DistortionPolicy,
) -> ErrorDrop {
    let delta = clamp_unit((before.total - after.total) / before.total.max(policy.epsilon));
    let percent = delta * 100.0;
    let points = award_points(delta, policy.max_points);

    let mut explain = Vec::with_capacity(1 + before.explain.len() + after.explain.len());
    explain.push(format!(
        "error drop {:.1}%: total {:.3} -> {:.3}, {}/{} points",
        percent, before.total, after.total, points, policy.max_points
    ));
    explain.extend(before.explain.iter().map(|line| format!("before: {}", line)));
    explain.extend(after.explain.iter().map(|line| format!("after: {}", line)));

    ErrorDrop {
        delta,
        percent,
        points,
        max_points: policy.max_points,
        total_before: before.total,
        total_after: after.total,
        explain,
    }
}

/// Points for a given delta, rounded to the nearest whole point
fn award_points(delta: f64, max_points: u32) -> u32 {
    (clamp_unit(delta) * f64::from(max_points)).round() as u32
}
