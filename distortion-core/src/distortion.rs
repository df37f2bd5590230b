//! Distortion error model
//!
//! Global invariants enforced:
//! - Every sub-error and the total lie in [0, 1]
//! - Deterministic: identical parameters yield identical estimates, explain lines included
//! - Division guarded by an epsilon floor; degenerate ranges clamp instead of failing

use crate::params::ChartParameters;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WEIGHT_ZERO: f64 = 0.35;
pub const DEFAULT_WEIGHT_THREE_D: f64 = 0.25;
pub const DEFAULT_WEIGHT_CLIP: f64 = 0.25;
pub const DEFAULT_WEIGHT_DUAL: f64 = 0.15;

/// Perceived-area exaggeration contributed by one unit of 3D depth ratio
pub const DEFAULT_DEPTH_COEFFICIENT: f64 = 0.3;
pub const DEFAULT_DUAL_AXIS_PENALTY: f64 = 0.3;
/// Dual-axis penalty when the legend or palette is also misleading
pub const DEFAULT_DUAL_AXIS_PENALTY_WITH_BAD_CUES: f64 = 0.5;

/// Maximum credit for a fully corrected chart
pub const MAX_POINTS: u32 = 20;

/// Floor applied to every denominator
pub const EPSILON: f64 = 1e-6;

/// Relative severity of each distortion category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistortionWeights {
    pub zero: f64,
    pub three_d: f64,
    pub clip: f64,
    pub dual: f64,
}

impl Default for DistortionWeights {
    fn default() -> Self {
        DistortionWeights {
            zero: DEFAULT_WEIGHT_ZERO,
            three_d: DEFAULT_WEIGHT_THREE_D,
            clip: DEFAULT_WEIGHT_CLIP,
            dual: DEFAULT_WEIGHT_DUAL,
        }
    }
}

impl DistortionWeights {
    pub fn sum(&self) -> f64 {
        self.zero + self.three_d + self.clip + self.dual
    }
}

/// Tunable policy constants for the error model and improvement scoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistortionPolicy {
    pub weights: DistortionWeights,
    pub depth_coefficient: f64,
    pub dual_axis_penalty: f64,
    pub dual_axis_penalty_with_bad_cues: f64,
    pub max_points: u32,
    pub epsilon: f64,
}

impl Default for DistortionPolicy {
    fn default() -> Self {
        DistortionPolicy {
            weights: DistortionWeights::default(),
            depth_coefficient: DEFAULT_DEPTH_COEFFICIENT,
            dual_axis_penalty: DEFAULT_DUAL_AXIS_PENALTY,
            dual_axis_penalty_with_bad_cues: DEFAULT_DUAL_AXIS_PENALTY_WITH_BAD_CUES,
            max_points: MAX_POINTS,
            epsilon: EPSILON,
        }
    }
}

/// Sub-errors, weighted total and diagnostic lines for one chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorEstimate {
    pub zero: f64,
    pub three_d: f64,
    pub clip: f64,
    pub dual: f64,
    pub total: f64,
    pub explain: Vec<String>,
}

/// Distortion band classification of a total error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistortionBand {
    Minimal,
    Mild,
    Moderate,
    Severe,
}

impl DistortionBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistortionBand::Minimal => "minimal",
            DistortionBand::Mild => "mild",
            DistortionBand::Moderate => "moderate",
            DistortionBand::Severe => "severe",
        }
    }
}

/// Configurable distortion band thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandThresholds {
    pub mild: f64,
    pub moderate: f64,
    pub severe: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        BandThresholds {
            mild: 0.1,
            moderate: 0.25,
            severe: 0.5,
        }
    }
}

/// Clamp to [0, 1]; NaN maps to 0
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Fraction of the true value range hidden below the displayed floor
///
/// The range saturates at `f64::MAX` so huge finite bounds never overflow to infinity.
pub fn zero_baseline_error(p: &ChartParameters, policy: &DistortionPolicy) -> f64 {
    let range = (p.y_max - p.true_zero).clamp(policy.epsilon, f64::MAX);
    clamp_unit(p.y_min / range)
}

/// Perceived-area exaggeration from pseudo-3D depth
pub fn three_d_error(p: &ChartParameters, policy: &DistortionPolicy) -> f64 {
    if p.use_3d {
        clamp_unit(p.side_ratio * policy.depth_coefficient)
    } else {
        0.0
    }
}

/// Share of the full data span retained by the displayed window
pub fn window_coverage(p: &ChartParameters, policy: &DistortionPolicy) -> f64 {
    // Spans saturate at f64::MAX; inf / inf would otherwise read as zero coverage
    let window_span = p.window_span().clamp(0.0, f64::MAX);
    let full_span = p.full_span().clamp(policy.epsilon, f64::MAX);
    clamp_unit(window_span / full_span)
}

/// Trend context hidden by a narrowed time window
pub fn clip_error(p: &ChartParameters, policy: &DistortionPolicy) -> f64 {
    clamp_unit(1.0 - window_coverage(p, policy))
}

/// Fixed categorical penalty for independently scaled axes
pub fn dual_axis_error(p: &ChartParameters, policy: &DistortionPolicy) -> f64 {
    if !p.dual_axis {
        0.0
    } else if p.palette_misleading || p.legend_mismatch {
        clamp_unit(policy.dual_axis_penalty_with_bad_cues)
    } else {
        clamp_unit(policy.dual_axis_penalty)
    }
}

/// Weighted total of the four sub-errors
///
/// Formula (default weights):
/// total = 0.35 * zero + 0.25 * three_d + 0.25 * clip + 0.15 * dual
pub fn weighted_total(
    zero: f64,
    three_d: f64,
    clip: f64,
    dual: f64,
    weights: &DistortionWeights,
) -> f64 {
    clamp_unit(
        weights.zero * zero + weights.three_d * three_d + weights.clip * clip + weights.dual * dual,
    )
}

/// Estimate distortion error with the default policy
pub fn estimate_error(p: &ChartParameters) -> ErrorEstimate {
    estimate_error_with_policy(p, &DistortionPolicy::default())
}

/// Estimate distortion error with a custom policy
pub fn estimate_error_with_policy(p: &ChartParameters, policy: &DistortionPolicy) -> ErrorEstimate {
    let zero = zero_baseline_error(p, policy);
    let three_d = three_d_error(p, policy);
    let coverage = window_coverage(p, policy);
    let clip = clip_error(p, policy);
    let dual = dual_axis_error(p, policy);
    let total = weighted_total(zero, three_d, clip, dual, &policy.weights);

    let explain = vec![
        format!(
            "zero-baseline error {:.3}: y_min={}, y_max={}, true_zero={}",
            zero, p.y_min, p.y_max, p.true_zero
        ),
        format!(
            "3d error {:.3}: use_3d={}, side_ratio={}, k={}",
            three_d, p.use_3d, p.side_ratio, policy.depth_coefficient
        ),
        format!(
            "window-clip error {:.3}: window=[{}, {}], full=[{}, {}], coverage={:.3}",
            clip, p.x_window[0], p.x_window[1], p.x_full[0], p.x_full[1], coverage
        ),
        format!(
            "dual-axis error {:.3}: dual_axis={}, palette_misleading={}, legend_mismatch={}",
            dual, p.dual_axis, p.palette_misleading, p.legend_mismatch
        ),
    ];

    ErrorEstimate {
        zero,
        three_d,
        clip,
        dual,
        total,
        explain,
    }
}

/// Assign distortion band with default thresholds
pub fn assign_band(total: f64) -> DistortionBand {
    assign_band_with_thresholds(total, &BandThresholds::default())
}

/// Assign distortion band with custom thresholds
pub fn assign_band_with_thresholds(total: f64, thresholds: &BandThresholds) -> DistortionBand {
    if total < thresholds.mild {
        DistortionBand::Minimal
    } else if total < thresholds.moderate {
        DistortionBand::Mild
    } else if total < thresholds.severe {
        DistortionBand::Moderate
    } else {
        DistortionBand::Severe
    }
}
