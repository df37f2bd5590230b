//! Distortion core library - scoring misleading charts and the corrections made to them

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Scoring is a pure function of its explicit arguments
// - No global mutable state
// - No randomness, clocks, threads, or async
// - Every score is finite and clamped to its documented range
// - Identical input yields byte-for-byte identical output

pub mod config;
pub mod distortion;
pub mod extract;
pub mod fixes;
pub mod improvement;
pub mod params;
pub mod report;
pub mod risk;

pub use config::ResolvedConfig;
pub use distortion::{estimate_error, DistortionBand, DistortionPolicy, ErrorEstimate};
pub use extract::extract_parameters;
pub use fixes::{apply_fixes, FixOutcome, FixToggles};
pub use improvement::{compute_error_drop, ErrorDrop};
pub use params::{normalize, ChartParameters};
pub use report::{render_json, render_text, ExerciseReport};
pub use risk::{explain_risks, RiskNote};

use serde_json::Value;

/// Score an exercise from a loosely-typed parameter object
///
/// Normalizes once, then feeds the same record to the error model and the
/// risk explainer, derives the "after" record from `toggles`, and scores
/// the improvement between the two.
pub fn score_exercise(
    raw: &Value,
    toggles: FixToggles,
    config: &ResolvedConfig,
) -> ExerciseReport {
    score_parameters(normalize(raw), toggles, config)
}

/// Score an exercise from `key = value` material text
pub fn score_text(text: &str, toggles: FixToggles, config: &ResolvedConfig) -> ExerciseReport {
    score_parameters(
        params::normalize_fields(&extract_parameters(text)),
        toggles,
        config,
    )
}

/// Score an exercise from an already-normalized record
pub fn score_parameters(
    before: ChartParameters,
    toggles: FixToggles,
    config: &ResolvedConfig,
) -> ExerciseReport {
    let policy = &config.policy;
    let FixOutcome { fixes, after } = apply_fixes(&before, toggles);

    let before_error = distortion::estimate_error_with_policy(&before, policy);
    let after_error = distortion::estimate_error_with_policy(&after, policy);
    let drop = improvement::drop_between(&before_error, &after_error, policy);

    tracing::debug!(
        total_before = before_error.total,
        total_after = after_error.total,
        points = drop.points,
        "scored exercise"
    );

    ExerciseReport {
        before_band: distortion::assign_band_with_thresholds(before_error.total, &config.bands),
        after_band: distortion::assign_band_with_thresholds(after_error.total, &config.bands),
        risks_before: explain_risks(&before),
        risks_after: explain_risks(&after),
        before,
        after,
        fixes,
        before_error,
        after_error,
        drop,
    }
}
