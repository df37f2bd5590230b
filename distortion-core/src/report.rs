//! Exercise reporting and output generation
//!
//! Global invariants enforced:
//! - Deterministic field and line ordering
//! - Byte-for-byte identical output across runs

use crate::distortion::{DistortionBand, ErrorEstimate};
use crate::fixes::FixToggles;
use crate::improvement::ErrorDrop;
use crate::params::ChartParameters;
use serde::{Deserialize, Serialize};

/// Placeholder shown when no risk note triggers
pub const NO_RISK_PLACEHOLDER: &str = "No obvious risk detected.";

/// Complete scoring report for one before/after exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExerciseReport {
    pub before: ChartParameters,
    pub after: ChartParameters,
    pub fixes: FixToggles,
    pub before_error: ErrorEstimate,
    pub after_error: ErrorEstimate,
    pub before_band: DistortionBand,
    pub after_band: DistortionBand,
    pub drop: ErrorDrop,
    pub risks_before: Vec<String>,
    pub risks_after: Vec<String>,
}

/// Names of the toggles that are set, in declaration order
pub fn applied_fix_names(fixes: &FixToggles) -> Vec<&'static str> {
    [
        (fixes.zero, "zero"),
        (fixes.no3d, "no3d"),
        (fixes.single_axis, "single_axis"),
        (fixes.extend, "extend"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect()
}

/// Render a risk list, substituting the placeholder when empty
pub fn render_risks(risks: &[String]) -> String {
    if risks.is_empty() {
        return format!("  - {}\n", NO_RISK_PLACEHOLDER);
    }
    risks.iter().map(|r| format!("  - {}\n", r)).collect()
}

/// Render a report as text output
pub fn render_text(report: &ExerciseReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("{:<12} {:<10} {}\n", "DISTORTION", "BEFORE", "AFTER"));
    let rows = [
        ("zero", report.before_error.zero, report.after_error.zero),
        ("3d", report.before_error.three_d, report.after_error.three_d),
        ("clip", report.before_error.clip, report.after_error.clip),
        ("dual", report.before_error.dual, report.after_error.dual),
        ("total", report.before_error.total, report.after_error.total),
    ];
    for (name, before, after) in rows {
        output.push_str(&format!("{:<12} {:<10.3} {:.3}\n", name, before, after));
    }
    output.push_str(&format!(
        "{:<12} {:<10} {}\n",
        "band",
        report.before_band.as_str(),
        report.after_band.as_str()
    ));
    output.push('\n');

    let fixes = applied_fix_names(&report.fixes);
    if fixes.is_empty() {
        output.push_str("Fixes: none\n");
    } else {
        output.push_str(&format!("Fixes: {}\n", fixes.join(", ")));
    }
    output.push_str(&format!(
        "Error drop: {:.1}% ({}/{} points)\n",
        report.drop.percent, report.drop.points, report.drop.max_points
    ));
    output.push('\n');

    output.push_str("Risks before:\n");
    output.push_str(&render_risks(&report.risks_before));
    output.push_str("Risks after:\n");
    output.push_str(&render_risks(&report.risks_after));

    output
}

/// Render a report as JSON output
pub fn render_json(report: &ExerciseReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applied_fix_names() {
        assert!(applied_fix_names(&FixToggles::none()).is_empty());
        assert_eq!(
            applied_fix_names(&FixToggles::all()),
            vec!["zero", "no3d", "single_axis", "extend"]
        );
        let only_extend = FixToggles {
            extend: true,
            ..FixToggles::none()
        };
        assert_eq!(applied_fix_names(&only_extend), vec!["extend"]);
    }

    #[test]
    fn test_render_risks_placeholder() {
        assert_eq!(render_risks(&[]), "  - No obvious risk detected.\n");
        assert_eq!(
            render_risks(&["a".to_string(), "b".to_string()]),
            "  - a\n  - b\n"
        );
    }
}
