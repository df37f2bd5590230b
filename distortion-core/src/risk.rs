//! Qualitative risk notes derived directly from chart parameters
//!
//! Rules are evaluated in a fixed order so note sequences are reproducible.
//! The explainer is independent of the error model's numbers.

use crate::params::ChartParameters;
use serde::{Deserialize, Serialize};

/// A single triggered risk condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskNote {
    NonZeroBaseline,
    ThreeD,
    DualAxis,
    NarrowWindow,
    LegendMismatch,
    MisleadingPalette,
}

impl RiskNote {
    /// All notes, in evaluation order
    pub const ALL: [RiskNote; 6] = [
        RiskNote::NonZeroBaseline,
        RiskNote::ThreeD,
        RiskNote::DualAxis,
        RiskNote::NarrowWindow,
        RiskNote::LegendMismatch,
        RiskNote::MisleadingPalette,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            RiskNote::NonZeroBaseline => "non_zero_baseline",
            RiskNote::ThreeD => "three_d",
            RiskNote::DualAxis => "dual_axis",
            RiskNote::NarrowWindow => "narrow_window",
            RiskNote::LegendMismatch => "legend_mismatch",
            RiskNote::MisleadingPalette => "misleading_palette",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RiskNote::NonZeroBaseline => {
                "Value axis does not start at zero, so differences between bars look larger than they are."
            }
            RiskNote::ThreeD => {
                "3D rendering inflates the visible area of each bar and makes values harder to compare."
            }
            RiskNote::DualAxis => {
                "Two independently scaled axes can suggest a relationship that the units do not support."
            }
            RiskNote::NarrowWindow => {
                "Displayed time window is narrower than the available data and may hide the longer trend."
            }
            RiskNote::LegendMismatch => "Legend labels do not match the plotted series.",
            RiskNote::MisleadingPalette => {
                "Color mapping implies a meaning or ranking the data does not carry."
            }
        }
    }

    /// Whether this condition holds for the given parameters
    pub fn applies(&self, p: &ChartParameters) -> bool {
        match self {
            RiskNote::NonZeroBaseline => p.y_min > 0.0,
            RiskNote::ThreeD => p.use_3d,
            RiskNote::DualAxis => p.dual_axis,
            RiskNote::NarrowWindow => p.window_span() < p.full_span(),
            RiskNote::LegendMismatch => p.legend_mismatch,
            RiskNote::MisleadingPalette => p.palette_misleading,
        }
    }
}

/// Lazily evaluated, restartable sequence of triggered notes
#[derive(Debug, Clone, Copy)]
pub struct RiskNotes<'a> {
    params: &'a ChartParameters,
}

impl<'a> RiskNotes<'a> {
    pub fn new(params: &'a ChartParameters) -> Self {
        RiskNotes { params }
    }

    /// Start a fresh pass over the triggered notes
    pub fn iter(&self) -> impl Iterator<Item = RiskNote> + 'a {
        let params = self.params;
        RiskNote::ALL
            .into_iter()
            .filter(move |note| note.applies(params))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn messages(&self) -> Vec<String> {
        self.iter().map(|note| note.message().to_string()).collect()
    }
}

impl<'a> IntoIterator for RiskNotes<'a> {
    type Item = RiskNote;
    type IntoIter = Box<dyn Iterator<Item = RiskNote> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Triggered risk notes for a chart
pub fn risk_notes(p: &ChartParameters) -> RiskNotes<'_> {
    RiskNotes::new(p)
}

/// Human-readable risk explanations, in rule order
///
/// Empty when nothing triggers; callers show their own placeholder.
pub fn explain_risks(p: &ChartParameters) -> Vec<String> {
    risk_notes(p).messages()
}
