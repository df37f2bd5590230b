//! Learner fix toggles and the before → after parameter transform

use crate::params::ChartParameters;
use serde::{Deserialize, Serialize};

/// Fix checkboxes chosen by the learner; absent fields read as unset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct FixToggles {
    /// Start the value axis at zero
    pub zero: bool,
    /// Drop the pseudo-3D rendering
    pub no3d: bool,
    /// Collapse to a single value axis
    #[serde(alias = "singleAxis")]
    pub single_axis: bool,
    /// Show the full time range
    pub extend: bool,
}

impl FixToggles {
    pub fn none() -> Self {
        FixToggles::default()
    }

    pub fn all() -> Self {
        FixToggles {
            zero: true,
            no3d: true,
            single_axis: true,
            extend: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.zero || self.no3d || self.single_axis || self.extend)
    }
}

/// Applied toggles together with the derived "after" parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixOutcome {
    pub fixes: FixToggles,
    pub after: ChartParameters,
}

/// Copy `before` and override each field whose toggle is set
///
/// A normalized record always carries `x_full`, so extending the window
/// never needs the hardcoded fallback range here.
pub fn apply_fixes(before: &ChartParameters, toggles: FixToggles) -> FixOutcome {
    let mut after = before.clone();

    if toggles.zero {
        after.y_min = 0.0;
    }
    if toggles.no3d {
        after.use_3d = false;
    }
    if toggles.single_axis {
        after.dual_axis = false;
    }
    if toggles.extend {
        after.x_window = before.x_full;
    }

    FixOutcome {
        fixes: toggles,
        after,
    }
}
