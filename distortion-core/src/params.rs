//! Chart parameter record and normalization
//!
//! Global invariants enforced:
//! - `normalize` never fails; malformed or absent fields fall back to defaults
//! - `normalize(normalize(x)) == normalize(x)`
//! - Every numeric field of a normalized record is finite

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_CHART_TYPE: &str = "bar";
pub const DEFAULT_Y_MIN: f64 = 0.0;
pub const DEFAULT_TRUE_ZERO: f64 = 0.0;
pub const DEFAULT_Y_MAX: f64 = 100.0;
/// Depth fraction assumed for a 3D bar when none is given
pub const DEFAULT_SIDE_RATIO_3D: f64 = 0.2;
pub const DEFAULT_X_FULL: [f64; 2] = [2018.0, 2024.0];

/// Canonical chart parameter record consumed by every scoring component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChartParameters {
    /// Categorical chart label; carried but not scored
    #[serde(rename = "type")]
    pub chart_type: String,
    pub y_min: f64,
    pub true_zero: f64,
    pub y_max: f64,
    pub use_3d: bool,
    pub side_ratio: f64,
    pub x_full: [f64; 2],
    pub x_window: [f64; 2],
    pub dual_axis: bool,
    pub palette_misleading: bool,
    pub legend_mismatch: bool,
}

impl Default for ChartParameters {
    fn default() -> Self {
        normalize_fields(&Map::new())
    }
}

impl ChartParameters {
    /// Span of the full data range (end - start, unguarded)
    pub fn full_span(&self) -> f64 {
        self.x_full[1] - self.x_full[0]
    }

    /// Span of the displayed window (end - start, unguarded)
    pub fn window_span(&self) -> f64 {
        self.x_window[1] - self.x_window[0]
    }

    /// Loosely-typed form of this record, accepted back by `normalize`
    pub fn to_raw(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Normalize a loosely-typed parameter object
///
/// Anything other than a JSON object normalizes to the all-defaults record.
pub fn normalize(raw: &Value) -> ChartParameters {
    match raw {
        Value::Object(fields) => normalize_fields(fields),
        _ => normalize_fields(&Map::new()),
    }
}

/// Normalize a parameter map (as produced by the text extractor)
pub fn normalize_fields(fields: &Map<String, Value>) -> ChartParameters {
    let use_3d = is_truthy(fields.get("use_3d"));
    let x_full = coerce_pair(fields.get("x_full")).unwrap_or(DEFAULT_X_FULL);
    let x_window = coerce_pair(fields.get("x_window")).unwrap_or(x_full);
    let default_side_ratio = if use_3d { DEFAULT_SIDE_RATIO_3D } else { 0.0 };

    ChartParameters {
        chart_type: coerce_label(fields.get("type")),
        y_min: coerce_number(fields.get("y_min")).unwrap_or(DEFAULT_Y_MIN),
        true_zero: coerce_number(fields.get("true_zero")).unwrap_or(DEFAULT_TRUE_ZERO),
        y_max: coerce_number(fields.get("y_max")).unwrap_or(DEFAULT_Y_MAX),
        use_3d,
        side_ratio: coerce_number(fields.get("side_ratio")).unwrap_or(default_side_ratio),
        x_full,
        x_window,
        dual_axis: is_truthy(fields.get("dual_axis")),
        palette_misleading: is_truthy(fields.get("palette_misleading")),
        legend_mismatch: is_truthy(fields.get("legend_mismatch")),
    }
}

/// Coerce a value to a finite number
///
/// Numbers pass through, numeric strings are parsed. Booleans, null,
/// containers and non-finite results are rejected.
pub(crate) fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

/// Coerce a value to a two-element numeric sequence
fn coerce_pair(value: Option<&Value>) -> Option<[f64; 2]> {
    match value?.as_array()?.as_slice() {
        [start, end] => Some([coerce_number(Some(start))?, coerce_number(Some(end))?]),
        _ => None,
    }
}

fn coerce_label(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_CHART_TYPE)
        .to_string()
}

/// Truthiness of a loosely-typed value
///
/// `false`, `0`, `""`, null and absence are falsy; everything else is truthy.
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
