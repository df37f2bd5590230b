//! Text parameter extraction
//!
//! Parses `key = value` (or `key: value`) pairs out of free material text,
//! one pair per line or separated by `;`. The result is loosely typed and
//! meant to be fed to `params::normalize_fields`.

use regex::Regex;
use serde_json::{Map, Value};

/// Extract raw parameter fields from material text
///
/// Never fails: lines without a separator are ignored, and later keys
/// override earlier ones.
pub fn extract_parameters(text: &str) -> Map<String, Value> {
    let mut fields = Map::new();

    for segment in text.lines().flat_map(|line| line.split(';')) {
        let segment = segment.trim();
        if segment.is_empty() || segment.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = split_pair(segment) {
            let key = canonical_key(key);
            if key.is_empty() {
                continue;
            }
            fields.insert(key, parse_value(value));
        }
    }

    fields
}

/// Split on the first `=`, falling back to the first `:`
fn split_pair(segment: &str) -> Option<(&str, &str)> {
    segment
        .split_once('=')
        .or_else(|| segment.split_once(':'))
}

fn canonical_key(key: &str) -> String {
    let key = key.trim().to_lowercase().replace(['-', ' '], "_");
    let canonical = match key.as_str() {
        "3d" | "use3d" | "is_3d" => "use_3d",
        "ymin" => "y_min",
        "ymax" => "y_max",
        "truezero" | "baseline" => "true_zero",
        "chart" | "chart_type" => "type",
        "dual" | "dualaxis" => "dual_axis",
        "legend" => "legend_mismatch",
        "palette" => "palette_misleading",
        "window" => "x_window",
        "full" | "range" => "x_full",
        other => other,
    };
    canonical.to_string()
}

fn parse_value(raw: &str) -> Value {
    let raw = raw.trim();

    if let Some(flag) = parse_flag(raw) {
        return Value::Bool(flag);
    }
    if let Some(number) = raw.parse::<f64>().ok().filter(|v| v.is_finite()) {
        return Value::from(number);
    }
    if let Some([start, end]) = parse_range(raw) {
        return Value::Array(vec![Value::from(start), Value::from(end)]);
    }

    Value::String(raw.to_string())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse `[a, b]`, `a-b`, `a..b` or `a to b` into a numeric pair
fn parse_range(raw: &str) -> Option<[f64; 2]> {
    static RANGE_RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let range_re = RANGE_RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\[?\s*(-?\d+(?:\.\d+)?)\s*(?:,|\.\.|-|–|to)\s*(-?\d+(?:\.\d+)?)\s*\]?$",
        )
        .expect("range pattern is a valid regex")
    });

    let caps = range_re.captures(raw)?;
    let start = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let end = caps.get(2)?.as_str().parse::<f64>().ok()?;
    Some([start, end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::normalize_fields;
    use serde_json::json;

    #[test]
    fn test_extract_basic_pairs() {
        let fields = extract_parameters("y_min = 20\ny_max = 100\nuse_3d = true");
        assert_eq!(fields.get("y_min"), Some(&json!(20.0)));
        assert_eq!(fields.get("y_max"), Some(&json!(100.0)));
        assert_eq!(fields.get("use_3d"), Some(&json!(true)));
    }

    #[test]
    fn test_extract_ranges() {
        let fields = extract_parameters(
            "x_full = [2018, 2024]; x_window = 2022-2024\nwindow: 2020 to 2024",
        );
        assert_eq!(fields.get("x_full"), Some(&json!([2018.0, 2024.0])));
        assert_eq!(fields.get("x_window"), Some(&json!([2020.0, 2024.0])));
    }

    #[test]
    fn test_extract_dotted_and_negative_range() {
        assert_eq!(parse_range("-5..5"), Some([-5.0, 5.0]));
        assert_eq!(parse_range("[1.5 , 2.5]"), Some([1.5, 2.5]));
        assert_eq!(parse_range("2020"), None);
        assert_eq!(parse_range("soon"), None);
    }

    #[test]
    fn test_skips_comments_and_noise() {
        let fields = extract_parameters("# misleading chart\n\nSales rose sharply\n = 4\ndual = yes");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("dual_axis"), Some(&json!(true)));
    }

    #[test]
    fn test_key_aliases_and_case() {
        let fields = extract_parameters("Y-Min: 15\n3D: on\nChart Type = line");
        assert_eq!(fields.get("y_min"), Some(&json!(15.0)));
        assert_eq!(fields.get("use_3d"), Some(&json!(true)));
        assert_eq!(fields.get("type"), Some(&json!("line")));
    }

    #[test]
    fn test_later_keys_override() {
        let fields = extract_parameters("y_min = 10; y_min = 30");
        assert_eq!(fields.get("y_min"), Some(&json!(30.0)));
    }

    #[test]
    fn test_unparseable_value_kept_as_string() {
        let fields = extract_parameters("y_min = lots");
        assert_eq!(fields.get("y_min"), Some(&json!("lots")));
        assert_eq!(normalize_fields(&fields).y_min, 0.0);
    }

    #[test]
    fn test_extract_then_normalize() {
        let p = normalize_fields(&extract_parameters(
            "y_min = 20\nuse_3d = yes\nside_ratio = 0.3\nx_window = 2022-2024",
        ));
        assert_eq!(p.y_min, 20.0);
        assert!(p.use_3d);
        assert_eq!(p.side_ratio, 0.3);
        assert_eq!(p.x_full, [2018.0, 2024.0]);
        assert_eq!(p.x_window, [2022.0, 2024.0]);
    }
}
