//! Configuration file support for distortion scoring
//!
//! Loads project-specific scoring policy from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.distortionrc.json` in project root
//! 3. `distortion.config.json` in project root
//! 4. `"distortion"` key in `package.json`
//!
//! All fields are optional. Missing fields fall back to the built-in policy constants.

use crate::distortion::{
    BandThresholds, DistortionPolicy, DistortionWeights, DEFAULT_DEPTH_COEFFICIENT,
    DEFAULT_DUAL_AXIS_PENALTY, DEFAULT_DUAL_AXIS_PENALTY_WITH_BAD_CUES, DEFAULT_WEIGHT_CLIP,
    DEFAULT_WEIGHT_DUAL, DEFAULT_WEIGHT_THREE_D, DEFAULT_WEIGHT_ZERO, EPSILON, MAX_POINTS,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tolerance when checking that weights sum to one
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Distortion scoring configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistortionConfig {
    /// Custom sub-error weights for the total
    #[serde(default)]
    pub weights: Option<WeightConfig>,

    /// Perceived-area coefficient per unit of 3D depth ratio (default: 0.3)
    #[serde(default)]
    pub depth_coefficient: Option<f64>,

    /// Dual-axis penalties
    #[serde(default)]
    pub dual_axis: Option<DualAxisConfig>,

    /// Maximum points for a full correction (default: 20)
    #[serde(default)]
    pub max_points: Option<u32>,

    /// Custom distortion band thresholds
    #[serde(default)]
    pub bands: Option<BandConfig>,
}

/// Custom sub-error weights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightConfig {
    /// Weight for zero-baseline truncation (default: 0.35)
    pub zero: Option<f64>,
    /// Weight for 3D distortion (default: 0.25)
    pub three_d: Option<f64>,
    /// Weight for window clipping (default: 0.25)
    pub clip: Option<f64>,
    /// Weight for dual axes (default: 0.15)
    pub dual: Option<f64>,
}

/// Dual-axis penalties
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DualAxisConfig {
    /// Penalty with clean legend and palette (default: 0.3)
    pub penalty: Option<f64>,
    /// Penalty when legend or palette is misleading (default: 0.5)
    pub penalty_with_bad_cues: Option<f64>,
}

/// Custom distortion band thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BandConfig {
    /// Total at which a chart becomes mildly distorted (default: 0.1)
    pub mild: Option<f64>,
    /// Total at which a chart becomes moderately distorted (default: 0.25)
    pub moderate: Option<f64>,
    /// Total at which a chart becomes severely distorted (default: 0.5)
    pub severe: Option<f64>,
}

/// Resolved configuration ready for scoring
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub policy: DistortionPolicy,
    pub bands: BandThresholds,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl DistortionConfig {
    fn resolved_weights(&self) -> DistortionWeights {
        match &self.weights {
            Some(w) => DistortionWeights {
                zero: w.zero.unwrap_or(DEFAULT_WEIGHT_ZERO),
                three_d: w.three_d.unwrap_or(DEFAULT_WEIGHT_THREE_D),
                clip: w.clip.unwrap_or(DEFAULT_WEIGHT_CLIP),
                dual: w.dual.unwrap_or(DEFAULT_WEIGHT_DUAL),
            },
            None => DistortionWeights::default(),
        }
    }

    fn resolved_bands(&self) -> BandThresholds {
        let defaults = BandThresholds::default();
        match &self.bands {
            Some(b) => BandThresholds {
                mild: b.mild.unwrap_or(defaults.mild),
                moderate: b.moderate.unwrap_or(defaults.moderate),
                severe: b.severe.unwrap_or(defaults.severe),
            },
            None => defaults,
        }
    }

    fn resolved_penalties(&self) -> (f64, f64) {
        match &self.dual_axis {
            Some(d) => (
                d.penalty.unwrap_or(DEFAULT_DUAL_AXIS_PENALTY),
                d.penalty_with_bad_cues
                    .unwrap_or(DEFAULT_DUAL_AXIS_PENALTY_WITH_BAD_CUES),
            ),
            None => (
                DEFAULT_DUAL_AXIS_PENALTY,
                DEFAULT_DUAL_AXIS_PENALTY_WITH_BAD_CUES,
            ),
        }
    }

    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        // Weights must each be in [0, 1] and sum to 1 so totals stay in [0, 1]
        let weights = self.resolved_weights();
        for (name, val) in [
            ("zero", weights.zero),
            ("three_d", weights.three_d),
            ("clip", weights.clip),
            ("dual", weights.dual),
        ] {
            if !(0.0..=1.0).contains(&val) {
                anyhow::bail!("weights.{} must be between 0 and 1 (got {})", name, val);
            }
        }
        if (weights.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            anyhow::bail!("weights must sum to 1.0 (got {})", weights.sum());
        }

        if let Some(k) = self.depth_coefficient {
            if !k.is_finite() || k < 0.0 {
                anyhow::bail!("depth_coefficient must be non-negative (got {})", k);
            }
        }

        let (penalty, penalty_with_bad_cues) = self.resolved_penalties();
        for (name, val) in [
            ("penalty", penalty),
            ("penalty_with_bad_cues", penalty_with_bad_cues),
        ] {
            if !(0.0..=1.0).contains(&val) {
                anyhow::bail!("dual_axis.{} must be between 0 and 1 (got {})", name, val);
            }
        }

        if let Some(max) = self.max_points {
            if max == 0 {
                anyhow::bail!("max_points must be at least 1");
            }
        }

        let bands = self.resolved_bands();
        for (name, val) in [
            ("mild", bands.mild),
            ("moderate", bands.moderate),
            ("severe", bands.severe),
        ] {
            if !(val > 0.0 && val <= 1.0) {
                anyhow::bail!("bands.{} must be in (0, 1] (got {})", name, val);
            }
        }
        if bands.mild >= bands.moderate {
            anyhow::bail!(
                "bands.mild ({}) must be less than bands.moderate ({})",
                bands.mild,
                bands.moderate
            );
        }
        if bands.moderate >= bands.severe {
            anyhow::bail!(
                "bands.moderate ({}) must be less than bands.severe ({})",
                bands.moderate,
                bands.severe
            );
        }

        Ok(())
    }

    /// Resolve config into the policy used for scoring
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let (dual_axis_penalty, dual_axis_penalty_with_bad_cues) = self.resolved_penalties();

        Ok(ResolvedConfig {
            policy: DistortionPolicy {
                weights: self.resolved_weights(),
                depth_coefficient: self.depth_coefficient.unwrap_or(DEFAULT_DEPTH_COEFFICIENT),
                dual_axis_penalty,
                dual_axis_penalty_with_bad_cues,
                max_points: self.max_points.unwrap_or(MAX_POINTS),
                epsilon: EPSILON,
            },
            bands: self.resolved_bands(),
            config_path: None,
        })
    }
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Self {
        ResolvedConfig {
            policy: DistortionPolicy::default(),
            bands: BandThresholds::default(),
            config_path: None,
        }
    }
}

/// Discover and load a config file from the project root
///
/// Search order:
/// 1. `.distortionrc.json`
/// 2. `distortion.config.json`
/// 3. `"distortion"` key in `package.json`
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(DistortionConfig, PathBuf)>> {
    for name in [".distortionrc.json", "distortion.config.json"] {
        let candidate = project_root.join(name);
        tracing::debug!(path = %candidate.display(), "checking config candidate");
        if candidate.exists() {
            let config = load_config_file(&candidate)?;
            return Ok(Some((config, candidate)));
        }
    }

    let pkg_path = project_root.join("package.json");
    tracing::debug!(path = %pkg_path.display(), "checking config candidate");
    if pkg_path.exists() {
        if let Some(config) = load_from_package_json(&pkg_path)? {
            return Ok(Some((config, pkg_path)));
        }
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<DistortionConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: DistortionConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load config from the "distortion" key in package.json
fn load_from_package_json(path: &Path) -> Result<Option<DistortionConfig>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let pkg: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    match pkg.get("distortion") {
        Some(value) => {
            let config: DistortionConfig = serde_json::from_value(value.clone())
                .with_context(|| format!("invalid distortion config in {}", path.display()))?;
            config
                .validate()
                .with_context(|| format!("invalid distortion config in {}", path.display()))?;
            Ok(Some(config))
        }
        None => Ok(None),
    }
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file.
/// Otherwise, discovers config from the project root.
/// Returns default config if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (DistortionConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    if let Some(path) = &source_path {
        tracing::info!(path = %path.display(), "loaded scoring config");
    }
    resolved.config_path = source_path;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_is_valid() {
        let config = DistortionConfig::default();
        config.validate().expect("default config should be valid");
        let resolved = config.resolve().expect("default config should resolve");
        assert_eq!(resolved.policy, DistortionPolicy::default());
        assert_eq!(resolved.bands, BandThresholds::default());
        assert_eq!(resolved, ResolvedConfig::defaults());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: DistortionConfig = serde_json::from_str("{}").unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "weights": {
                "zero": 0.4,
                "three_d": 0.2,
                "clip": 0.2,
                "dual": 0.2
            },
            "depth_coefficient": 0.5,
            "dual_axis": {
                "penalty": 0.2,
                "penalty_with_bad_cues": 0.6
            },
            "max_points": 100,
            "bands": {
                "mild": 0.05,
                "moderate": 0.2,
                "severe": 0.4
            }
        }"#;
        let config: DistortionConfig = serde_json::from_str(json).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.policy.weights.zero, 0.4);
        assert_eq!(resolved.policy.depth_coefficient, 0.5);
        assert_eq!(resolved.policy.dual_axis_penalty, 0.2);
        assert_eq!(resolved.policy.dual_axis_penalty_with_bad_cues, 0.6);
        assert_eq!(resolved.policy.max_points, 100);
        assert_eq!(resolved.bands.severe, 0.4);
    }

    #[test]
    fn test_reject_unknown_fields() {
        let result: Result<DistortionConfig, _> = serde_json::from_str(r#"{"unknown_field": true}"#);
        assert!(result.is_err(), "unknown fields should be rejected");
    }

    #[test]
    fn test_reject_weights_not_summing_to_one() {
        let config: DistortionConfig =
            serde_json::from_str(r#"{"weights": {"zero": 0.5}}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn test_reject_negative_weight() {
        let json = r#"{"weights": {"zero": -0.15, "three_d": 0.5, "clip": 0.5, "dual": 0.15}}"#;
        let config: DistortionConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_negative_depth_coefficient() {
        let config: DistortionConfig =
            serde_json::from_str(r#"{"depth_coefficient": -0.1}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_penalty_above_one() {
        let config: DistortionConfig =
            serde_json::from_str(r#"{"dual_axis": {"penalty_with_bad_cues": 1.5}}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_zero_max_points() {
        let config: DistortionConfig = serde_json::from_str(r#"{"max_points": 0}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reject_unordered_bands() {
        let config: DistortionConfig =
            serde_json::from_str(r#"{"bands": {"mild": 0.3, "moderate": 0.2}}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_bands_use_defaults_for_rest() {
        let config: DistortionConfig =
            serde_json::from_str(r#"{"bands": {"severe": 0.8}}"#).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.bands.mild, 0.1); // default
        assert_eq!(resolved.bands.moderate, 0.25); // default
        assert_eq!(resolved.bands.severe, 0.8);
    }

    #[test]
    fn test_discover_distortionrc() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".distortionrc.json");
        fs::write(&config_path, r#"{"max_points": 10}"#).unwrap();

        let (config, path) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.max_points, Some(10));
        assert_eq!(path, config_path);
    }

    #[test]
    fn test_discover_distortion_config_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("distortion.config.json"),
            r#"{"depth_coefficient": 0.4}"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.depth_coefficient, Some(0.4));
    }

    #[test]
    fn test_discover_package_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{
            "name": "chart-lab",
            "version": "1.0.0",
            "distortion": {
                "max_points": 30
            }
        }"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.max_points, Some(30));
    }

    #[test]
    fn test_discover_package_json_without_distortion_key() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "chart-lab", "version": "1.0.0"}"#,
        )
        .unwrap();

        assert!(discover_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_discover_priority_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".distortionrc.json"), r#"{"max_points": 1}"#).unwrap();
        fs::write(
            dir.path().join("distortion.config.json"),
            r#"{"max_points": 2}"#,
        )
        .unwrap();

        let (config, _) = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(
            config.max_points,
            Some(1),
            ".distortionrc.json should take priority"
        );
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".distortionrc.json");
        fs::write(&config_path, r#"{"max_points": 0}"#).unwrap();

        let err = discover_config(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains(".distortionrc.json"));
    }

    #[test]
    fn test_load_and_resolve_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = load_and_resolve(dir.path(), None).unwrap();
        assert!(resolved.config_path.is_none());
        assert_eq!(resolved.policy.max_points, 20);
    }

    #[test]
    fn test_load_and_resolve_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("custom.json");
        fs::write(&config_path, r#"{"depth_coefficient": 1.0}"#).unwrap();

        let resolved = load_and_resolve(dir.path(), Some(&config_path)).unwrap();
        assert_eq!(resolved.policy.depth_coefficient, 1.0);
        assert_eq!(resolved.config_path, Some(config_path));
    }
}
