//! Distortion CLI - score a misleading chart and the fixes applied to it

#![deny(warnings)]

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output

use anyhow::Context;
use clap::{Parser, Subcommand};
use distortion_core::report::{render_risks, NO_RISK_PLACEHOLDER};
use distortion_core::{config, params, risk};
use distortion_core::{extract_parameters, render_json, render_text, score_parameters};
use distortion_core::{ChartParameters, FixToggles, ResolvedConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "distortion")]
#[command(about = "Score how misleading a chart is and how much a set of fixes improves it")]
#[command(version = env!("DISTORTION_VERSION"))]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score chart material before and after the selected fixes
    Score {
        /// Path to material (.json object, or text with `key = value` lines)
        path: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Start the value axis at zero
        #[arg(long)]
        fix_zero: bool,

        /// Remove the pseudo-3D rendering
        #[arg(long)]
        no_3d: bool,

        /// Collapse dual axes into one
        #[arg(long)]
        single_axis: bool,

        /// Show the full time range
        #[arg(long)]
        extend: bool,

        /// Apply every fix
        #[arg(long)]
        all_fixes: bool,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List the risk notes triggered by chart material
    Risks {
        /// Path to material (.json object, or text with `key = value` lines)
        path: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Validate or show the scoring configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without scoring anything
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Score {
            path,
            format,
            fix_zero,
            no_3d,
            single_axis,
            extend,
            all_fixes,
            config: config_path,
        } => {
            let normalized_path = absolute_path(path)?;
            let before = read_material(&normalized_path)?;

            // Config is discovered next to the material, or at its repository root
            let project_root = find_project_root(&normalized_path);
            let resolved_config = config::load_and_resolve(&project_root, config_path.as_deref())
                .context("failed to load configuration")?;

            let toggles = if all_fixes {
                FixToggles::all()
            } else {
                FixToggles {
                    zero: fix_zero,
                    no3d: no_3d,
                    single_axis,
                    extend,
                }
            };
            if toggles.is_empty() {
                tracing::warn!("no fixes selected; the after chart equals the before chart");
            }

            let report = score_parameters(before, toggles, &resolved_config);
            match format {
                OutputFormat::Text => print!("{}", render_text(&report)),
                OutputFormat::Json => println!("{}", render_json(&report)),
            }
        }
        Commands::Risks { path, format } => {
            let normalized_path = absolute_path(path)?;
            let params = read_material(&normalized_path)?;
            let notes = risk::risk_notes(&params);

            match format {
                OutputFormat::Text => {
                    if notes.is_empty() {
                        println!("{}", NO_RISK_PLACEHOLDER);
                    } else {
                        print!("{}", render_risks(&notes.messages()));
                    }
                }
                OutputFormat::Json => {
                    let entries: Vec<serde_json::Value> = notes
                        .iter()
                        .map(|note| {
                            serde_json::json!({
                                "id": note.id(),
                                "message": note.message(),
                            })
                        })
                        .collect();
                    let json = serde_json::to_string_pretty(&entries)
                        .context("failed to serialize risk notes to JSON")?;
                    println!("{}", json);
                }
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref());

                match resolved {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
            }
            ConfigAction::Show { path } => {
                let project_root = std::env::current_dir()?;
                let resolved = config::load_and_resolve(&project_root, path.as_deref())
                    .context("failed to load configuration")?;
                print_config(&resolved);
            }
        },
    }

    Ok(())
}

/// Install a stderr fmt subscriber; RUST_LOG wins over --verbose
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn absolute_path(path: PathBuf) -> anyhow::Result<PathBuf> {
    let normalized = if path.is_relative() {
        std::env::current_dir()?.join(&path)
    } else {
        path
    };

    if !normalized.exists() {
        anyhow::bail!("Path does not exist: {}", normalized.display());
    }
    Ok(normalized)
}

/// Read material from disk and normalize it
///
/// `.json` files must hold a parameter object; anything else is treated as
/// display text and run through the `key = value` extractor.
fn read_material(path: &Path) -> anyhow::Result<ChartParameters> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read material: {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let params = if is_json {
        let raw: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse material: {}", path.display()))?;
        if !raw.is_object() {
            tracing::warn!(path = %path.display(), "material is not a JSON object; using defaults");
        }
        params::normalize(&raw)
    } else {
        let fields = extract_parameters(&content);
        tracing::debug!(fields = fields.len(), "extracted parameters from text");
        params::normalize_fields(&fields)
    };

    Ok(params)
}

fn print_config(resolved: &ResolvedConfig) {
    let policy = &resolved.policy;

    println!("Configuration:");
    if let Some(ref p) = resolved.config_path {
        println!("  Source: {}", p.display());
    } else {
        println!("  Source: defaults (no config file found)");
    }
    println!();
    println!("Weights:");
    println!("  zero: {}", policy.weights.zero);
    println!("  three_d: {}", policy.weights.three_d);
    println!("  clip: {}", policy.weights.clip);
    println!("  dual: {}", policy.weights.dual);
    println!();
    println!("Penalties:");
    println!("  depth_coefficient: {}", policy.depth_coefficient);
    println!("  dual_axis: {}", policy.dual_axis_penalty);
    println!(
        "  dual_axis_with_bad_cues: {}",
        policy.dual_axis_penalty_with_bad_cues
    );
    println!();
    println!("Scoring:");
    println!("  max_points: {}", policy.max_points);
    println!("  epsilon: {}", policy.epsilon);
    println!();
    println!("Bands:");
    println!("  mild: {}", resolved.bands.mild);
    println!("  moderate: {}", resolved.bands.moderate);
    println!("  severe: {}", resolved.bands.severe);
}

/// Find the directory to search for config: the nearest git root, else the material's directory
fn find_project_root(start_path: &Path) -> PathBuf {
    let start = if start_path.is_file() {
        start_path.parent().unwrap_or(start_path)
    } else {
        start_path
    };

    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return start.to_path_buf(),
        }
    }
}
