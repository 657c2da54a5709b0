//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::model::{ParamGrid, TrainerConfig};
use crate::pipeline::Result;
use crate::tracking::{TrackingConfig, DEFAULT_EXPERIMENT, DEFAULT_RUN_NAME};

/// Cardiofit - Train a heart-failure classifier with random-forest grid search
#[derive(Parser, Debug)]
#[command(name = "cardiofit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub train: TrainArgs,

    /// Enable debug logging (per-candidate CV scores, tracker writes).
    /// RUST_LOG takes precedence when set.
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,
}

/// Options of the default training command
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Input dataset (CSV or Parquet)
    #[arg(short, long, default_value = "heart.csv")]
    pub input: PathBuf,

    /// JSON file with the search grid, e.g.
    /// {"n_estimators": [50, 100], "max_depth": [10, null], "min_samples_split": [5]}.
    /// Overrides the individual grid flags.
    #[arg(long)]
    pub grid: Option<PathBuf>,

    /// Candidate tree counts (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "50,100")]
    pub n_estimators: Vec<usize>,

    /// Candidate maximum depths (comma-separated, "none" for unlimited)
    #[arg(long, value_delimiter = ',', default_value = "10", value_parser = parse_max_depth)]
    pub max_depth: Vec<Option<usize>>,

    /// Candidate minimum samples per split (comma-separated)
    #[arg(long, value_delimiter = ',', default_value = "5")]
    pub min_samples_split: Vec<usize>,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value = "0.2", value_parser = validate_test_size)]
    pub test_size: f64,

    /// Number of cross-validation folds
    #[arg(long, default_value = "3", value_parser = validate_cv_folds)]
    pub cv_folds: usize,

    /// Seed for the train/test split and the forest
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Split without preserving the class ratio
    #[arg(long, default_value = "false")]
    pub no_stratify: bool,

    /// Root directory of the local experiment store
    #[arg(long, default_value = "mlruns")]
    pub tracking_dir: PathBuf,

    /// Experiment name
    #[arg(long, default_value = DEFAULT_EXPERIMENT)]
    pub experiment: String,

    /// Run name
    #[arg(long, default_value = DEFAULT_RUN_NAME)]
    pub run_name: String,

    /// Also write the cleaned, encoded dataset to this path (CSV or Parquet)
    #[arg(long)]
    pub clean_output: Option<PathBuf>,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clean and encode a dataset without training
    Preprocess {
        /// Input dataset (CSV or Parquet)
        input: PathBuf,

        /// Output file path (optional, defaults to input with '_preprocessing.csv' suffix)
        output: Option<PathBuf>,

        /// Number of rows to use for schema inference (CSV only)
        #[arg(long, default_value = "10000")]
        infer_schema_length: usize,
    },
}

impl TrainArgs {
    /// Search grid from `--grid` if given, otherwise from the grid flags
    pub fn param_grid(&self) -> Result<ParamGrid> {
        let grid = match &self.grid {
            Some(path) => ParamGrid::from_json_file(path)?,
            None => ParamGrid {
                n_estimators: self.n_estimators.clone(),
                max_depth: self.max_depth.clone(),
                min_samples_split: self.min_samples_split.clone(),
            },
        };
        grid.validate()?;
        Ok(grid)
    }

    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            test_size: self.test_size,
            cv_folds: self.cv_folds,
            seed: self.seed,
            stratify: !self.no_stratify,
            show_progress: true,
        }
    }

    pub fn tracking_config(&self) -> TrackingConfig {
        TrackingConfig {
            root: self.tracking_dir.clone(),
            experiment: self.experiment.clone(),
            run_name: self.run_name.clone(),
        }
    }
}

/// Default clean-dataset path: next to the input with a '_preprocessing.csv' suffix
pub fn preprocess_output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    output.map(Path::to_path_buf).unwrap_or_else(|| {
        let parent = input.parent().unwrap_or_else(|| Path::new("."));
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset");
        parent.join(format!("{}_preprocessing.csv", stem))
    })
}

/// Parse one max_depth entry; "none" means unlimited
fn parse_max_depth(s: &str) -> std::result::Result<Option<usize>, String> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("none") || trimmed.eq_ignore_ascii_case("null") {
        return Ok(None);
    }
    let depth: usize = trimmed
        .parse()
        .map_err(|_| format!("'{}' is not a valid depth (use a positive integer or 'none')", s))?;
    if depth == 0 {
        Err("max_depth must be at least 1".to_string())
    } else {
        Ok(Some(depth))
    }
}

/// Validator for test_size parameter
fn validate_test_size(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!("test_size must be between 0.0 and 1.0 (exclusive), got {}", value))
    }
}

/// Validator for cv_folds parameter
fn validate_cv_folds(s: &str) -> std::result::Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid fold count", s))?;

    if value >= 2 {
        Ok(value)
    } else {
        Err(format!("cv_folds must be at least 2, got {}", value))
    }
}
