//! Error types for the training pipeline.
//!
//! Every failure in loading, transforming, training or tracking is fatal to
//! the run. Each kind maps to its own process exit code so scripts driving
//! the CLI can tell them apart.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that abort a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input dataset does not exist.
    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// The target column is absent from the dataset.
    #[error("Target column '{target}' not found. Available columns: {available:?}")]
    MissingTarget {
        target: String,
        available: Vec<String>,
    },

    /// Required feature columns are absent or have an unusable type.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A required field is null in some row.
    #[error("Column '{column}' has a missing value at row {row}")]
    MissingValue { column: String, row: usize },

    /// The target column holds something other than 0/1.
    #[error("Target column '{target}' must be binary (0/1), found value {value}")]
    InvalidTarget { target: String, value: String },

    /// A numeric column has zero variance so it cannot be standardized.
    #[error("Numeric feature '{feature}' has zero standard deviation (constant value {value})")]
    DegenerateFeature { feature: String, value: f64 },

    /// Not enough rows to split or to form the cross-validation folds.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Search grid or trainer configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The experiment-tracking backend rejected a write.
    #[error("Tracking backend error: {0}")]
    TrackingBackend(String),

    #[error("Data error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to render image: {0}")]
    Render(#[from] image::ImageError),

    #[error("Failed to draw chart: {0}")]
    Chart(String),
}

impl PipelineError {
    /// Short name of the error kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InputNotFound { .. } => "InputNotFoundError",
            PipelineError::MissingTarget { .. } => "MissingTargetError",
            PipelineError::SchemaMismatch(_)
            | PipelineError::MissingValue { .. }
            | PipelineError::InvalidTarget { .. } => "SchemaMismatchError",
            PipelineError::DegenerateFeature { .. } => "DegenerateFeatureError",
            PipelineError::InsufficientData(_) => "InsufficientDataError",
            PipelineError::InvalidConfig(_) => "ConfigError",
            PipelineError::TrackingBackend(_) => "TrackingBackendError",
            PipelineError::Polars(_) => "DataError",
            PipelineError::Io(_) => "IoError",
            PipelineError::Serialization(_) => "SerializationError",
            PipelineError::Render(_) | PipelineError::Chart(_) => "RenderError",
        }
    }

    /// Process exit status for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::InputNotFound { .. } => 8,
            PipelineError::MissingTarget { .. } => 3,
            PipelineError::SchemaMismatch(_)
            | PipelineError::MissingValue { .. }
            | PipelineError::InvalidTarget { .. } => 4,
            PipelineError::DegenerateFeature { .. } => 5,
            PipelineError::InsufficientData(_) => 6,
            PipelineError::TrackingBackend(_) => 7,
            _ => 1,
        }
    }
}
