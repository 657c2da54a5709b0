//! Experiment tracking
//!
//! A run records parameters, metrics, the fitted model and any number of
//! binary artifacts. `LocalTracker` keeps everything under a directory tree;
//! other backends only need to implement [`ExperimentTracker`].

pub mod local;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::{TrainedModel, TrainingOutcome};
use crate::pipeline::{FittedEncoder, Result};

pub use local::LocalTracker;

/// Experiment name used when none is given
pub const DEFAULT_EXPERIMENT: &str = "Heart Failure Prediction - CI Pipeline";
/// Run name used when none is given
pub const DEFAULT_RUN_NAME: &str = "CI_Automated_Run";
/// Artifact name of the serialized encoder state
pub const ENCODER_ARTIFACT: &str = "encoder.json";

/// Where and under which names a run is recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingConfig {
    pub root: PathBuf,
    pub experiment: String,
    pub run_name: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("mlruns"),
            experiment: DEFAULT_EXPERIMENT.to_string(),
            run_name: DEFAULT_RUN_NAME.to_string(),
        }
    }
}

/// Lifecycle state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// Sink for the results of one training run
pub trait ExperimentTracker {
    fn run_id(&self) -> &str;

    fn log_params(&mut self, params: &BTreeMap<String, String>) -> Result<()>;

    fn log_metrics(&mut self, metrics: &BTreeMap<String, f64>) -> Result<()>;

    fn log_model(&mut self, model: &TrainedModel) -> Result<()>;

    fn log_artifact(&mut self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Close the run; nothing may be logged afterwards
    fn finish(&mut self, status: RunStatus) -> Result<()>;
}

/// Record a completed training run: chosen parameters, evaluation metrics,
/// the model, the confusion-matrix image and the encoder state.
///
/// If any write fails the run is closed as `Failed` and the first error returned.
pub fn log_training_run<T: ExperimentTracker + ?Sized>(
    tracker: &mut T,
    outcome: &TrainingOutcome,
    encoder: &FittedEncoder,
) -> Result<()> {
    let result = write_run(tracker, outcome, encoder);
    match result {
        Ok(()) => tracker.finish(RunStatus::Finished),
        Err(err) => {
            if let Err(close_err) = tracker.finish(RunStatus::Failed) {
                log::warn!("Could not close failed run {}: {}", tracker.run_id(), close_err);
            }
            Err(err)
        }
    }
}

fn write_run<T: ExperimentTracker + ?Sized>(
    tracker: &mut T,
    outcome: &TrainingOutcome,
    encoder: &FittedEncoder,
) -> Result<()> {
    tracker.log_params(&outcome.model.params.to_map())?;
    tracker.log_metrics(&outcome.metrics.to_map())?;
    tracker.log_model(&outcome.model)?;
    tracker.log_artifact(&outcome.artifact.file_name, &outcome.artifact.png)?;
    tracker.log_artifact(ENCODER_ARTIFACT, serde_json::to_string_pretty(encoder)?.as_bytes())?;
    Ok(())
}
