//! File-backed experiment tracker
//!
//! Layout of one run:
//!
//! ```text
//! <root>/<experiment>/<run_id>/
//!     meta.json
//!     params.json
//!     metrics.json
//!     model/model.json
//!     artifacts/<name>
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ExperimentTracker, RunStatus, TrackingConfig};
use crate::model::TrainedModel;
use crate::pipeline::{PipelineError, Result};

/// Contents of `meta.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_id: String,
    pub run_name: String,
    pub experiment: String,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub artifacts: Vec<String>,
}

/// Tracker writing one directory per run
#[derive(Debug)]
pub struct LocalTracker {
    run_dir: PathBuf,
    meta: RunMeta,
    params: BTreeMap<String, String>,
    metrics: BTreeMap<String, f64>,
}

fn backend_error(action: &str, path: &Path, err: impl std::fmt::Display) -> PipelineError {
    PipelineError::TrackingBackend(format!("failed to {} {}: {}", action, path.display(), err))
}

/// Directory-safe version of an experiment or artifact name.
///
/// The result is a single path segment that is never `.` or `..`.
fn sanitize(name: &str) -> String {
    if name.chars().all(|c| c == '.') {
        return "_".repeat(name.len());
    }
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

impl LocalTracker {
    /// Open a new run under `config.root`, creating directories as needed
    pub fn start(config: &TrackingConfig) -> Result<Self> {
        let experiment = sanitize(config.experiment.trim());
        if experiment.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "experiment name must not be empty".to_string(),
            ));
        }

        let experiment_dir = config.root.join(&experiment);
        fs::create_dir_all(&experiment_dir).map_err(|e| backend_error("create", &experiment_dir, e))?;

        let start_time = Utc::now();
        let base_id = start_time.format("%Y%m%dT%H%M%S%3fZ").to_string();

        // runs started within the same millisecond get a numeric suffix
        let mut run_id = base_id.clone();
        let mut attempt = 1;
        let run_dir = loop {
            let candidate = experiment_dir.join(&run_id);
            match fs::create_dir(&candidate) {
                Ok(()) => break candidate,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    run_id = format!("{}-{}", base_id, attempt);
                    attempt += 1;
                }
                Err(e) => return Err(backend_error("create", &candidate, e)),
            }
        };

        let tracker = Self {
            run_dir,
            meta: RunMeta {
                run_id,
                run_name: config.run_name.clone(),
                experiment: config.experiment.clone(),
                status: RunStatus::Running,
                start_time,
                end_time: None,
                artifacts: Vec::new(),
            },
            params: BTreeMap::new(),
            metrics: BTreeMap::new(),
        };
        tracker.write_json("meta.json", &tracker.meta)?;
        log::debug!("Started run {} in {}", tracker.meta.run_id, tracker.run_dir.display());

        Ok(tracker)
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn meta(&self) -> &RunMeta {
        &self.meta
    }

    fn ensure_running(&self) -> Result<()> {
        if self.meta.status != RunStatus::Running {
            return Err(PipelineError::TrackingBackend(format!(
                "run {} is already closed",
                self.meta.run_id
            )));
        }
        Ok(())
    }

    fn write_bytes(&self, relative: &str, bytes: &[u8]) -> Result<()> {
        let path = self.run_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| backend_error("create", parent, e))?;
        }
        fs::write(&path, bytes).map_err(|e| backend_error("write", &path, e))?;
        log::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    fn write_json<S: Serialize>(&self, relative: &str, value: &S) -> Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| backend_error("serialize", &self.run_dir.join(relative), e))?;
        self.write_bytes(relative, json.as_bytes())
    }
}

impl ExperimentTracker for LocalTracker {
    fn run_id(&self) -> &str {
        &self.meta.run_id
    }

    fn log_params(&mut self, params: &BTreeMap<String, String>) -> Result<()> {
        self.ensure_running()?;
        self.params.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.write_json("params.json", &self.params)
    }

    fn log_metrics(&mut self, metrics: &BTreeMap<String, f64>) -> Result<()> {
        self.ensure_running()?;
        self.metrics.extend(metrics.iter().map(|(k, v)| (k.clone(), *v)));
        self.write_json("metrics.json", &self.metrics)
    }

    fn log_model(&mut self, model: &TrainedModel) -> Result<()> {
        self.ensure_running()?;
        self.write_json("model/model.json", model)
    }

    fn log_artifact(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.ensure_running()?;
        let name = sanitize(name);
        if name.is_empty() {
            return Err(PipelineError::TrackingBackend(
                "artifact name must not be empty".to_string(),
            ));
        }
        self.write_bytes(&format!("artifacts/{}", name), bytes)?;
        if !self.meta.artifacts.contains(&name) {
            self.meta.artifacts.push(name);
        }
        Ok(())
    }

    fn finish(&mut self, status: RunStatus) -> Result<()> {
        self.ensure_running()?;
        self.meta.status = status;
        self.meta.end_time = Some(Utc::now());
        self.write_json("meta.json", &self.meta)
    }
}
