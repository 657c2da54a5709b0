//! End-to-end model training: split, search, refit, evaluate

use std::fmt;

use ndarray::Axis;
use serde::{Deserialize, Serialize};

use super::forest::RandomForest;
use super::metrics::MetricsRecord;
use super::search::{GridSearch, Hyperparameters, ParamGrid, SearchResult};
use super::split::{train_test_split, TrainTestSplit};
use crate::pipeline::{FeatureMatrix, PipelineError, Result};
use crate::report::{render_confusion_matrix, ConfusionMatrixArtifact};

/// Trainer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Held-out fraction
    pub test_size: f64,
    pub cv_folds: usize,
    pub seed: u64,
    pub stratify: bool,
    #[serde(skip)]
    pub show_progress: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            cv_folds: 3,
            seed: 42,
            stratify: true,
            show_progress: false,
        }
    }
}

/// Training stages, run strictly in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerStage {
    Split,
    Search,
    Evaluate,
    Done,
}

impl fmt::Display for TrainerStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrainerStage::Split => "split",
            TrainerStage::Search => "search",
            TrainerStage::Evaluate => "evaluate",
            TrainerStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Fitted forest together with what it was trained on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub forest: RandomForest,
    pub params: Hyperparameters,
    pub feature_names: Vec<String>,
    /// Mean cross-validated accuracy of the chosen parameters
    pub cv_score: f64,
}

impl TrainedModel {
    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<u8>> {
        if features.columns != self.feature_names {
            return Err(PipelineError::SchemaMismatch(
                "feature columns differ from the ones the model was trained on".to_string(),
            ));
        }
        self.forest.predict(&features.values)
    }

    /// (feature, importance) pairs, most important first
    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        let mut pairs: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(self.forest.feature_importances().iter().copied())
            .collect();
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        pairs
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Everything a successful run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: TrainedModel,
    pub metrics: MetricsRecord,
    pub artifact: ConfusionMatrixArtifact,
    pub search: SearchResult,
    pub split: TrainTestSplit,
}

/// Split → Search → Evaluate → Done
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    config: TrainerConfig,
    stage: TrainerStage,
}

impl ModelTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self {
            config,
            stage: TrainerStage::Split,
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Stage reached so far; after a failure this is the stage that failed
    pub fn stage(&self) -> TrainerStage {
        self.stage
    }

    pub fn train(&mut self, features: &FeatureMatrix, labels: &[u8], grid: &ParamGrid) -> Result<TrainingOutcome> {
        if features.nrows() != labels.len() {
            return Err(PipelineError::SchemaMismatch(format!(
                "{} feature rows but {} labels",
                features.nrows(),
                labels.len()
            )));
        }
        if let Some(&label) = labels.iter().find(|&&label| label > 1) {
            return Err(PipelineError::InvalidTarget {
                target: "label".to_string(),
                value: label.to_string(),
            });
        }
        grid.validate()?;

        self.stage = TrainerStage::Split;
        let split = train_test_split(labels, self.config.test_size, self.config.seed, self.config.stratify)?;
        let x_train = features.values.select(Axis(0), &split.train);
        let y_train: Vec<u8> = split.train.iter().map(|&i| labels[i]).collect();
        let x_test = features.values.select(Axis(0), &split.test);
        let y_test: Vec<u8> = split.test.iter().map(|&i| labels[i]).collect();
        log::debug!("Split {} rows into {} train / {} test", labels.len(), y_train.len(), y_test.len());

        self.stage = TrainerStage::Search;
        let search = GridSearch::new(grid.clone())
            .with_cv_folds(self.config.cv_folds)
            .with_seed(self.config.seed)
            .with_progress(self.config.show_progress)
            .run(&x_train, &y_train)?;
        let best = search.best();
        log::info!("Best parameters: {} (CV accuracy {:.4})", best.params, best.mean_score);

        let mut forest = best.params.build_forest(self.config.seed);
        forest.fit(&x_train, &y_train)?;

        self.stage = TrainerStage::Evaluate;
        let predictions = forest.predict(&x_test)?;
        let metrics = MetricsRecord::compute(&y_test, &predictions);
        let artifact = render_confusion_matrix(&metrics.confusion_matrix)?;

        let model = TrainedModel {
            forest,
            params: best.params,
            feature_names: features.columns.clone(),
            cv_score: best.mean_score,
        };

        self.stage = TrainerStage::Done;
        Ok(TrainingOutcome {
            model,
            metrics,
            artifact,
            search,
            split,
        })
    }
}

/// Train with the given configuration in one call
pub fn train(
    features: &FeatureMatrix,
    labels: &[u8],
    grid: &ParamGrid,
    config: TrainerConfig,
) -> Result<TrainingOutcome> {
    ModelTrainer::new(config).train(features, labels, grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn separable(n: usize) -> (FeatureMatrix, Vec<u8>) {
        let values = Array2::from_shape_fn((n, 2), |(i, j)| {
            let base = if i % 2 == 0 { -1.0 } else { 1.0 };
            base + (i as f64 * 0.01) + j as f64 * 0.001
        });
        let labels = (0..n).map(|i| (i % 2) as u8).collect();
        let features = FeatureMatrix::new(vec!["a".to_string(), "b".to_string()], values).unwrap();
        (features, labels)
    }

    fn small_grid() -> ParamGrid {
        ParamGrid {
            n_estimators: vec![5, 10],
            max_depth: vec![Some(3)],
            min_samples_split: vec![2],
        }
    }

    #[test]
    fn test_train_reaches_done() {
        let (features, labels) = separable(40);
        let mut trainer = ModelTrainer::new(TrainerConfig::default());
        let outcome = trainer.train(&features, &labels, &small_grid()).unwrap();

        assert_eq!(trainer.stage(), TrainerStage::Done);
        assert_eq!(outcome.split.test.len(), 8);
        assert_eq!(outcome.metrics.confusion_matrix.total(), 8);
        assert_eq!(outcome.metrics.accuracy, 1.0);
        assert_eq!(outcome.artifact.file_name, "confusion_matrix.png");
    }

    #[test]
    fn test_chosen_params_come_from_grid() {
        let (features, labels) = separable(40);
        let grid = small_grid();
        let outcome = train(&features, &labels, &grid, TrainerConfig::default()).unwrap();

        assert!(grid.combinations().contains(&outcome.model.params));
        assert_eq!(outcome.model.forest.n_trees(), outcome.model.params.n_estimators);
    }

    #[test]
    fn test_training_is_deterministic() {
        let (features, labels) = separable(40);
        let a = train(&features, &labels, &small_grid(), TrainerConfig::default()).unwrap();
        let b = train(&features, &labels, &small_grid(), TrainerConfig::default()).unwrap();

        assert_eq!(a.split, b.split);
        assert_eq!(a.model.params, b.model.params);
        assert_eq!(a.metrics, b.metrics);
        assert_eq!(a.artifact, b.artifact);
    }

    #[test]
    fn test_failure_leaves_failing_stage() {
        let (features, labels) = separable(8);
        let mut trainer = ModelTrainer::new(TrainerConfig {
            cv_folds: 5,
            ..TrainerConfig::default()
        });

        let err = trainer.train(&features, &labels, &small_grid()).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData(_)));
        assert_eq!(trainer.stage(), TrainerStage::Search);
    }

    #[test]
    fn test_importances_sorted_descending() {
        let (features, labels) = separable(40);
        let outcome = train(&features, &labels, &small_grid(), TrainerConfig::default()).unwrap();

        let importances = outcome.model.feature_importances();
        assert_eq!(importances.len(), 2);
        assert!(importances[0].1 >= importances[1].1);
    }

    #[test]
    fn test_predict_rejects_other_columns() {
        let (features, labels) = separable(40);
        let outcome = train(&features, &labels, &small_grid(), TrainerConfig::default()).unwrap();

        let renamed = FeatureMatrix::new(vec!["x".to_string(), "y".to_string()], features.values.clone()).unwrap();
        assert!(matches!(outcome.model.predict(&renamed), Err(PipelineError::SchemaMismatch(_))));
    }

    #[test]
    fn test_non_binary_label_rejected() {
        let (features, mut labels) = separable(40);
        labels[7] = 2;

        for stratify in [true, false] {
            let config = TrainerConfig {
                stratify,
                ..TrainerConfig::default()
            };
            let err = train(&features, &labels, &small_grid(), config).unwrap_err();
            assert!(matches!(err, PipelineError::InvalidTarget { ref value, .. } if value == "2"));
        }
    }
}
