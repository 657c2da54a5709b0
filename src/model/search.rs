//! Exhaustive hyperparameter search with stratified k-fold cross-validation

use std::collections::BTreeMap;
use std::path::Path;

use indicatif::ProgressBar;
use ndarray::{Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::forest::RandomForest;
use super::metrics::accuracy;
use super::split::stratified_k_fold;
use crate::pipeline::{PipelineError, Result};
use crate::utils::{create_progress_bar, finish_with_success};

/// One point of the search grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Hyperparameters {
    /// Unfitted forest configured with these values
    pub fn build_forest(&self, seed: u64) -> RandomForest {
        RandomForest::new(self.n_estimators)
            .with_max_depth(self.max_depth)
            .with_min_samples_split(self.min_samples_split)
            .with_random_state(seed)
    }

    /// Flat name → value map for experiment tracking
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let max_depth = self
            .max_depth
            .map_or_else(|| "None".to_string(), |d| d.to_string());
        BTreeMap::from([
            ("max_depth".to_string(), max_depth),
            ("min_samples_split".to_string(), self.min_samples_split.to_string()),
            ("n_estimators".to_string(), self.n_estimators.to_string()),
        ])
    }
}

impl std::fmt::Display for Hyperparameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let depth = self
            .max_depth
            .map_or_else(|| "None".to_string(), |d| d.to_string());
        write!(
            f,
            "n_estimators={}, max_depth={}, min_samples_split={}",
            self.n_estimators, depth, self.min_samples_split
        )
    }
}

/// Candidate values for each hyperparameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub n_estimators: Vec<usize>,
    /// `null` in JSON means unlimited depth
    pub max_depth: Vec<Option<usize>>,
    pub min_samples_split: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            n_estimators: vec![50, 100],
            max_depth: vec![Some(10)],
            min_samples_split: vec![5],
        }
    }
}

impl ParamGrid {
    /// Read a grid from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let grid: ParamGrid = serde_json::from_str(&content)?;
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_estimators.is_empty() || self.max_depth.is_empty() || self.min_samples_split.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "every hyperparameter in the search grid needs at least one value".to_string(),
            ));
        }
        if self.n_estimators.contains(&0) {
            return Err(PipelineError::InvalidConfig(
                "n_estimators values must be at least 1".to_string(),
            ));
        }
        if self.max_depth.contains(&Some(0)) {
            return Err(PipelineError::InvalidConfig(
                "max_depth values must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split.iter().any(|&m| m < 2) {
            return Err(PipelineError::InvalidConfig(
                "min_samples_split values must be at least 2".to_string(),
            ));
        }
        Ok(())
    }

    /// Every combination, `max_depth` outermost and `n_estimators` innermost
    pub fn combinations(&self) -> Vec<Hyperparameters> {
        let mut combos = Vec::with_capacity(self.len());
        for &max_depth in &self.max_depth {
            for &min_samples_split in &self.min_samples_split {
                for &n_estimators in &self.n_estimators {
                    combos.push(Hyperparameters {
                        n_estimators,
                        max_depth,
                        min_samples_split,
                    });
                }
            }
        }
        combos
    }

    pub fn len(&self) -> usize {
        self.n_estimators.len() * self.max_depth.len() * self.min_samples_split.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cross-validation outcome of one combination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    pub params: Hyperparameters,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
}

/// Scores of every combination plus the winner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub candidates: Vec<CandidateScore>,
    pub best_index: usize,
}

impl SearchResult {
    pub fn best(&self) -> &CandidateScore {
        &self.candidates[self.best_index]
    }
}

/// Grid search configuration
#[derive(Debug, Clone)]
pub struct GridSearch {
    pub grid: ParamGrid,
    pub cv_folds: usize,
    pub seed: u64,
    pub show_progress: bool,
}

impl GridSearch {
    pub fn new(grid: ParamGrid) -> Self {
        Self {
            grid,
            cv_folds: 3,
            seed: 42,
            show_progress: false,
        }
    }

    pub fn with_cv_folds(mut self, k: usize) -> Self {
        self.cv_folds = k;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Score every combination by mean fold accuracy.
    ///
    /// The highest mean wins; on a tie the combination enumerated first is kept.
    /// Fold jobs run in parallel but scores are gathered in enumeration order.
    pub fn run(&self, x: &Array2<f64>, y: &[u8]) -> Result<SearchResult> {
        self.grid.validate()?;
        if x.nrows() != y.len() {
            return Err(PipelineError::SchemaMismatch(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }

        let folds = stratified_k_fold(y, self.cv_folds)?;
        let combos = self.grid.combinations();

        let jobs: Vec<(usize, usize)> = (0..combos.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();

        let pb = if self.show_progress {
            create_progress_bar(jobs.len() as u64, "   Cross-validating")
        } else {
            ProgressBar::hidden()
        };

        let scores: Vec<f64> = jobs
            .par_iter()
            .map(|&(c, f)| {
                let fold = &folds[f];
                let x_train = x.select(Axis(0), &fold.train);
                let y_train: Vec<u8> = fold.train.iter().map(|&i| y[i]).collect();
                let x_val = x.select(Axis(0), &fold.validation);
                let y_val: Vec<u8> = fold.validation.iter().map(|&i| y[i]).collect();

                let mut forest = combos[c].build_forest(self.seed);
                forest.fit(&x_train, &y_train)?;
                let predictions = forest.predict(&x_val)?;

                pb.inc(1);
                Ok(accuracy(&y_val, &predictions))
            })
            .collect::<Result<_>>()?;

        finish_with_success(&pb, &format!("Evaluated {} combination(s)", combos.len()));

        let k = folds.len();
        let candidates: Vec<CandidateScore> = combos
            .iter()
            .zip(scores.chunks(k))
            .map(|(params, fold_scores)| {
                let mean = fold_scores.iter().sum::<f64>() / k as f64;
                let variance = fold_scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / k as f64;
                log::debug!("CV {} -> mean accuracy {:.4} (folds {:?})", params, mean, fold_scores);
                CandidateScore {
                    params: *params,
                    fold_scores: fold_scores.to_vec(),
                    mean_score: mean,
                    std_score: variance.sqrt(),
                }
            })
            .collect();

        let mut best_index = 0;
        for (idx, candidate) in candidates.iter().enumerate().skip(1) {
            if candidate.mean_score > candidates[best_index].mean_score {
                best_index = idx;
            }
        }

        Ok(SearchResult {
            candidates,
            best_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use tempfile::TempDir;

    fn dataset() -> (Array2<f64>, Vec<u8>) {
        let n = 30;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| {
            if j == 0 {
                i as f64
            } else {
                ((i * 7) % 5) as f64
            }
        });
        let y = (0..n).map(|i| u8::from(i >= n / 2)).collect();
        (x, y)
    }

    #[test]
    fn test_combination_order() {
        let grid = ParamGrid {
            n_estimators: vec![50, 100],
            max_depth: vec![Some(5), None],
            min_samples_split: vec![2],
        };
        let combos = grid.combinations();
        assert_eq!(combos.len(), 4);
        assert_eq!(combos[0].n_estimators, 50);
        assert_eq!(combos[1].n_estimators, 100);
        assert_eq!(combos[1].max_depth, Some(5));
        assert_eq!(combos[2].max_depth, None);
    }

    #[test]
    fn test_default_grid_matches_reference_values() {
        let grid = ParamGrid::default();
        assert_eq!(grid.len(), 2);
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn test_empty_grid_rejected() {
        let grid = ParamGrid {
            n_estimators: vec![],
            ..ParamGrid::default()
        };
        assert!(matches!(grid.validate(), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn test_params_map_keys() {
        let params = Hyperparameters {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 5,
        };
        let map = params.to_map();
        assert_eq!(map["n_estimators"], "100");
        assert_eq!(map["max_depth"], "None");
        assert_eq!(map["min_samples_split"], "5");
    }

    #[test]
    fn test_grid_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("grid.json");
        std::fs::write(
            &path,
            r#"{"n_estimators": [10, 20], "max_depth": [3, null], "min_samples_split": [2]}"#,
        )
        .unwrap();

        let grid = ParamGrid::from_json_file(&path).unwrap();
        assert_eq!(grid.max_depth, vec![Some(3), None]);
        assert_eq!(grid.len(), 4);
    }

    #[test]
    fn test_search_scores_every_combination() {
        let (x, y) = dataset();
        let grid = ParamGrid {
            n_estimators: vec![5, 10],
            max_depth: vec![Some(3)],
            min_samples_split: vec![2],
        };

        let result = GridSearch::new(grid).run(&x, &y).unwrap();
        assert_eq!(result.candidates.len(), 2);
        for candidate in &result.candidates {
            assert_eq!(candidate.fold_scores.len(), 3);
            assert!((0.0..=1.0).contains(&candidate.mean_score));
        }
        let best = result.best();
        assert!(result
            .candidates
            .iter()
            .all(|c| c.mean_score <= best.mean_score));
    }

    #[test]
    fn test_tie_keeps_first_combination() {
        let (x, y) = dataset();
        let grid = ParamGrid {
            n_estimators: vec![7, 7],
            max_depth: vec![Some(4)],
            min_samples_split: vec![2],
        };

        let result = GridSearch::new(grid).run(&x, &y).unwrap();
        assert_eq!(result.candidates[0].mean_score, result.candidates[1].mean_score);
        assert_eq!(result.best_index, 0);
    }

    #[test]
    fn test_search_needs_k_per_class() {
        let x = Array2::zeros((5, 1));
        let y = vec![0, 0, 0, 1, 1];
        let err = GridSearch::new(ParamGrid::default()).run(&x, &y).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData(_)));
    }
}
