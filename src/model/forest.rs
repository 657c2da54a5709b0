//! Random forest classifier
//!
//! Each tree trains on a bootstrap sample drawn from its own `ChaCha8Rng`
//! seeded with `random_state + tree_index`. Trees are built in parallel, and
//! since no RNG is shared between them the fitted forest is the same whatever
//! the thread schedule.

use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::DecisionTree;
use crate::pipeline::{PipelineError, Result};

/// Features considered at each split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Log2 of n_features
    Log2,
    /// Fixed number
    Fixed(usize),
    /// All features
    All,
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().floor() as usize,
            MaxFeatures::Fixed(n) => n.min(n_features),
            MaxFeatures::All => n_features,
        };
        n.max(1)
    }
}

/// Random forest model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Maximum features per split
    pub max_features: MaxFeatures,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Base seed
    pub random_state: u64,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForest {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            random_state: 42,
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Fit the forest to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<&mut Self> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(PipelineError::SchemaMismatch(format!(
                "{} feature rows but {} labels",
                n_samples,
                y.len()
            )));
        }
        if n_samples == 0 {
            return Err(PipelineError::InsufficientData(
                "cannot fit a forest without samples".to_string(),
            ));
        }
        if self.n_estimators == 0 {
            return Err(PipelineError::InvalidConfig(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let max_features = self.max_features.resolve(self.n_features);

        let trees = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.wrapping_add(tree_idx as u64));

                let sample_indices: Vec<usize> = if self.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut tree = DecisionTree::new()
                    .with_max_depth(self.max_depth)
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_max_features(Some(max_features));
                tree.fit_indices(x, y, &sample_indices, &mut rng)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        self.compute_feature_importances();

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        let mut totals = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (total, &imp) in totals.iter_mut().zip(tree.feature_importances()) {
                *total += imp;
            }
        }

        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            for total in &mut totals {
                *total /= sum;
            }
        }
        self.feature_importances = totals;
    }

    /// Mean class-1 probability over all trees
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "random forest is not fitted".to_string(),
            ));
        }
        if x.ncols() != self.n_features {
            return Err(PipelineError::SchemaMismatch(format!(
                "model expects {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        let per_tree: Vec<Vec<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict_proba(x))
            .collect::<Result<_>>()?;

        let n_trees = per_tree.len() as f64;
        let proba = (0..x.nrows())
            .map(|i| per_tree.iter().map(|p| p[i]).sum::<f64>() / n_trees)
            .collect();

        Ok(proba)
    }

    /// Predicted class (1 when the mean probability exceeds 0.5)
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }

    /// Normalized mean impurity decrease per feature
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}
