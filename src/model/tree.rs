//! CART decision tree for binary classification
//!
//! Splits minimize weighted Gini impurity. Each node looks at a random subset
//! of `max_features` features drawn from the caller's RNG, so a tree is fully
//! determined by its training rows and the RNG state it is given.

use ndarray::{Array2, ArrayView1};
use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::pipeline::{PipelineError, Result};

/// Decision tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf holding the fraction of class-1 samples that reached it
    Leaf { proba: f64, n_samples: usize },
    /// Internal node; samples with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Best split found at a node
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

#[inline]
fn gini(counts: [usize; 2]) -> f64 {
    let n = (counts[0] + counts[1]) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let p0 = counts[0] as f64 / n;
    let p1 = counts[1] as f64 / n;
    1.0 - p0 * p0 - p1 * p1
}

fn class_counts(y: &[u8], indices: &[usize]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for &i in indices {
        counts[y[i] as usize] += 1;
    }
    counts
}

/// Binary classification tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth, unlimited when `None`
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples in each child
    pub min_samples_leaf: usize,
    /// Features considered per split, all when `None`
    pub max_features: Option<usize>,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
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

    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Fit on every row of `x`
    pub fn fit(&mut self, x: &Array2<f64>, y: &[u8], rng: &mut ChaCha8Rng) -> Result<&mut Self> {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.fit_indices(x, y, &indices, rng)
    }

    /// Fit on the rows of `x` listed in `indices`; repeated indices act as sample weights
    pub fn fit_indices(
        &mut self,
        x: &Array2<f64>,
        y: &[u8],
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Result<&mut Self> {
        if x.nrows() != y.len() {
            return Err(PipelineError::SchemaMismatch(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if indices.is_empty() {
            return Err(PipelineError::InsufficientData(
                "cannot fit a tree without samples".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        self.root = Some(self.build_node(x, y, indices, 0, rng, &mut importances));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = importances;

        Ok(self)
    }

    fn build_node(
        &self,
        x: &Array2<f64>,
        y: &[u8],
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = class_counts(y, indices);
        let leaf = TreeNode::Leaf {
            proba: counts[1] as f64 / n_samples as f64,
            n_samples,
        };

        let is_pure = counts[0] == 0 || counts[1] == 0;
        if is_pure
            || n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.is_some_and(|d| depth >= d)
        {
            return leaf;
        }

        let parent_impurity = gini(counts);
        let Some(best) = self.find_best_split(x, y, indices, counts, parent_impurity, rng) else {
            return leaf;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        importances[best.feature_idx] += n_samples as f64 * best.gain;

        let left = Box::new(self.build_node(x, y, &left_indices, depth + 1, rng, importances));
        let right = Box::new(self.build_node(x, y, &right_indices, depth + 1, rng, importances));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &[u8],
        indices: &[usize],
        counts: [usize; 2],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let n_features = x.ncols();
        let n_try = self.max_features.unwrap_or(n_features).clamp(1, n_features.max(1));
        let features: Vec<usize> = if n_try < n_features {
            sample(rng, n_features, n_try).into_vec()
        } else {
            (0..n_features).collect()
        };

        let n = indices.len() as f64;
        let mut best: Option<SplitCandidate> = None;

        for feature_idx in features {
            let mut column: Vec<(f64, u8)> = indices.iter().map(|&i| (x[[i, feature_idx]], y[i])).collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = [0usize; 2];
            for pos in 0..column.len() - 1 {
                left[column[pos].1 as usize] += 1;

                let (value, next) = (column[pos].0, column[pos + 1].0);
                if value == next {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = column.len() - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let right = [counts[0] - left[0], counts[1] - left[1]];
                let weighted = (n_left as f64 * gini(left) + n_right as f64 * gini(right)) / n;
                let gain = parent_impurity - weighted;

                if gain > best.as_ref().map_or(0.0, |b| b.gain) {
                    let mut threshold = (value + next) / 2.0;
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some(SplitCandidate {
                        feature_idx,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }

    /// Probability of class 1 for a single row
    pub fn predict_proba_row(&self, row: ArrayView1<'_, f64>) -> Result<f64> {
        let mut node = self.root.as_ref().ok_or_else(|| {
            PipelineError::InvalidConfig("decision tree is not fitted".to_string())
        })?;

        loop {
            match node {
                TreeNode::Leaf { proba, .. } => return Ok(*proba),
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature_idx] <= *threshold {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }

    /// Class-1 probability for every row of `x`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        x.rows().into_iter().map(|row| self.predict_proba_row(row)).collect()
    }

    /// Normalized impurity decrease per feature
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }

    pub fn n_leaves(&self) -> usize {
        fn count(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => count(left) + count(right),
            }
        }
        self.root.as_ref().map_or(0, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_separable_data_fits_exactly() {
        let x = array![[0.0, 5.0], [0.1, 3.0], [0.2, 4.0], [1.0, 3.5], [1.1, 5.0], [1.2, 4.5]];
        let y = [0, 0, 0, 1, 1, 1];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y, &mut rng()).unwrap();

        let proba = tree.predict_proba(&x).unwrap();
        assert_eq!(proba, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn test_threshold_is_midpoint() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [0, 0, 1, 1];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y, &mut rng()).unwrap();

        match tree.root.as_ref().unwrap() {
            TreeNode::Split { threshold, .. } => assert_eq!(*threshold, 2.5),
            other => panic!("Expected split, got {:?}", other),
        }
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = [0, 1, 0, 1, 0, 1];

        let mut tree = DecisionTree::new().with_max_depth(Some(1));
        tree.fit(&x, &y, &mut rng()).unwrap();
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_min_samples_split_makes_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [0, 0, 1, 1];

        let mut tree = DecisionTree::new().with_min_samples_split(5);
        tree.fit(&x, &y, &mut rng()).unwrap();

        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.predict_proba_row(x.row(0)).unwrap(), 0.5);
    }

    #[test]
    fn test_importances_favor_informative_feature() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = [0, 0, 1, 1];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y, &mut rng()).unwrap();

        let importances = tree.feature_importances();
        assert_eq!(importances, &[1.0, 0.0]);
    }

    #[test]
    fn test_bootstrap_indices_with_repeats() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [0, 0, 1, 1];

        let mut tree = DecisionTree::new();
        tree.fit_indices(&x, &y, &[0, 0, 3, 3], &mut rng()).unwrap();

        assert_eq!(tree.predict_proba_row(x.row(1)).unwrap(), 0.0);
        assert_eq!(tree.predict_proba_row(x.row(2)).unwrap(), 1.0);
    }

    #[test]
    fn test_unfitted_tree_errors() {
        let tree = DecisionTree::new();
        let x = array![[1.0]];
        assert!(tree.predict_proba(&x).is_err());
    }

    #[test]
    fn test_same_seed_same_tree() {
        let x = array![
            [1.0, 9.0, 0.3],
            [2.0, 8.0, 0.1],
            [3.0, 7.0, 0.4],
            [4.0, 6.0, 0.1],
            [5.0, 5.0, 0.5],
            [6.0, 4.0, 0.9]
        ];
        let y = [0, 0, 1, 0, 1, 1];

        let mut a = DecisionTree::new().with_max_features(Some(1));
        let mut b = DecisionTree::new().with_max_features(Some(1));
        a.fit(&x, &y, &mut rng()).unwrap();
        b.fit(&x, &y, &mut rng()).unwrap();

        assert_eq!(a.root, b.root);
    }
}
