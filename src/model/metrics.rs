//! Classification metrics with class 1 as the positive class

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 2×2 confusion matrix, rows = true class, columns = predicted class, order [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub counts: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &[u8], y_pred: &[u8]) -> Self {
        let mut counts = [[0usize; 2]; 2];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            counts[t as usize][p as usize] += 1;
        }
        Self { counts }
    }

    pub fn true_negatives(&self) -> usize {
        self.counts[0][0]
    }

    pub fn false_positives(&self) -> usize {
        self.counts[0][1]
    }

    pub fn false_negatives(&self) -> usize {
        self.counts[1][0]
    }

    pub fn true_positives(&self) -> usize {
        self.counts[1][1]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

/// Fraction of predictions equal to the truth; 0.0 for empty input
pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

#[inline]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Evaluation results on the held-out subset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub confusion_matrix: ConfusionMatrix,
}

impl MetricsRecord {
    /// Compute every metric; undefined ratios (zero denominators) are reported as 0.0
    pub fn compute(y_true: &[u8], y_pred: &[u8]) -> Self {
        let confusion_matrix = ConfusionMatrix::from_predictions(y_true, y_pred);
        let tp = confusion_matrix.true_positives();
        let precision = ratio(tp, tp + confusion_matrix.false_positives());
        let recall = ratio(tp, tp + confusion_matrix.false_negatives());
        let f1_score = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        Self {
            accuracy: accuracy(y_true, y_pred),
            precision,
            recall,
            f1_score,
            confusion_matrix,
        }
    }

    /// Flat name → value map for experiment tracking
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let cm = &self.confusion_matrix;
        [
            ("accuracy", self.accuracy),
            ("precision", self.precision),
            ("recall", self.recall),
            ("f1_score", self.f1_score),
            ("true_negatives", cm.true_negatives() as f64),
            ("false_positives", cm.false_positives() as f64),
            ("false_negatives", cm.false_negatives() as f64),
            ("true_positives", cm.true_positives() as f64),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
    }
}
