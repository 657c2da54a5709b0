//! Seeded train/test splitting and stratified k-fold cross-validation

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::pipeline::{class_counts, PipelineError, Result};

/// Row indices of a train/test partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition `labels.len()` rows into train and held-out test indices.
///
/// The permutation comes from a `ChaCha8Rng` seeded with `seed`, so the same
/// labels, fraction and seed always give the same split. With `stratify` each
/// class is split separately, sending `round(class_count * test_size)` rows of
/// that class to the test side; otherwise `ceil(n * test_size)` rows are held
/// out overall. Both index lists are returned in ascending order.
pub fn train_test_split(labels: &[u8], test_size: f64, seed: u64, stratify: bool) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::InvalidConfig(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n = labels.len();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let (mut train, mut test) = if stratify {
        let mut train = Vec::with_capacity(n);
        let mut test = Vec::new();
        for class in [0u8, 1u8] {
            let mut members: Vec<usize> = (0..n).filter(|&i| labels[i] == class).collect();
            if members.is_empty() {
                continue;
            }
            members.shuffle(&mut rng);
            let n_test = (members.len() as f64 * test_size).round() as usize;
            let n_test = n_test.min(members.len() - 1);
            test.extend_from_slice(&members[..n_test]);
            train.extend_from_slice(&members[n_test..]);
        }
        (train, test)
    } else {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);
        let n_test = (n as f64 * test_size).ceil() as usize;
        let n_test = n_test.min(n);
        let train = indices.split_off(n_test);
        (train, indices)
    };

    if train.is_empty() || test.is_empty() {
        return Err(PipelineError::InsufficientData(format!(
            "{} row(s) cannot be split into non-empty train and test subsets with test_size {}",
            n, test_size
        )));
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(TrainTestSplit { train, test })
}

/// One cross-validation fold, as positions into the labels it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub fold_idx: usize,
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Stratified k-fold without shuffling.
///
/// Members of each class are dealt round-robin to the folds in row order, so
/// every fold sees both classes. Fails with `InsufficientData` if any class
/// has fewer than `k` members.
pub fn stratified_k_fold(labels: &[u8], k: usize) -> Result<Vec<Fold>> {
    if k < 2 {
        return Err(PipelineError::InvalidConfig(format!(
            "cross-validation needs at least 2 folds, got {}",
            k
        )));
    }

    let (negatives, positives) = class_counts(labels);
    if negatives < k || positives < k {
        return Err(PipelineError::InsufficientData(format!(
            "{}-fold cross-validation needs at least {} samples per class, training subset has {} of class 0 and {} of class 1",
            k, k, negatives, positives
        )));
    }

    let mut assignment = vec![0usize; labels.len()];
    for class in [0u8, 1u8] {
        for (member_idx, row) in (0..labels.len()).filter(|&i| labels[i] == class).enumerate() {
            assignment[row] = member_idx % k;
        }
    }

    let folds = (0..k)
        .map(|fold_idx| {
            let (validation, train): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&row| assignment[row] == fold_idx);
            Fold {
                fold_idx,
                train,
                validation,
            }
        })
        .collect();

    Ok(folds)
}
