//! Integration tests for model training on encoded heart data

use cardiofit::model::{train, ModelTrainer, ParamGrid, TrainerConfig, TrainerStage};
use cardiofit::pipeline::{FeatureMatrix, FeatureTransformer, PipelineError};
use ndarray::Array2;

#[path = "common/mod.rs"]
mod common;

fn two_point_grid() -> ParamGrid {
    ParamGrid {
        n_estimators: vec![10, 20],
        max_depth: vec![Some(5)],
        min_samples_split: vec![2],
    }
}

#[test]
fn test_heart_pipeline_end_to_end() {
    let df = common::heart_dataframe(240, 42);
    let data = FeatureTransformer::default().fit_transform_frame(&df).unwrap();

    let outcome = train(&data.features, &data.labels, &two_point_grid(), TrainerConfig::default()).unwrap();

    let n = data.labels.len();
    assert_eq!(outcome.split.train.len() + outcome.split.test.len(), n);
    assert_eq!(outcome.metrics.confusion_matrix.total(), outcome.split.test.len());

    let metrics = outcome.metrics.to_map();
    for key in ["accuracy", "precision", "recall", "f1_score"] {
        let value = metrics[key];
        assert!((0.0..=1.0).contains(&value), "{} out of range: {}", key, value);
    }
    // the synthetic classes are well separated apart from 10% label noise
    assert!(outcome.metrics.accuracy > 0.7, "accuracy {}", outcome.metrics.accuracy);

    assert_eq!(outcome.model.feature_names, data.features.columns);
    assert_eq!(outcome.search.candidates.len(), 2);
}

#[test]
fn test_results_reproducible_for_fixed_seed() {
    let df = common::heart_dataframe(150, 8);
    let data = FeatureTransformer::default().fit_transform_frame(&df).unwrap();

    let a = train(&data.features, &data.labels, &two_point_grid(), TrainerConfig::default()).unwrap();
    let b = train(&data.features, &data.labels, &two_point_grid(), TrainerConfig::default()).unwrap();

    assert_eq!(a.split, b.split);
    assert_eq!(a.model.params, b.model.params);
    assert_eq!(a.metrics, b.metrics);
    assert_eq!(a.search, b.search);
}

#[test]
fn test_different_seed_changes_split() {
    let df = common::heart_dataframe(150, 8);
    let data = FeatureTransformer::default().fit_transform_frame(&df).unwrap();

    let a = train(&data.features, &data.labels, &two_point_grid(), TrainerConfig::default()).unwrap();
    let b = train(
        &data.features,
        &data.labels,
        &two_point_grid(),
        TrainerConfig {
            seed: 7,
            ..TrainerConfig::default()
        },
    )
    .unwrap();

    assert_ne!(a.split, b.split);
}

#[test]
fn test_small_grid_scenario() {
    // 3 per class in the training subset is the minimum for 3 folds
    let values = Array2::from_shape_fn((10, 2), |(i, j)| (i * (j + 1)) as f64);
    let features = FeatureMatrix::new(vec!["f0".to_string(), "f1".to_string()], values).unwrap();
    let labels = vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1];

    let grid = ParamGrid {
        n_estimators: vec![3, 5],
        max_depth: vec![None],
        min_samples_split: vec![2],
    };
    let outcome = train(&features, &labels, &grid, TrainerConfig::default()).unwrap();

    assert!(grid.combinations().contains(&outcome.model.params));
    let metrics = outcome.metrics.to_map();
    assert!(metrics.contains_key("accuracy"));
    assert!(metrics.contains_key("f1_score"));
}

#[test]
fn test_too_few_rows_per_class() {
    let values = Array2::from_shape_fn((6, 1), |(i, _)| i as f64);
    let features = FeatureMatrix::new(vec!["f0".to_string()], values).unwrap();
    let labels = vec![0, 0, 0, 0, 1, 1];

    let mut trainer = ModelTrainer::new(TrainerConfig::default());
    let err = trainer.train(&features, &labels, &two_point_grid()).unwrap_err();

    assert!(matches!(err, PipelineError::InsufficientData(_)));
    assert_eq!(err.exit_code(), 6);
    assert_ne!(trainer.stage(), TrainerStage::Done);
}

#[test]
fn test_empty_grid_is_config_error() {
    let values = Array2::zeros((10, 1));
    let features = FeatureMatrix::new(vec!["f0".to_string()], values).unwrap();
    let labels = vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1];
    let grid = ParamGrid {
        max_depth: vec![],
        ..ParamGrid::default()
    };

    let err = train(&features, &labels, &grid, TrainerConfig::default()).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig(_)));
}

#[test]
fn test_unstratified_split_sizes() {
    let df = common::heart_dataframe(100, 13);
    let data = FeatureTransformer::default().fit_transform_frame(&df).unwrap();
    let n = data.labels.len();

    let outcome = train(
        &data.features,
        &data.labels,
        &two_point_grid(),
        TrainerConfig {
            stratify: false,
            ..TrainerConfig::default()
        },
    )
    .unwrap();

    let expected_test = (n as f64 * 0.2).ceil() as usize;
    assert_eq!(outcome.split.test.len(), expected_test);
}

#[test]
fn test_model_json_round_trip_predicts_same() {
    let df = common::heart_dataframe(120, 4);
    let data = FeatureTransformer::default().fit_transform_frame(&df).unwrap();
    let outcome = train(&data.features, &data.labels, &two_point_grid(), TrainerConfig::default()).unwrap();

    let json = outcome.model.to_json().unwrap();
    let restored: cardiofit::model::TrainedModel = serde_json::from_str(&json).unwrap();

    assert_eq!(
        restored.predict(&data.features).unwrap(),
        outcome.model.predict(&data.features).unwrap()
    );
}
