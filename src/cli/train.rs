//! Default command: preprocess, train, evaluate and track

use std::time::Instant;

use anyhow::{Context, Result};
use console::style;

use super::args::TrainArgs;
use super::preprocess::{prepare_features, save_clean_dataset};
use crate::model::ModelTrainer;
use crate::pipeline::FeatureSchema;
use crate::report::TrainingSummary;
use crate::tracking::{log_training_run, ExperimentTracker, LocalTracker};
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config, print_count,
    print_info, print_step_header, print_step_time, print_success,
};

pub fn run_train(args: &TrainArgs) -> Result<()> {
    let grid = args.param_grid().context("Invalid search grid")?;
    let config = args.trainer_config();
    let schema = FeatureSchema::heart_failure();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        &args.input,
        &schema.target,
        &args.tracking_dir,
        config.test_size,
        config.cv_folds,
        config.seed,
    );

    let prepared = prepare_features(&args.input, args.infer_schema_length, &schema)?;
    let data = &prepared.output;

    let mut summary = TrainingSummary::new(prepared.input_rows, data.duplicates_removed, data.features.ncols());
    summary.add_step_time("Load", prepared.load_time);
    summary.add_step_time("Preprocess", prepared.transform_time);

    if let Some(path) = &args.clean_output {
        save_clean_dataset(path, data, &schema.target)?;
    }

    // Step 3: grid search + refit
    print_step_header(3, "Grid Search & Training");
    let step_start = Instant::now();
    print_count(
        "parameter combination(s)",
        grid.len(),
        Some(&format!("({}-fold CV)", config.cv_folds)),
    );
    let mut trainer = ModelTrainer::new(config);
    let outcome = trainer
        .train(&data.features, &data.labels, &grid)
        .with_context(|| format!("Training failed during the {} stage", trainer.stage()))?;

    let best = outcome.search.best();
    print_success(&format!("Best parameters: {}", best.params));
    println!(
        "      CV accuracy: {} {}",
        style(format!("{:.4}", best.mean_score)).yellow().bold(),
        style(format!("(± {:.4})", best.std_score)).dim()
    );
    print_info(&format!(
        "Held-out accuracy: {:.4}, F1: {:.4}",
        outcome.metrics.accuracy, outcome.metrics.f1_score
    ));
    let train_elapsed = step_start.elapsed();
    summary.add_step_time("Train & evaluate", train_elapsed);
    print_step_time(train_elapsed);

    // Step 4: experiment tracking
    print_step_header(4, "Track Experiment");
    let step_start = Instant::now();
    let spinner = create_spinner("Logging run...");
    let tracking = args.tracking_config();
    let mut tracker = LocalTracker::start(&tracking).context("Failed to start tracking run")?;
    log_training_run(&mut tracker, &outcome, &data.encoder)
        .with_context(|| format!("Failed to record run {}", tracker.run_id()))?;
    finish_with_success(
        &spinner,
        &format!("Run {} recorded in experiment '{}'", tracker.run_id(), tracking.experiment),
    );
    let track_elapsed = step_start.elapsed();
    summary.add_step_time("Tracking", track_elapsed);
    print_step_time(track_elapsed);

    summary.record_outcome(&outcome);
    summary.set_run_dir(tracker.run_dir().display().to_string());
    summary.display();

    print_completion("Cardiofit training complete!");
    Ok(())
}
