//! `preprocess` subcommand: clean and encode a dataset, then write it out

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use console::style;

use super::args::preprocess_output_path;
use crate::pipeline::{
    load_dataset_with_progress, write_clean_dataset, FeatureSchema, FeatureTransformer, RawRecordSet,
    TransformOutput,
};
use crate::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_completion, print_step_header,
    print_step_time, print_success,
};

/// Transformed dataset plus load statistics
pub struct PreparedData {
    pub output: TransformOutput,
    pub input_rows: usize,
    pub load_time: Duration,
    pub transform_time: Duration,
}

/// Load `input`, validate it against `schema` and encode it.
/// Prints STEP 1 and STEP 2 of the run.
pub fn prepare_features(input: &Path, infer_schema_length: usize, schema: &FeatureSchema) -> Result<PreparedData> {
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let (df, rows, cols, memory_mb) = load_dataset_with_progress(input, infer_schema_length)
        .with_context(|| format!("Failed to load dataset: {}", input.display()))?;

    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);
    println!("      Estimated memory: {:.2} MB", memory_mb);
    let load_time = step_start.elapsed();
    print_step_time(load_time);

    print_step_header(2, "Clean & Encode Features");
    let step_start = Instant::now();
    let spinner = create_spinner("Validating schema...");
    let records = RawRecordSet::from_dataframe(&df, schema).context("Dataset does not match the expected schema")?;
    spinner.set_message("Removing duplicates, scaling and encoding...");
    let output = FeatureTransformer::new(schema.clone())
        .fit_transform(&records)
        .context("Feature transformation failed")?;

    if output.duplicates_removed > 0 {
        finish_with_warning(
            &spinner,
            &format!("Removed {} duplicate row(s)", output.duplicates_removed),
        );
    } else {
        finish_with_success(&spinner, "No duplicate rows");
    }
    print_success(&format!(
        "Encoded {} rows into {} features ({} numeric, {} indicator)",
        output.features.nrows(),
        output.features.ncols(),
        schema.numeric.len(),
        output.features.ncols() - schema.numeric.len()
    ));
    let transform_time = step_start.elapsed();
    print_step_time(transform_time);

    Ok(PreparedData {
        output,
        input_rows: rows,
        load_time,
        transform_time,
    })
}

/// Write the clean dataset behind a spinner
pub fn save_clean_dataset(path: &Path, prepared: &TransformOutput, target: &str) -> Result<()> {
    let spinner = create_spinner("Writing clean dataset...");
    write_clean_dataset(path, &prepared.features, &prepared.labels, target)
        .with_context(|| format!("Failed to write clean dataset: {}", path.display()))?;
    finish_with_success(&spinner, &format!("Saved to {}", path.display()));
    Ok(())
}

pub fn run_preprocess(input: &Path, output: Option<&Path>, infer_schema_length: usize) -> Result<()> {
    let schema = FeatureSchema::heart_failure();
    let output_path = preprocess_output_path(input, output);

    println!(
        "\n {} Preprocessing {}",
        style("◆").cyan().bold(),
        style(input.display()).dim()
    );

    let prepared = prepare_features(input, infer_schema_length, &schema)?;

    print_step_header(3, "Save Results");
    let step_start = Instant::now();
    save_clean_dataset(&output_path, &prepared.output, &schema.target)?;
    print_step_time(step_start.elapsed());

    print_completion("Preprocessing complete!");
    Ok(())
}
