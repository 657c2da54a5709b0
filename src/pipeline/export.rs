//! Clean dataset checkpoint: engineered features plus the original target

use std::path::Path;

use polars::prelude::*;

use super::error::{PipelineError, Result};
use super::transformer::FeatureMatrix;

/// Build a DataFrame with one column per feature and the target appended as integers
pub fn clean_dataframe(features: &FeatureMatrix, labels: &[u8], target: &str) -> Result<DataFrame> {
    if labels.len() != features.nrows() {
        return Err(PipelineError::SchemaMismatch(format!(
            "{} labels for {} feature rows",
            labels.len(),
            features.nrows()
        )));
    }

    let mut columns: Vec<Column> = features
        .columns
        .iter()
        .enumerate()
        .map(|(idx, name)| Column::new(name.as_str().into(), features.values.column(idx).to_vec()))
        .collect();

    let target_values: Vec<i32> = labels.iter().map(|&l| l as i32).collect();
    columns.push(Column::new(target.into(), target_values));

    Ok(DataFrame::new(columns)?)
}

/// Save the clean dataset (CSV or Parquet based on extension)
pub fn write_clean_dataset(
    path: &Path,
    features: &FeatureMatrix,
    labels: &[u8],
    target: &str,
) -> Result<()> {
    let mut df = clean_dataframe(features, labels, target)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    match extension.as_str() {
        "csv" => {
            let mut file = std::fs::File::create(path)?;
            CsvWriter::new(&mut file).finish(&mut df)?;
        }
        "parquet" => {
            let file = std::fs::File::create(path)?;
            ParquetWriter::new(file).finish(&mut df)?;
        }
        _ => {
            return Err(PipelineError::InvalidConfig(format!(
                "Unsupported output format: '{}'. Supported formats: csv, parquet",
                extension
            )))
        }
    }

    Ok(())
}
