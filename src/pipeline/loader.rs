//! Dataset loader for CSV and Parquet files

use std::path::Path;

use polars::prelude::*;

use super::error::{PipelineError, Result};
use crate::utils::{create_spinner, finish_with_success};

/// Load a dataset from a file (CSV or Parquet based on extension)
///
/// # Arguments
/// * `path` - Input file; must exist
/// * `infer_schema_length` - Rows used for CSV type inference, 0 for a full scan
pub fn load_dataset(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    let df = scan_dataset(path, infer_schema_length)?.collect()?;
    Ok(df)
}

/// Load a dataset behind a spinner, returning it with its shape and estimated size in MB
pub fn load_dataset_with_progress(
    path: &Path,
    infer_schema_length: usize,
) -> Result<(DataFrame, usize, usize, f64)> {
    let spinner = create_spinner(&format!("Loading {}...", path.display()));
    let df = load_dataset(path, infer_schema_length)?;
    let (rows, cols) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);
    finish_with_success(&spinner, &format!("Loaded {} rows × {} columns", rows, cols));
    Ok((df, rows, cols, memory_mb))
}

/// Read only the column names of a dataset
pub fn get_column_names(path: &Path) -> Result<Vec<String>> {
    let mut lf = scan_dataset(path, 100)?;
    let schema = lf.collect_schema()?;
    Ok(schema.iter_names().map(|name| name.to_string()).collect())
}

fn scan_dataset(path: &Path, infer_schema_length: usize) -> Result<LazyFrame> {
    if !path.exists() {
        return Err(PipelineError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    // 0 means full table scan
    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_infer_schema_length(schema_length)
            .finish()?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())?,
        _ => {
            return Err(PipelineError::InvalidConfig(format!(
                "Unsupported file format: '{}'. Supported formats: csv, parquet",
                extension
            )))
        }
    };

    Ok(lf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_input_not_found() {
        let err = load_dataset(Path::new("/nonexistent/heart.csv"), 100).unwrap_err();
        assert!(matches!(err, PipelineError::InputNotFound { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("heart.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "a,b").unwrap();
        drop(file);

        let err = load_dataset(&path, 100).unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"));
    }

    #[test]
    fn test_column_names_from_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("heart.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Age,Sex,HeartDisease").unwrap();
        writeln!(file, "40,M,0").unwrap();
        drop(file);

        let names = get_column_names(&path).unwrap();
        assert_eq!(names, vec!["Age", "Sex", "HeartDisease"]);
    }
}
