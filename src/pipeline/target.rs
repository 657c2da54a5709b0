//! Binary target extraction
//!
//! The label column must hold only 0 and 1. Integer and float encodings are
//! both accepted, since CSV inference may read the column either way.

use polars::prelude::*;

use super::error::{PipelineError, Result};

/// Tolerance for floating point comparison when checking binary 0/1 values
const TOLERANCE: f64 = 1e-9;

/// Extract the target column as a 0/1 label vector, row order preserved
///
/// # Errors
/// - `MissingTarget` if the column is absent
/// - `MissingValue` for a null label
/// - `InvalidTarget` for any value other than 0 or 1
pub fn extract_binary_target(df: &DataFrame, target: &str) -> Result<Vec<u8>> {
    let target_col = df.column(target).map_err(|_| PipelineError::MissingTarget {
        target: target.to_string(),
        available: df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect(),
    })?;

    if !target_col.dtype().is_primitive_numeric() && !target_col.dtype().is_bool() {
        let sample = target_col
            .get(0)
            .map(|v| v.to_string())
            .unwrap_or_else(|_| "<empty>".to_string());
        return Err(PipelineError::InvalidTarget {
            target: target.to_string(),
            value: sample,
        });
    }

    let float_col = target_col.cast(&DataType::Float64)?;
    let values = float_col.f64()?;

    let mut labels = Vec::with_capacity(values.len());
    for (row, value) in values.into_iter().enumerate() {
        match value {
            Some(v) if v.abs() < TOLERANCE => labels.push(0),
            Some(v) if (v - 1.0).abs() < TOLERANCE => labels.push(1),
            Some(v) => {
                return Err(PipelineError::InvalidTarget {
                    target: target.to_string(),
                    value: format!("{}", v),
                })
            }
            None => {
                return Err(PipelineError::MissingValue {
                    column: target.to_string(),
                    row,
                })
            }
        }
    }

    Ok(labels)
}

/// Count of (class 0, class 1) labels
pub fn class_counts(labels: &[u8]) -> (usize, usize) {
    let positives = labels.iter().filter(|&&l| l == 1).count();
    (labels.len() - positives, positives)
}
