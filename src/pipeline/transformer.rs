//! Feature transformer: raw records to a numeric feature matrix
//!
//! Steps, in order:
//! 1. drop exact duplicate rows (first occurrence kept)
//! 2. separate the label vector
//! 3. standardize numeric fields
//! 4. one-hot encode categorical fields
//!
//! The fitted encoder is returned alongside the matrix instead of being kept
//! inside the transformer.

use ndarray::{Array2, ArrayView1};
use polars::prelude::*;

use super::encoder::FittedEncoder;
use super::error::{PipelineError, Result};
use super::records::RawRecordSet;
use super::schema::FeatureSchema;

/// Dense feature matrix with named columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if columns.len() != values.ncols() {
            return Err(PipelineError::SchemaMismatch(format!(
                "{} column names for a matrix with {} columns",
                columns.len(),
                values.ncols()
            )));
        }
        Ok(Self { columns, values })
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name).map(|idx| self.values.column(idx))
    }
}

/// Output of one fit/transform cycle
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub features: FeatureMatrix,
    pub labels: Vec<u8>,
    pub encoder: FittedEncoder,
    /// Rows removed as exact duplicates
    pub duplicates_removed: usize,
}

/// Converts raw records of a fixed schema into model-ready features
#[derive(Debug, Clone, Default)]
pub struct FeatureTransformer {
    schema: FeatureSchema,
}

impl FeatureTransformer {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Fit the encoder on `records` and transform them in one pass
    ///
    /// # Errors
    /// - `InsufficientData` for an empty record set
    /// - `SchemaMismatch` if the records were built for another schema
    /// - `DegenerateFeature` for a numeric field that is constant after de-duplication
    pub fn fit_transform(&self, records: &RawRecordSet) -> Result<TransformOutput> {
        if records.schema != self.schema {
            return Err(PipelineError::SchemaMismatch(
                "record set schema differs from the transformer schema".to_string(),
            ));
        }
        if records.is_empty() {
            return Err(PipelineError::InsufficientData(
                "the dataset contains no rows".to_string(),
            ));
        }

        let unique = records.deduplicated();
        let duplicates_removed = records.len() - unique.len();
        if duplicates_removed > 0 {
            log::debug!("Removed {} duplicate row(s)", duplicates_removed);
        }

        let labels = unique.labels();
        let encoder = FittedEncoder::fit(&unique)?;
        let values = encoder.transform(&unique)?;
        let features = FeatureMatrix::new(encoder.feature_names(), values)?;

        Ok(TransformOutput {
            features,
            labels,
            encoder,
            duplicates_removed,
        })
    }

    /// Validate and convert a DataFrame, then fit and transform it
    pub fn fit_transform_frame(&self, df: &DataFrame) -> Result<TransformOutput> {
        let records = RawRecordSet::from_dataframe(df, &self.schema)?;
        self.fit_transform(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_frame() -> DataFrame {
        df! {
            "x" => [1.0f64, 2.0, 3.0, 1.0, 4.0],
            "c" => ["a", "b", "a", "a", "b"],
            "y" => [0i64, 1, 0, 0, 1],
        }
        .unwrap()
    }

    #[test]
    fn test_fit_transform_frame_shape_and_names() {
        let transformer = FeatureTransformer::new(FeatureSchema::new(&["x"], &["c"], &[], "y"));
        let output = transformer.fit_transform_frame(&toy_frame()).unwrap();

        assert_eq!(output.duplicates_removed, 1);
        assert_eq!(output.features.nrows(), 4);
        assert_eq!(output.features.columns, vec!["x", "c_a", "c_b"]);
        assert_eq!(output.labels, vec![0, 1, 0, 1]);
    }

    #[test]
    fn test_column_lookup() {
        let transformer = FeatureTransformer::new(FeatureSchema::new(&["x"], &["c"], &[], "y"));
        let output = transformer.fit_transform_frame(&toy_frame()).unwrap();

        let indicator = output.features.column("c_b").unwrap();
        assert_eq!(indicator.to_vec(), vec![0.0, 1.0, 0.0, 1.0]);
        assert!(output.features.column("c_z").is_none());
    }

    #[test]
    fn test_schema_mismatch_between_records_and_transformer() {
        let other = FeatureSchema::new(&["x"], &[], &[], "y");
        let records = RawRecordSet::new(other, vec![]).unwrap();
        let err = FeatureTransformer::default().fit_transform(&records).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch(_)));
    }

    #[test]
    fn test_empty_records_rejected() {
        let schema = FeatureSchema::new(&["x"], &["c"], &[], "y");
        let records = RawRecordSet::new(schema.clone(), vec![]).unwrap();
        let err = FeatureTransformer::new(schema).fit_transform(&records).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData(_)));
    }

    #[test]
    fn test_matrix_rejects_mismatched_names() {
        let err = FeatureMatrix::new(vec!["a".to_string()], Array2::zeros((2, 2))).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch(_)));
    }
}
