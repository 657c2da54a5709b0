//! Fitted encoder state: standard scaling and one-hot vocabularies
//!
//! The state is a plain value. It is produced by [`FittedEncoder::fit`],
//! returned to the caller and can be serialized for later reuse.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::error::{PipelineError, Result};
use super::records::RawRecordSet;
use super::schema::FeatureSchema;

/// Mean and population standard deviation of one numeric field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericScaler {
    pub field: String,
    pub mean: f64,
    pub std: f64,
}

impl NumericScaler {
    /// Fit on the values of one field.
    ///
    /// Fails with `DegenerateFeature` when every value is identical.
    pub fn fit(field: &str, values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(PipelineError::InsufficientData(format!(
                "cannot compute statistics for '{}' without rows",
                field
            )));
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();

        let constant = values.iter().all(|&v| v == values[0]);
        if constant || std == 0.0 {
            return Err(PipelineError::DegenerateFeature {
                feature: field.to_string(),
                value: values[0],
            });
        }

        Ok(Self {
            field: field.to_string(),
            mean,
            std,
        })
    }

    #[inline]
    pub fn scale(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }
}

/// Observed categories of one field, in first-seen order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    pub field: String,
    pub categories: Vec<String>,
}

impl CategoryVocabulary {
    pub fn fit<'a>(field: &str, values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut categories: Vec<String> = Vec::new();
        for value in values {
            if !categories.iter().any(|c| c == value) {
                categories.push(value.to_string());
            }
        }
        Self {
            field: field.to_string(),
            categories,
        }
    }

    /// Indicator position of `value`; `None` for categories unseen at fit time
    pub fn position(&self, value: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == value)
    }

    /// Engineered column names, `<field>_<category>`
    pub fn column_names(&self) -> impl Iterator<Item = String> + '_ {
        self.categories
            .iter()
            .map(move |category| format!("{}_{}", self.field, category))
    }
}

/// Everything learned during fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedEncoder {
    pub schema: FeatureSchema,
    pub scalers: Vec<NumericScaler>,
    pub vocabularies: Vec<CategoryVocabulary>,
}

impl FittedEncoder {
    /// Learn scaling statistics and vocabularies from `records`
    pub fn fit(records: &RawRecordSet) -> Result<Self> {
        records.validate()?;
        let schema = &records.schema;

        let scalers = schema
            .numeric
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let values: Vec<f64> = records.rows.iter().map(|r| r.numeric[idx]).collect();
                NumericScaler::fit(field, &values)
            })
            .collect::<Result<Vec<_>>>()?;

        let vocabularies = schema
            .categorical
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                CategoryVocabulary::fit(field, records.rows.iter().map(|r| r.categorical[idx].as_str()))
            })
            .collect();

        Ok(Self {
            schema: schema.clone(),
            scalers,
            vocabularies,
        })
    }

    /// Names of the output columns: numeric fields, then indicators
    pub fn feature_names(&self) -> Vec<String> {
        self.scalers
            .iter()
            .map(|s| s.field.clone())
            .chain(self.vocabularies.iter().flat_map(|v| v.column_names()))
            .collect()
    }

    pub fn n_features(&self) -> usize {
        self.scalers.len()
            + self
                .vocabularies
                .iter()
                .map(|v| v.categories.len())
                .sum::<usize>()
    }

    /// Encode `records` into a dense matrix.
    ///
    /// Categories missing from the fitted vocabulary leave that field's
    /// indicators all zero.
    pub fn transform(&self, records: &RawRecordSet) -> Result<Array2<f64>> {
        if records.schema != self.schema {
            return Err(PipelineError::SchemaMismatch(
                "records do not share the schema the encoder was fitted on".to_string(),
            ));
        }
        records.validate()?;

        let mut matrix = Array2::<f64>::zeros((records.len(), self.n_features()));

        for (row_idx, record) in records.rows.iter().enumerate() {
            let mut row = matrix.row_mut(row_idx);

            for (col, scaler) in self.scalers.iter().enumerate() {
                row[col] = scaler.scale(record.numeric[col]);
            }

            let mut offset = self.scalers.len();
            for (field_idx, vocabulary) in self.vocabularies.iter().enumerate() {
                if let Some(pos) = vocabulary.position(&record.categorical[field_idx]) {
                    row[offset + pos] = 1.0;
                }
                offset += vocabulary.categories.len();
            }
        }

        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::records::RawRecord;

    fn records(rows: &[(f64, &str)]) -> RawRecordSet {
        RawRecordSet::new(
            FeatureSchema::new(&["x"], &["c"], &[], "y"),
            rows.iter()
                .map(|&(x, c)| RawRecord {
                    numeric: vec![x],
                    categorical: vec![c.to_string()],
                    passthrough: vec![],
                    target: 0,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_scaler_uses_population_std() {
        let scaler = NumericScaler::fit("x", &[1.0, 3.0]).unwrap();
        assert_eq!(scaler.mean, 2.0);
        assert_eq!(scaler.std, 1.0);
        assert_eq!(scaler.scale(3.0), 1.0);
    }

    #[test]
    fn test_scaler_json_keeps_exact_bits() {
        let scaler = NumericScaler {
            field: "Cholesterol".to_string(),
            mean: 253.958_333_333_333_34,
            std: 11.787_396_164_265_175,
        };
        let restored: NumericScaler = serde_json::from_str(&serde_json::to_string(&scaler).unwrap()).unwrap();

        assert_eq!(restored.mean.to_bits(), scaler.mean.to_bits());
        assert_eq!(restored.std.to_bits(), scaler.std.to_bits());
    }

    #[test]
    fn test_constant_field_is_degenerate() {
        let err = NumericScaler::fit("x", &[0.1, 0.1, 0.1]).unwrap_err();
        match err {
            PipelineError::DegenerateFeature { feature, value } => {
                assert_eq!(feature, "x");
                assert_eq!(value, 0.1);
            }
            other => panic!("Expected DegenerateFeature, got {:?}", other),
        }
    }

    #[test]
    fn test_vocabulary_first_seen_order() {
        let vocab = CategoryVocabulary::fit("ChestPainType", ["TA", "ASY", "TA", "NAP"]);
        assert_eq!(vocab.categories, vec!["TA", "ASY", "NAP"]);
        assert_eq!(
            vocab.column_names().collect::<Vec<_>>(),
            vec!["ChestPainType_TA", "ChestPainType_ASY", "ChestPainType_NAP"]
        );
    }

    #[test]
    fn test_unknown_category_encodes_to_zeros() {
        let encoder = FittedEncoder::fit(&records(&[(1.0, "a"), (2.0, "b")])).unwrap();
        let matrix = encoder.transform(&records(&[(1.5, "zzz")])).unwrap();

        assert_eq!(matrix.ncols(), 3);
        assert_eq!(matrix[[0, 0]], 0.0);
        assert_eq!(matrix[[0, 1]], 0.0);
        assert_eq!(matrix[[0, 2]], 0.0);
    }

    #[test]
    fn test_short_row_is_schema_mismatch() {
        let mut set = records(&[(1.0, "a"), (2.0, "b")]);
        set.rows[1].numeric.clear();

        assert!(matches!(FittedEncoder::fit(&set), Err(PipelineError::SchemaMismatch(_))));

        let encoder = FittedEncoder::fit(&records(&[(1.0, "a"), (2.0, "b")])).unwrap();
        assert!(matches!(encoder.transform(&set), Err(PipelineError::SchemaMismatch(_))));
    }

    #[test]
    fn test_feature_names_layout() {
        let encoder = FittedEncoder::fit(&records(&[(1.0, "b"), (2.0, "a")])).unwrap();
        assert_eq!(encoder.feature_names(), vec!["x", "c_b", "c_a"]);
        assert_eq!(encoder.n_features(), 3);
    }

    #[test]
    fn test_encoder_round_trips_through_json() {
        let encoder = FittedEncoder::fit(&records(&[(1.0, "a"), (5.0, "b")])).unwrap();
        let json = serde_json::to_string(&encoder).unwrap();
        let restored: FittedEncoder = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, encoder);
    }
}
