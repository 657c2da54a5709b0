//! Column layout of the clinical dataset

use serde::{Deserialize, Serialize};

/// Name of the binary target in the heart-failure dataset
pub const HEART_DISEASE_TARGET: &str = "HeartDisease";

/// Continuous or integer measurements, standardized during transform
pub const HEART_NUMERIC_FIELDS: [&str; 5] = ["Age", "RestingBP", "Cholesterol", "MaxHR", "Oldpeak"];

/// Low-cardinality string fields, one-hot encoded during transform
pub const HEART_CATEGORICAL_FIELDS: [&str; 5] =
    ["Sex", "ChestPainType", "RestingECG", "ExerciseAngina", "ST_Slope"];

/// Fields that must be present but are not encoded
pub const HEART_PASSTHROUGH_FIELDS: [&str; 1] = ["FastingBS"];

/// Partition of the input columns into numeric, categorical, passthrough and target.
///
/// Numeric fields keep their order in the feature matrix; categorical fields
/// contribute their indicator columns in the order listed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    /// Validated and used for de-duplication, never encoded
    pub passthrough: Vec<String>,
    pub target: String,
}

impl FeatureSchema {
    pub fn new(numeric: &[&str], categorical: &[&str], passthrough: &[&str], target: &str) -> Self {
        Self {
            numeric: numeric.iter().map(|s| s.to_string()).collect(),
            categorical: categorical.iter().map(|s| s.to_string()).collect(),
            passthrough: passthrough.iter().map(|s| s.to_string()).collect(),
            target: target.to_string(),
        }
    }

    /// The fixed heart-failure prediction schema
    pub fn heart_failure() -> Self {
        Self::new(
            &HEART_NUMERIC_FIELDS,
            &HEART_CATEGORICAL_FIELDS,
            &HEART_PASSTHROUGH_FIELDS,
            HEART_DISEASE_TARGET,
        )
    }

    /// Every input field except the target
    pub fn input_fields(&self) -> impl Iterator<Item = &str> {
        self.numeric
            .iter()
            .chain(&self.categorical)
            .chain(&self.passthrough)
            .map(|s| s.as_str())
    }

    /// Names from this schema that are absent in `columns` (target excluded)
    pub fn missing_inputs(&self, columns: &[String]) -> Vec<String> {
        self.input_fields()
            .filter(|field| !columns.iter().any(|c| c == field))
            .map(|field| field.to_string())
            .collect()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::heart_failure()
    }
}
