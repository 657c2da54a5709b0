//! Typed raw records extracted from a DataFrame
//!
//! Conversion validates the schema up front so that the transformer never
//! sees a missing column, a null or a non-numeric measurement.

use std::collections::HashSet;

use polars::prelude::*;

use super::error::{PipelineError, Result};
use super::schema::FeatureSchema;
use super::target::extract_binary_target;

/// One input row, fields ordered as in the schema
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub numeric: Vec<f64>,
    pub categorical: Vec<String>,
    pub passthrough: Vec<String>,
    pub target: u8,
}

/// Hashable identity of a row; floats compare by bit pattern with `-0.0`
/// folded into `0.0`
#[derive(Hash, PartialEq, Eq)]
struct RowKey<'a> {
    numeric: Vec<u64>,
    categorical: &'a [String],
    passthrough: &'a [String],
    target: u8,
}

impl RawRecord {
    fn key(&self) -> RowKey<'_> {
        RowKey {
            numeric: self.numeric.iter().map(|v| (v + 0.0).to_bits()).collect(),
            categorical: &self.categorical,
            passthrough: &self.passthrough,
            target: self.target,
        }
    }
}

/// Ordered rows sharing one schema
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecordSet {
    pub schema: FeatureSchema,
    pub rows: Vec<RawRecord>,
}

impl RawRecordSet {
    /// Build a record set, checking every row against the schema
    pub fn new(schema: FeatureSchema, rows: Vec<RawRecord>) -> Result<Self> {
        let set = Self { schema, rows };
        set.validate()?;
        Ok(set)
    }

    /// Check that each row carries one value per schema field and a 0/1 target
    pub fn validate(&self) -> Result<()> {
        let schema = &self.schema;
        for (idx, record) in self.rows.iter().enumerate() {
            let arity = [
                ("numeric", record.numeric.len(), schema.numeric.len()),
                ("categorical", record.categorical.len(), schema.categorical.len()),
                ("passthrough", record.passthrough.len(), schema.passthrough.len()),
            ];
            for (group, found, expected) in arity {
                if found != expected {
                    return Err(PipelineError::SchemaMismatch(format!(
                        "row {} has {} {} value(s), schema expects {}",
                        idx, found, group, expected
                    )));
                }
            }
            if record.target > 1 {
                return Err(PipelineError::InvalidTarget {
                    target: schema.target.clone(),
                    value: record.target.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Validate `df` against `schema` and convert it into typed records.
    ///
    /// Column order in the frame does not matter and extra columns are ignored.
    pub fn from_dataframe(df: &DataFrame, schema: &FeatureSchema) -> Result<Self> {
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        if !columns.contains(&schema.target) {
            return Err(PipelineError::MissingTarget {
                target: schema.target.clone(),
                available: columns,
            });
        }

        let missing = schema.missing_inputs(&columns);
        if !missing.is_empty() {
            return Err(PipelineError::SchemaMismatch(format!(
                "missing column(s) {:?}; available columns: {:?}",
                missing, columns
            )));
        }

        let targets = extract_binary_target(df, &schema.target)?;

        let numeric: Vec<Vec<f64>> = schema
            .numeric
            .iter()
            .map(|name| numeric_values(df, name))
            .collect::<Result<_>>()?;
        let categorical: Vec<Vec<String>> = schema
            .categorical
            .iter()
            .map(|name| string_values(df, name))
            .collect::<Result<_>>()?;
        let passthrough: Vec<Vec<String>> = schema
            .passthrough
            .iter()
            .map(|name| string_values(df, name))
            .collect::<Result<_>>()?;

        let rows = targets
            .iter()
            .enumerate()
            .map(|(row, &target)| RawRecord {
                numeric: numeric.iter().map(|col| col[row]).collect(),
                categorical: categorical.iter().map(|col| col[row].clone()).collect(),
                passthrough: passthrough.iter().map(|col| col[row].clone()).collect(),
                target,
            })
            .collect();

        Ok(Self {
            schema: schema.clone(),
            rows,
        })
    }

    /// Remove exact duplicate rows, keeping the first occurrence of each
    pub fn deduplicated(&self) -> Self {
        let mut seen = HashSet::with_capacity(self.rows.len());
        let kept: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, record)| seen.insert(record.key()))
            .map(|(idx, _)| idx)
            .collect();

        Self {
            schema: self.schema.clone(),
            rows: kept.into_iter().map(|idx| self.rows[idx].clone()).collect(),
        }
    }

    /// Label of every row, in order
    pub fn labels(&self) -> Vec<u8> {
        self.rows.iter().map(|r| r.target).collect()
    }
}

fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df.column(name)?;
    if !column.dtype().is_primitive_numeric() {
        return Err(PipelineError::SchemaMismatch(format!(
            "numeric column '{}' has non-numeric type {}",
            name,
            column.dtype()
        )));
    }

    let cast = column.cast(&DataType::Float64)?;
    cast.f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) if v.is_finite() => Ok(v),
            Some(v) => Err(PipelineError::SchemaMismatch(format!(
                "numeric column '{}' has non-finite value {} at row {}",
                name, v, row
            ))),
            None => Err(PipelineError::MissingValue {
                column: name.to_string(),
                row,
            }),
        })
        .collect()
}

fn string_values(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let cast = df.column(name)?.cast(&DataType::String)?;
    cast.str()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value
                .map(|s| s.to_string())
                .ok_or_else(|| PipelineError::MissingValue {
                    column: name.to_string(),
                    row,
                })
        })
        .collect()
}
