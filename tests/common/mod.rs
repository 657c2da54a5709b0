//! Shared test utilities and fixture generators

#![allow(dead_code)]

use cardiofit::pipeline::FeatureSchema;
use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Schema with one numeric and one categorical field, target `y`
pub fn toy_schema() -> FeatureSchema {
    FeatureSchema::new(&["x"], &["c"], &[], "y")
}

/// 10 rows, rows 4 and 9 repeat rows 0 and 2 exactly.
/// After de-duplication: 8 rows, categories "a" and "b".
pub fn toy_dataframe() -> DataFrame {
    df! {
        "x" => [1.0f64, 2.0, 3.0, 4.0, 1.0, 5.0, 6.0, 7.0, 8.0, 3.0],
        "c" => ["a", "b", "a", "b", "a", "a", "b", "a", "b", "a"],
        "y" => [0i64, 1, 0, 1, 0, 0, 1, 1, 0, 0],
    }
    .unwrap()
}

/// Same layout as `toy_dataframe` but `x` is constant
pub fn constant_numeric_dataframe() -> DataFrame {
    df! {
        "x" => [5.0f64; 6],
        "c" => ["a", "b", "a", "b", "a", "b"],
        "y" => [0i64, 1, 0, 1, 0, 1],
    }
    .unwrap()
}

fn pick<'a>(rng: &mut ChaCha8Rng, options: &[&'a str]) -> &'a str {
    options[rng.gen_range(0..options.len())]
}

/// Deterministic synthetic heart-failure dataset with the full 12-column schema.
///
/// Positive rows lean towards older age, flat ST slope, exercise angina and a
/// higher Oldpeak, with enough noise that the classes overlap.
pub fn heart_dataframe(rows: usize, seed: u64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut age = Vec::with_capacity(rows);
    let mut sex = Vec::with_capacity(rows);
    let mut chest_pain = Vec::with_capacity(rows);
    let mut resting_bp = Vec::with_capacity(rows);
    let mut cholesterol = Vec::with_capacity(rows);
    let mut fasting_bs = Vec::with_capacity(rows);
    let mut resting_ecg = Vec::with_capacity(rows);
    let mut max_hr = Vec::with_capacity(rows);
    let mut angina = Vec::with_capacity(rows);
    let mut oldpeak = Vec::with_capacity(rows);
    let mut st_slope = Vec::with_capacity(rows);
    let mut target = Vec::with_capacity(rows);

    for _ in 0..rows {
        let sick = rng.gen_bool(0.5);
        let noisy = rng.gen_bool(0.1);
        let signal = sick != noisy;

        age.push(if signal { rng.gen_range(50i64..78) } else { rng.gen_range(30i64..60) });
        sex.push(if rng.gen_bool(if signal { 0.8 } else { 0.5 }) { "M" } else { "F" });
        chest_pain.push(if signal {
            pick(&mut rng, &["ASY", "ASY", "NAP"])
        } else {
            pick(&mut rng, &["ATA", "NAP", "TA"])
        });
        resting_bp.push(rng.gen_range(100i64..180));
        cholesterol.push(rng.gen_range(150i64..350));
        fasting_bs.push(i64::from(rng.gen_bool(0.2)));
        resting_ecg.push(pick(&mut rng, &["Normal", "ST", "LVH"]));
        max_hr.push(if signal { rng.gen_range(90i64..150) } else { rng.gen_range(130i64..200) });
        angina.push(if rng.gen_bool(if signal { 0.7 } else { 0.15 }) { "Y" } else { "N" });
        oldpeak.push(if signal {
            f64::from(rng.gen_range(8u8..35)) / 10.0
        } else {
            f64::from(rng.gen_range(0u8..12)) / 10.0
        });
        st_slope.push(if signal {
            pick(&mut rng, &["Flat", "Flat", "Down"])
        } else {
            pick(&mut rng, &["Up", "Up", "Flat"])
        });
        target.push(i64::from(sick));
    }

    df! {
        "Age" => age,
        "Sex" => sex,
        "ChestPainType" => chest_pain,
        "RestingBP" => resting_bp,
        "Cholesterol" => cholesterol,
        "FastingBS" => fasting_bs,
        "RestingECG" => resting_ecg,
        "MaxHR" => max_hr,
        "ExerciseAngina" => angina,
        "Oldpeak" => oldpeak,
        "ST_Slope" => st_slope,
        "HeartDisease" => target,
    }
    .unwrap()
}

/// Write `df` as CSV into `dir`
pub fn write_csv(dir: &Path, name: &str, df: &mut DataFrame) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
    path
}

/// Create a temporary directory holding `heart.csv` with `rows` synthetic rows
pub fn create_heart_csv(rows: usize, seed: u64) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let mut df = heart_dataframe(rows, seed);
    let path = write_csv(temp_dir.path(), "heart.csv", &mut df);
    (temp_dir, path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a slice of values has (approximately) mean 0 and population std 1
pub fn assert_standardized(values: &[f64]) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    assert!(mean.abs() < 1e-9, "mean should be 0, got {}", mean);
    assert!((var.sqrt() - 1.0).abs() < 1e-9, "std should be 1, got {}", var.sqrt());
}
