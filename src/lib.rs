//! Cardiofit: Heart-Failure Classification Library
//!
//! Cleans and encodes a tabular clinical dataset, selects random-forest
//! hyperparameters by cross-validated grid search, evaluates the refit
//! model on a held-out split and records the run with an experiment tracker.

pub mod cli;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod tracking;
pub mod utils;
