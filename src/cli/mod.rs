//! CLI module - argument parsing and command runners

pub mod args;
pub mod preprocess;
pub mod train;

pub use args::{preprocess_output_path, Cli, Commands, TrainArgs};
pub use preprocess::run_preprocess;
pub use train::run_train;
