//! Cardiofit: Heart-Failure Classification CLI
//!
//! Trains a random-forest classifier on a heart-failure dataset with
//! cross-validated grid search and records the run in a local experiment store.

use std::process::ExitCode;

use clap::Parser;

use cardiofit::cli::{run_preprocess, run_train, Cli, Commands};
use cardiofit::pipeline::PipelineError;
use cardiofit::utils::print_error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let result = match &cli.command {
        Some(Commands::Preprocess {
            input,
            output,
            infer_schema_length,
        }) => run_preprocess(input, output.as_deref(), *infer_schema_length),
        None => run_train(&cli.train),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let (kind, code) = match err.downcast_ref::<PipelineError>() {
                Some(pipeline_err) => (pipeline_err.kind(), pipeline_err.exit_code()),
                None => ("Error", 1),
            };
            log::debug!("{:?}", err);
            print_error(kind, &format!("{:#}", err));
            ExitCode::from(code)
        }
    }
}
