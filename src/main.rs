//! patchflow command-line entry point

mod cli;

use clap::Parser;
use cli::{Cli, print_error};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter
const LOG_ENV_VAR: &str = "PATCHFLOW_LOG";

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("patchflow=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli::run(cli).await {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            print_error(&err);
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}
