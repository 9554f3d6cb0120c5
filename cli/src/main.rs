//! efsml - serverless deep-learning inference stack on Lambda and EFS

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use efsml_cli::cli::Cli;
use efsml_cli::output::json::{error_code, format_error};

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "EFSML_LOG";

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let json = cli.json;
    match cli.run() {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            let message = format!("{e:#}");
            match json.then(|| format_error(&message, error_code(&e))) {
                Some(Ok(obj)) => println!("{obj}"),
                _ => eprintln!("Error: {message}"),
            }
            ExitCode::FAILURE
        }
    }
}
