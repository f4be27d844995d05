//! rtdeploy - build, upload and run benchmark scripts on remote test machines

use std::process::ExitCode;

use clap::Parser;
use rtdeploy_cli::cli::Cli;
use rtdeploy_cli::domain::ConfigError;
use rtdeploy_cli::output::json::format_error;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.json;
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            let message = format!("{e:#}");
            match format_error(&message, error_code(&e)) {
                Ok(obj) if json => println!("{obj}"),
                _ => eprintln!("Error: {message}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn error_code(e: &anyhow::Error) -> &'static str {
    match e.downcast_ref::<ConfigError>() {
        Some(ConfigError::UnknownTarget { .. }) => "UNKNOWN_TARGET",
        Some(ConfigError::NoTargets(_)) => "NO_TARGETS",
        Some(ConfigError::InvalidConfiguration { .. }) => "INVALID_CONFIGURATION",
        None => "ERROR",
    }
}
