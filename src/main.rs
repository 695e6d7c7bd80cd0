//! ecommerce-mcp CLI binary entry point.

use std::process::ExitCode;

use clap::Parser;
use ecommerce_mcp::cli::{commands, errors::format_error_help, Cli};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", format_error_help(&e));
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "ecommerce_mcp={level},{}",
            if verbosity >= 2 { "info" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .init();
}
