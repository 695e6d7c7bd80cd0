//! Demo e-commerce MCP server binary.

use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Ecommerce MCP server over streamable HTTP
#[derive(Parser, Debug)]
#[command(name = "ecommerce-server", version, about)]
struct Args {
    /// Port to run the server on
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Host to bind the server to
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Logging level
    #[arg(long, default_value = "INFO")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.to_lowercase()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting Ecommerce MCP Server...");
    let listener = match TcpListener::bind((args.host.as_str(), args.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}:{}: {e}", args.host, args.port);
            return ExitCode::FAILURE;
        }
    };

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Server shutting down gracefully...");
    };
    match ecommerce_mcp::server::serve(listener, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
