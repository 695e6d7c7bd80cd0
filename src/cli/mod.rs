//! Command-line interface for inspecting and driving configured MCP servers.

pub mod commands;
pub mod errors;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ecommerce-mcp: connect an agent to MCP tool servers
#[derive(Parser, Debug)]
#[command(name = "ecommerce-mcp", version, about = "Inspect and call tools on configured MCP servers")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Server configuration document (defaults to $MCP_CONFIG_PATH, then server-config/servers.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Give up on a server after this many milliseconds
    #[arg(long, global = true)]
    pub connect_timeout_ms: Option<u64>,

    /// Expose tools as `<server>__<tool>`
    #[arg(long, global = true)]
    pub namespace_tools: bool,

    /// Also spawn servers declared with `"type": "stdio"`
    #[arg(long, global = true)]
    pub allow_stdio: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to every configured server and print its status
    Status,
    /// List every tool the agent can route to
    Tools,
    /// Call one tool through the agent
    Call(CallArgs),
    /// Connect to a single server URL and list what it advertises
    Probe(ProbeArgs),
}

/// Arguments for the `call` subcommand.
#[derive(Parser, Debug)]
pub struct CallArgs {
    /// Tool name as listed by `tools`
    pub tool: String,

    /// JSON object of tool arguments
    #[arg(short, long, default_value = "{}")]
    pub args: String,
}

/// Arguments for the `probe` subcommand.
#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Streamable HTTP endpoint, e.g. http://localhost:8000/mcp
    pub url: String,
}
