//! Multi-server MCP toolset aggregation for LLM agents.
//!
//! Reads a JSON document of MCP server descriptors, connects to each server
//! over streamable HTTP (or stdio, when enabled), and gathers the advertised
//! tools into one agent with a per-server status snapshot.
//!
//! ```no_run
//! use ecommerce_mcp::prelude::*;
//!
//! # async fn example() -> ecommerce_mcp::error::Result<()> {
//! let mut agent = McpAgent::new(AgentSettings::default(), ConfigLoader::from_env());
//! agent.build().await?;
//! for (server, status) in agent.get_server_status() {
//!     println!("{server}: {status}");
//! }
//! agent.close().await;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod mcp;
pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "demo-server")]
pub mod server;
