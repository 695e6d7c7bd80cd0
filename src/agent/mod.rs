//! Agent facade: one queryable agent over every configured MCP server.

pub mod agent;
pub mod wrapper;

pub use agent::{AgentFactory, AgentSpec, AgentTool, DefaultAgentFactory, ToolAgent, ToolNaming};
pub use wrapper::{AgentSettings, AgentState, McpAgent};
