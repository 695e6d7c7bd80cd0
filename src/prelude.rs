//! Convenience re-exports for common use.

pub use crate::agent::{AgentSettings, AgentState, McpAgent, ToolAgent, ToolNaming};
pub use crate::config::{ConfigLoader, ServerDescriptor};
pub use crate::error::{HubError, Result};
pub use crate::mcp::{
    ServerStatus, ServerStatusMap, ToolFilter, Toolset, ToolsetAggregator, TransportPolicy,
};
