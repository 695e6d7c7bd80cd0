//! Model Context Protocol (MCP) client, toolsets, and multi-server aggregation.

pub mod aggregate;
pub mod client;
pub mod params;
pub mod schema;
pub mod toolset;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregate::{
    Aggregation, AggregationConfig, ServerStatus, ServerStatusMap, ToolsetAggregator,
};
pub use client::{MCPClient, MCPToolCallResult};
pub use params::{ConnectionParams, ConnectionParamsBuilder, TransportPolicy};
pub use schema::{MCPResourceSchema, MCPToolSchema, SchemaBuilder};
pub use toolset::{RemoteToolset, RmcpConnector, ToolFilter, Toolset, ToolsetConnector};
pub use transport::{MCPTransport, StdioTransport, StreamableHttpTransport};
