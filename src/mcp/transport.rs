//! MCP transport layer.

use async_trait::async_trait;
use rmcp::model::ClientInfo;
use rmcp::service::{ClientInitializeError, DynService, RoleClient, RunningService};

pub type DynClientService = Box<dyn DynService<RoleClient>>;
pub type MCPRunningService = RunningService<RoleClient, DynClientService>;

/// Transport trait for MCP communication.
#[async_trait]
pub trait MCPTransport: Send {
    /// Create and initialize a new rmcp running service for this transport.
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> Result<MCPRunningService, ClientInitializeError>;

    /// Human-readable dial target, used in logs.
    fn describe(&self) -> String;
}

mod http;
mod stdio;

pub use http::StreamableHttpTransport;
pub use stdio::StdioTransport;
