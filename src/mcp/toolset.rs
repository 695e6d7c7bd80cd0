//! Per-server toolsets backed by an MCP session.

use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{HubError, Result};

use super::client::{MCPClient, MCPToolCallResult};
use super::params::ConnectionParams;
use super::schema::{MCPResourceSchema, MCPToolSchema};

/// Allow-list applied to the tools a server advertises.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolFilter {
    allowed: BTreeSet<String>,
}

impl ToolFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, tool_name: &str) -> bool {
        self.allowed.contains(tool_name)
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

/// Tools and resources advertised by one server, plus the session to use them.
#[async_trait]
pub trait Toolset: Send {
    fn server_name(&self) -> &str;

    /// Tools from the most recent [`Toolset::get_tools`] call.
    fn tools(&self) -> &[MCPToolSchema];

    /// Fetch the advertised tools, applying the toolset's filter.
    async fn get_tools(&mut self) -> Result<Vec<MCPToolSchema>>;

    async fn get_resources(&mut self) -> Result<Vec<MCPResourceSchema>>;

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult>;

    /// Release the session. Only the first call reaches the server.
    async fn close(&mut self) -> Result<()>;
}

/// Opens toolsets for connection parameters.
#[async_trait]
pub trait ToolsetConnector: Send + Sync {
    async fn open(
        &self,
        server_name: &str,
        params: &ConnectionParams,
        filter: Option<&ToolFilter>,
    ) -> Result<Box<dyn Toolset>>;
}

/// Connector that dials servers through rmcp.
#[derive(Debug, Clone, Copy, Default)]
pub struct RmcpConnector;

#[async_trait]
impl ToolsetConnector for RmcpConnector {
    async fn open(
        &self,
        server_name: &str,
        params: &ConnectionParams,
        filter: Option<&ToolFilter>,
    ) -> Result<Box<dyn Toolset>> {
        let toolset = RemoteToolset::open(server_name, params, filter.cloned()).await?;
        Ok(Box::new(toolset))
    }
}

#[async_trait]
/// MCP client operations required by a toolset.
pub(crate) trait MCPClientOps: Send {
    async fn initialize(&mut self) -> Result<()>;
    async fn list_tools(&mut self) -> Result<Vec<MCPToolSchema>>;
    async fn list_resources(&mut self) -> Result<Vec<MCPResourceSchema>>;
    async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult>;
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
impl MCPClientOps for MCPClient {
    async fn initialize(&mut self) -> Result<()> {
        MCPClient::initialize(self).await
    }

    async fn list_tools(&mut self) -> Result<Vec<MCPToolSchema>> {
        MCPClient::list_tools(self).await
    }

    async fn list_resources(&mut self) -> Result<Vec<MCPResourceSchema>> {
        MCPClient::list_resources(self).await
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult> {
        MCPClient::call_tool(self, name, arguments).await
    }

    async fn close(&mut self) -> Result<()> {
        MCPClient::close(self).await
    }
}

/// Toolset for one remote MCP server.
pub struct RemoteToolset {
    server_name: String,
    client: Box<dyn MCPClientOps>,
    filter: Option<ToolFilter>,
    tools: Vec<MCPToolSchema>,
    closed: bool,
}

impl RemoteToolset {
    /// Connect and initialize a session for `params`.
    pub async fn open(
        server_name: impl Into<String>,
        params: &ConnectionParams,
        filter: Option<ToolFilter>,
    ) -> Result<Self> {
        let server_name = server_name.into();
        debug!(server = %server_name, target = %params.target(), "opening MCP toolset");
        let client = MCPClient::new(params.to_transport());
        Self::from_client_ops(server_name, Box::new(client), filter).await
    }

    pub(crate) async fn from_client_ops(
        server_name: String,
        mut client: Box<dyn MCPClientOps>,
        filter: Option<ToolFilter>,
    ) -> Result<Self> {
        client.initialize().await?;
        Ok(Self {
            server_name,
            client,
            filter,
            tools: Vec::new(),
            closed: false,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(HubError::InvalidState(format!(
                "toolset '{}' is closed",
                self.server_name
            )));
        }
        Ok(())
    }

    fn is_allowed(&self, tool_name: &str) -> bool {
        self.filter
            .as_ref()
            .map_or(true, |filter| filter.allows(tool_name))
    }
}

#[async_trait]
impl Toolset for RemoteToolset {
    fn server_name(&self) -> &str {
        &self.server_name
    }

    fn tools(&self) -> &[MCPToolSchema] {
        &self.tools
    }

    async fn get_tools(&mut self) -> Result<Vec<MCPToolSchema>> {
        self.ensure_open()?;
        let advertised = self.client.list_tools().await?;
        let tools = advertised
            .into_iter()
            .filter(|tool| self.is_allowed(&tool.name))
            .collect::<Vec<_>>();
        self.tools = tools.clone();
        Ok(tools)
    }

    async fn get_resources(&mut self) -> Result<Vec<MCPResourceSchema>> {
        self.ensure_open()?;
        self.client.list_resources().await
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult> {
        self.ensure_open()?;
        if !self.is_allowed(name) {
            return Err(HubError::InvalidArgument(format!(
                "tool '{name}' is not exposed by toolset '{}'",
                self.server_name
            )));
        }
        self.client.call_tool(name, arguments).await
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.tools.clear();
        if let Err(e) = self.client.close().await {
            warn!(server = %self.server_name, "error closing toolset: {e}");
            return Err(e);
        }
        debug!(server = %self.server_name, "toolset closed");
        Ok(())
    }
}
