//! Client session for one MCP server.

use rmcp::model::{
    CallToolRequestParams, CallToolResult, ClientInfo, Content, JsonObject, ProtocolVersion,
    ResourceContents,
};
use rmcp::service::{ClientInitializeError, ServiceError};
use tracing::debug;

use crate::error::{HubError, Result};

use super::schema::{MCPResourceSchema, MCPToolSchema};
use super::transport::{MCPRunningService, MCPTransport};

/// Protocol versions offered during the handshake, newest first.
const HANDSHAKE_VERSIONS: [ProtocolVersion; 2] =
    [ProtocolVersion::LATEST, ProtocolVersion::V_2024_11_05];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Pending,
    Open,
    Closed,
}

/// Outcome of a tool call, split into the shapes callers usually want.
#[derive(Debug, Clone)]
pub struct MCPToolCallResult {
    pub structured_content: Option<serde_json::Value>,
    pub text_content: Option<String>,
    pub content: Vec<serde_json::Value>,
}

impl MCPToolCallResult {
    /// Structured payload if present, else the joined text, else the raw content list.
    pub fn into_value_or_text(self) -> serde_json::Value {
        match (self.structured_content, self.text_content) {
            (Some(structured), _) => structured,
            (None, Some(text)) => serde_json::Value::String(text),
            (None, None) => serde_json::Value::Array(self.content),
        }
    }
}

/// A single session with an MCP server, opened lazily through its transport.
pub struct MCPClient {
    transport: Box<dyn MCPTransport>,
    session: Option<MCPRunningService>,
    state: SessionState,
}

impl MCPClient {
    pub fn new(transport: Box<dyn MCPTransport>) -> Self {
        Self {
            transport,
            session: None,
            state: SessionState::Pending,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Run the handshake. A server that rejects the newest protocol version
    /// is offered `2024-11-05` once.
    pub async fn initialize(&mut self) -> Result<()> {
        match self.state {
            SessionState::Open => return Ok(()),
            SessionState::Closed => return Err(closed_error()),
            SessionState::Pending => {}
        }

        let mut last_error = None;
        for version in HANDSHAKE_VERSIONS {
            let client_info = ClientInfo {
                protocol_version: version.clone(),
                ..Default::default()
            };
            match self.transport.connect(client_info).await {
                Ok(session) => {
                    debug!(target = %self.transport.describe(), %version, "MCP session opened");
                    self.session = Some(session);
                    self.state = SessionState::Open;
                    return Ok(());
                }
                Err(e) if is_version_rejection(&e) => {
                    debug!(target = %self.transport.describe(), %version, "server rejected protocol version");
                    last_error = Some(e);
                }
                Err(e) => return Err(map_client_initialize_error(e)),
            }
        }

        Err(last_error
            .map(map_client_initialize_error)
            .unwrap_or_else(|| HubError::mcp("no protocol version accepted")))
    }

    pub async fn list_tools(&mut self) -> Result<Vec<MCPToolSchema>> {
        let session = self.open_session()?;
        let tools = match session.list_all_tools().await {
            Ok(tools) => tools,
            // Servers without pagination support answer a single page.
            Err(ServiceError::UnexpectedResponse) => session
                .list_tools(None)
                .await
                .map(|page| page.tools)
                .map_err(|e| map_service_error("list_tools", e))?,
            Err(e) => return Err(map_service_error("list_tools", e)),
        };
        Ok(tools.into_iter().map(map_mcp_tool_schema).collect())
    }

    pub async fn list_resources(&mut self) -> Result<Vec<MCPResourceSchema>> {
        let session = self.open_session()?;
        let resources = match session.list_all_resources().await {
            Ok(resources) => resources,
            Err(ServiceError::UnexpectedResponse) => session
                .list_resources(None)
                .await
                .map(|page| page.resources)
                .map_err(|e| map_service_error("list_resources", e))?,
            Err(e) => return Err(map_service_error("list_resources", e)),
        };
        Ok(resources.into_iter().map(map_mcp_resource_schema).collect())
    }

    /// Call `name` with `arguments`, which may be an object, a JSON string
    /// holding an object, or null.
    pub async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult> {
        let arguments = coerce_tool_arguments(arguments)?;
        let session = self.open_session()?;
        let result = session
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments,
                task: None,
            })
            .await
            .map_err(|e| map_service_error("call_tool", e))?;
        map_call_result(name, result)
    }

    /// Cancel the session. Safe to call more than once.
    pub async fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;

        let Some(session) = self.session.take() else {
            return Ok(());
        };
        let reason = session
            .cancel()
            .await
            .map_err(|e| HubError::Stream(format!("MCP session shutdown failed: {e}")))?;
        debug!(target = %self.transport.describe(), ?reason, "MCP session closed");
        Ok(())
    }

    fn open_session(&mut self) -> Result<&mut MCPRunningService> {
        match self.state {
            SessionState::Pending => Err(HubError::UnsupportedOperation(
                "MCP client must be initialized first".into(),
            )),
            SessionState::Closed => Err(closed_error()),
            SessionState::Open => self.session.as_mut().ok_or_else(closed_error),
        }
    }
}

fn closed_error() -> HubError {
    HubError::Stream("MCP session is closed".into())
}

fn is_version_rejection(error: &ClientInitializeError) -> bool {
    let ClientInitializeError::JsonRpcError(error) = error else {
        return false;
    };
    let message = error.message.to_ascii_lowercase();
    message.contains("protocol") && message.contains("version")
}

fn map_mcp_tool_schema(tool: rmcp::model::Tool) -> MCPToolSchema {
    MCPToolSchema {
        name: tool.name.into_owned(),
        description: tool.description.map(|d| d.into_owned()),
        input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
    }
}

fn map_mcp_resource_schema(resource: rmcp::model::Resource) -> MCPResourceSchema {
    let raw = resource.raw;
    MCPResourceSchema {
        uri: raw.uri,
        name: raw.name,
        description: raw.description,
        mime_type: raw.mime_type,
    }
}

fn coerce_tool_arguments(value: serde_json::Value) -> Result<Option<JsonObject>> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Object(map) => Ok(Some(map)),
        serde_json::Value::String(raw) if raw.trim().is_empty() => Ok(None),
        serde_json::Value::String(raw) => {
            let parsed = serde_json::from_str(raw.trim()).map_err(|e| {
                HubError::InvalidArgument(format!("tool arguments are not valid JSON: {e}"))
            })?;
            coerce_tool_arguments(parsed)
        }
        other => Err(HubError::InvalidArgument(format!(
            "tool arguments must be a JSON object, got {other}"
        ))),
    }
}

fn text_of(content: &[Content]) -> Option<String> {
    let lines = content
        .iter()
        .filter_map(|item| match (item.as_text(), item.as_resource()) {
            (Some(text), _) => Some(text.text.clone()),
            (None, Some(resource)) => match &resource.resource {
                ResourceContents::TextResourceContents { text, .. } => Some(text.clone()),
                _ => None,
            },
            _ => None,
        })
        .collect::<Vec<_>>();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn map_call_result(name: &str, result: CallToolResult) -> Result<MCPToolCallResult> {
    let text_content = text_of(&result.content);

    if result.is_error.unwrap_or(false) {
        let message = result
            .structured_content
            .as_ref()
            .map(ToString::to_string)
            .or(text_content)
            .unwrap_or_else(|| "tool reported an error".into());
        return Err(HubError::ToolExecution {
            tool_name: name.to_string(),
            message,
        });
    }

    let content = result
        .content
        .iter()
        .filter_map(|item| serde_json::to_value(item).ok())
        .collect();
    Ok(MCPToolCallResult {
        structured_content: result.structured_content,
        text_content,
        content,
    })
}

fn map_client_initialize_error(error: ClientInitializeError) -> HubError {
    match error {
        ClientInitializeError::ConnectionClosed(context) => {
            HubError::Stream(format!("MCP initialize connection closed: {context}"))
        }
        ClientInitializeError::TransportError { error, context } => {
            HubError::Stream(format!("MCP initialize transport error ({context}): {error}"))
        }
        ClientInitializeError::JsonRpcError(error) => HubError::mcp(format!(
            "MCP initialize JSON-RPC error {}: {}",
            error.code.0, error.message
        )),
        ClientInitializeError::Cancelled => HubError::Stream("MCP initialize cancelled".into()),
        other => HubError::mcp(format!("MCP initialize error: {other}")),
    }
}

fn map_service_error(operation: &str, error: ServiceError) -> HubError {
    match error {
        ServiceError::McpError(error) => HubError::mcp(format!(
            "{operation}: MCP error {}: {}",
            error.code.0, error.message
        )),
        ServiceError::TransportSend(error) => {
            HubError::Stream(format!("{operation}: MCP transport send failed: {error}"))
        }
        ServiceError::TransportClosed => {
            HubError::Stream(format!("{operation}: MCP transport closed"))
        }
        ServiceError::Cancelled { reason } => HubError::Stream(match reason {
            Some(reason) => format!("{operation}: MCP request cancelled ({reason})"),
            None => format!("{operation}: MCP request cancelled"),
        }),
        ServiceError::Timeout { timeout } => HubError::timeout(timeout),
        ServiceError::UnexpectedResponse => {
            HubError::mcp(format!("{operation}: unexpected MCP response"))
        }
        other => HubError::mcp(format!("{operation}: MCP service error: {other}")),
    }
}
