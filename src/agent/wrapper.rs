//! Agent facade over every configured MCP server.

use std::time::Duration;

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{error, info, warn};

use crate::config::ConfigLoader;
use crate::error::{HubError, Result};
use crate::mcp::{
    AggregationConfig, MCPToolCallResult, ServerStatusMap, ToolFilter, Toolset, ToolsetAggregator,
    TransportPolicy,
};

use super::agent::{AgentFactory, AgentSpec, DefaultAgentFactory, ToolAgent, ToolNaming};

pub const DEFAULT_AGENT_NAME: &str = "mcp_assistant";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_INSTRUCTION: &str = "You are a helpful assistant with access to tools that can help users view the products and add them to a shopping cart.";

/// Settings for [`McpAgent`].
#[derive(Debug, Clone, Builder)]
pub struct AgentSettings {
    #[builder(into, default = DEFAULT_AGENT_NAME.to_string())]
    pub name: String,
    #[builder(into, default = DEFAULT_MODEL.to_string())]
    pub model: String,
    #[builder(into, default = DEFAULT_INSTRUCTION.to_string())]
    pub instruction: String,
    /// Pause after releasing toolsets so transports can finish shutting down.
    #[builder(default = Duration::from_millis(500))]
    pub shutdown_grace: Duration,
    #[builder(default)]
    pub tool_naming: ToolNaming,
    #[builder(default)]
    pub transport_policy: TransportPolicy,
    pub tool_filter: Option<ToolFilter>,
    pub connect_timeout: Option<Duration>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AgentSettings {
    pub fn aggregation_config(&self) -> AggregationConfig {
        AggregationConfig {
            tool_filter: self.tool_filter.clone(),
            transport_policy: self.transport_policy,
            connect_timeout: self.connect_timeout,
        }
    }
}

/// Lifecycle of an [`McpAgent`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AgentState {
    Uninitialized,
    Building,
    Ready,
    Failed,
}

/// One queryable agent over the toolsets of every reachable server.
pub struct McpAgent {
    settings: AgentSettings,
    aggregator: ToolsetAggregator,
    factory: Box<dyn AgentFactory>,
    state: AgentState,
    toolsets: Vec<Box<dyn Toolset>>,
    status: ServerStatusMap,
    agent: Option<ToolAgent>,
}

impl McpAgent {
    /// Facade dialling real servers through rmcp.
    pub fn new(settings: AgentSettings, loader: ConfigLoader) -> Self {
        let aggregator = ToolsetAggregator::new(loader, settings.aggregation_config());
        let factory = Box::new(DefaultAgentFactory::new(settings.tool_naming));
        Self::with_parts(settings, aggregator, factory)
    }

    pub fn with_parts(
        settings: AgentSettings,
        aggregator: ToolsetAggregator,
        factory: Box<dyn AgentFactory>,
    ) -> Self {
        Self {
            settings,
            aggregator,
            factory,
            state: AgentState::Uninitialized,
            toolsets: Vec::new(),
            status: ServerStatusMap::new(),
            agent: None,
        }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Gather toolsets from every configured server and construct the agent.
    ///
    /// Per-server failures are only recorded in the status snapshot; a
    /// configuration load failure or an agent construction failure is returned.
    pub async fn build(&mut self) -> Result<()> {
        if self.state == AgentState::Ready {
            return Err(HubError::InvalidState(
                "agent is already built; close it before building again".into(),
            ));
        }
        self.state = AgentState::Building;

        let aggregation = match self.aggregator.load_toolsets().await {
            Ok(aggregation) => aggregation,
            Err(e) => {
                self.state = AgentState::Failed;
                return Err(e);
            }
        };
        self.status = aggregation.status;
        let toolsets = aggregation.toolsets;

        if toolsets.is_empty() {
            warn!("No toolsets were loaded; the agent will have no tools");
        }

        let spec = AgentSpec {
            name: &self.settings.name,
            model: &self.settings.model,
            instruction: &self.settings.instruction,
        };
        match self.factory.create(spec, &toolsets) {
            Ok(agent) => {
                info!(
                    agent = %agent.name(),
                    toolsets = toolsets.len(),
                    tools = agent.tools().len(),
                    "agent ready"
                );
                self.toolsets = toolsets;
                self.agent = Some(agent);
                self.state = AgentState::Ready;
                Ok(())
            }
            Err(e) => {
                error!("Failed to construct agent: {e}");
                release_all(toolsets).await;
                self.state = AgentState::Failed;
                Err(match e {
                    HubError::Build(message) => HubError::Build(message),
                    other => HubError::Build(other.to_string()),
                })
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == AgentState::Ready && self.agent.is_some()
    }

    /// Copy of the status recorded by the last build.
    pub fn get_server_status(&self) -> ServerStatusMap {
        self.status.clone()
    }

    pub fn agent(&self) -> Option<&ToolAgent> {
        self.agent.as_ref()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.agent
            .as_ref()
            .map(ToolAgent::tool_names)
            .unwrap_or_default()
    }

    /// Route a call to the server that owns `tool_name`.
    pub async fn call_tool(
        &mut self,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult> {
        let agent = self
            .agent
            .as_ref()
            .ok_or_else(|| HubError::InvalidState("agent is not built".into()))?;
        let tool = agent
            .tool(tool_name)
            .ok_or_else(|| HubError::InvalidArgument(format!("Unknown tool '{tool_name}'")))?;

        let toolset = self
            .toolsets
            .iter_mut()
            .find(|toolset| toolset.server_name() == tool.server_name)
            .ok_or_else(|| {
                HubError::InvalidState(format!(
                    "tool '{tool_name}' routes to missing server '{}'",
                    tool.server_name
                ))
            })?;
        toolset.call_tool(&tool.upstream_name, arguments).await
    }

    /// Release every toolset and drop the agent. Safe to call repeatedly.
    pub async fn close(&mut self) {
        let toolsets = std::mem::take(&mut self.toolsets);
        let count = toolsets.len();
        release_all(toolsets).await;
        self.agent = None;
        self.state = AgentState::Uninitialized;

        if !self.settings.shutdown_grace.is_zero() {
            tokio::time::sleep(self.settings.shutdown_grace).await;
        }
        info!(released = count, "agent closed");
    }
}

async fn release_all(toolsets: Vec<Box<dyn Toolset>>) {
    for mut toolset in toolsets {
        if let Err(e) = toolset.close().await {
            warn!(server = %toolset.server_name(), "Error closing toolset: {e}");
        }
    }
}
