//! Tool-routing agent built from aggregated toolsets.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{HubError, Result};
use crate::mcp::Toolset;

/// How tools from several servers are exposed to the model.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolNaming {
    /// Keep the upstream tool name; the first server in configuration order
    /// owns a name advertised more than once.
    #[default]
    Upstream,
    /// Expose each tool as `<server>__<tool>`.
    NamespaceServer,
}

impl ToolNaming {
    pub fn exposed_name(&self, server_name: &str, tool_name: &str) -> String {
        match self {
            Self::Upstream => tool_name.to_string(),
            Self::NamespaceServer => format!("{server_name}__{tool_name}"),
        }
    }
}

/// A tool as seen by the model, with the server that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTool {
    pub exposed_name: String,
    pub server_name: String,
    pub upstream_name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// A queryable agent: identity, instruction, and the tools it may route to.
#[derive(Debug, Clone)]
pub struct ToolAgent {
    name: String,
    model: String,
    instruction: String,
    tools: Vec<AgentTool>,
}

impl ToolAgent {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn tools(&self) -> &[AgentTool] {
        &self.tools
    }

    pub fn tool(&self, exposed_name: &str) -> Option<&AgentTool> {
        self.tools
            .iter()
            .find(|tool| tool.exposed_name == exposed_name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools
            .iter()
            .map(|tool| tool.exposed_name.clone())
            .collect()
    }
}

/// Inputs handed to an [`AgentFactory`].
#[derive(Debug, Clone, Copy)]
pub struct AgentSpec<'a> {
    pub name: &'a str,
    pub model: &'a str,
    pub instruction: &'a str,
}

/// Constructs the agent from the gathered toolsets.
pub trait AgentFactory: Send + Sync {
    fn create(&self, spec: AgentSpec<'_>, toolsets: &[Box<dyn Toolset>]) -> Result<ToolAgent>;
}

/// Factory that routes every listed tool of every toolset.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAgentFactory {
    naming: ToolNaming,
}

impl DefaultAgentFactory {
    pub fn new(naming: ToolNaming) -> Self {
        Self { naming }
    }
}

impl AgentFactory for DefaultAgentFactory {
    fn create(&self, spec: AgentSpec<'_>, toolsets: &[Box<dyn Toolset>]) -> Result<ToolAgent> {
        if !is_identifier(spec.name) {
            return Err(HubError::Build(format!(
                "agent name '{}' must be a valid identifier",
                spec.name
            )));
        }
        if spec.instruction.trim().is_empty() {
            return Err(HubError::Build("agent instruction must not be empty".into()));
        }

        let mut seen = HashSet::new();
        let mut tools = Vec::new();
        for toolset in toolsets {
            for tool in toolset.tools() {
                let exposed_name = self.naming.exposed_name(toolset.server_name(), &tool.name);
                if !seen.insert(exposed_name.clone()) {
                    tracing::warn!(
                        tool = %exposed_name,
                        server = %toolset.server_name(),
                        "Tool name already routed to an earlier server; skipping duplicate"
                    );
                    continue;
                }
                tools.push(AgentTool {
                    exposed_name,
                    server_name: toolset.server_name().to_string(),
                    upstream_name: tool.name.clone(),
                    description: tool.description.clone().unwrap_or_default(),
                    input_schema: tool.input_schema.clone(),
                });
            }
        }

        Ok(ToolAgent {
            name: spec.name.to_string(),
            model: spec.model.to_string(),
            instruction: spec.instruction.to_string(),
            tools,
        })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
