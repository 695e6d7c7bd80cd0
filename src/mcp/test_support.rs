//! Hand-written toolset mocks shared by unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;

use crate::error::{HubError, Result};

use super::client::MCPToolCallResult;
use super::params::ConnectionParams;
use super::schema::{MCPResourceSchema, MCPToolSchema, SchemaBuilder};
use super::toolset::{ToolFilter, Toolset, ToolsetConnector};

pub(crate) type CallLog = Arc<StdMutex<Vec<(String, String, serde_json::Value)>>>;
pub(crate) type NameLog = Arc<StdMutex<Vec<String>>>;

#[derive(Debug, Clone)]
pub(crate) enum MockBehavior {
    Tools(Vec<&'static str>),
    OpenError(&'static str),
    ListError(&'static str),
    CloseError(Vec<&'static str>),
    Hang,
}

pub(crate) struct MockToolset {
    server_name: String,
    advertised: Vec<MCPToolSchema>,
    tools: Vec<MCPToolSchema>,
    filter: Option<ToolFilter>,
    list_error: Option<String>,
    close_error: bool,
    closed: bool,
    closed_log: NameLog,
    call_log: CallLog,
}

impl MockToolset {
    pub(crate) fn new(server_name: &str, tool_names: &[&str]) -> Self {
        Self {
            server_name: server_name.to_string(),
            advertised: tool_names.iter().map(|name| tool(name)).collect(),
            tools: Vec::new(),
            filter: None,
            list_error: None,
            close_error: false,
            closed: false,
            closed_log: NameLog::default(),
            call_log: CallLog::default(),
        }
    }

    /// Mock whose tools are already cached, as if `get_tools` had run.
    pub(crate) fn listed(server_name: &str, tool_names: &[&str]) -> Self {
        let mut toolset = Self::new(server_name, tool_names);
        toolset.tools = toolset.advertised.clone();
        toolset
    }

    pub(crate) fn failing_close(mut self) -> Self {
        self.close_error = true;
        self
    }
}

fn tool(name: &str) -> MCPToolSchema {
    MCPToolSchema {
        name: name.to_string(),
        description: Some(format!("{name} tool")),
        input_schema: SchemaBuilder::new().build(),
    }
}

#[async_trait]
impl Toolset for MockToolset {
    fn server_name(&self) -> &str {
        &self.server_name
    }

    fn tools(&self) -> &[MCPToolSchema] {
        &self.tools
    }

    async fn get_tools(&mut self) -> Result<Vec<MCPToolSchema>> {
        if let Some(message) = &self.list_error {
            return Err(HubError::mcp(message.clone()));
        }
        self.tools = self
            .advertised
            .iter()
            .filter(|tool| self.filter.as_ref().map_or(true, |f| f.allows(&tool.name)))
            .cloned()
            .collect();
        Ok(self.tools.clone())
    }

    async fn get_resources(&mut self) -> Result<Vec<MCPResourceSchema>> {
        Ok(Vec::new())
    }

    async fn call_tool(
        &mut self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<MCPToolCallResult> {
        self.call_log
            .lock()
            .expect("call log should lock")
            .push((self.server_name.clone(), name.to_string(), arguments));
        Ok(MCPToolCallResult {
            structured_content: None,
            text_content: Some(format!("{}:{name}", self.server_name)),
            content: Vec::new(),
        })
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.closed_log
            .lock()
            .expect("closed log should lock")
            .push(self.server_name.clone());
        if self.close_error {
            return Err(HubError::Stream("close failed".into()));
        }
        Ok(())
    }
}

/// Connector that hands out [`MockToolset`]s keyed by server name.
#[derive(Default)]
pub(crate) struct MockConnector {
    behaviors: HashMap<String, MockBehavior>,
    opened_log: NameLog,
    closed_log: NameLog,
    call_log: CallLog,
}

impl MockConnector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, server_name: &str, behavior: MockBehavior) -> Self {
        self.behaviors.insert(server_name.to_string(), behavior);
        self
    }

    pub(crate) fn opened_log(&self) -> NameLog {
        Arc::clone(&self.opened_log)
    }

    pub(crate) fn closed_log(&self) -> NameLog {
        Arc::clone(&self.closed_log)
    }

    pub(crate) fn call_log(&self) -> CallLog {
        Arc::clone(&self.call_log)
    }
}

#[async_trait]
impl ToolsetConnector for MockConnector {
    async fn open(
        &self,
        server_name: &str,
        _params: &ConnectionParams,
        filter: Option<&ToolFilter>,
    ) -> Result<Box<dyn Toolset>> {
        self.opened_log
            .lock()
            .expect("opened log should lock")
            .push(server_name.to_string());

        let behavior = self
            .behaviors
            .get(server_name)
            .cloned()
            .unwrap_or(MockBehavior::OpenError("no mock registered"));

        let mut toolset = match behavior {
            MockBehavior::Tools(names) => MockToolset::new(server_name, &names),
            MockBehavior::CloseError(names) => {
                MockToolset::new(server_name, &names).failing_close()
            }
            MockBehavior::ListError(message) => {
                let mut toolset = MockToolset::new(server_name, &[]);
                toolset.list_error = Some(message.to_string());
                toolset
            }
            MockBehavior::OpenError(message) => return Err(HubError::Stream(message.into())),
            MockBehavior::Hang => std::future::pending::<MockToolset>().await,
        };
        toolset.filter = filter.cloned();
        toolset.closed_log = self.closed_log();
        toolset.call_log = self.call_log();
        Ok(Box::new(toolset))
    }
}
