use async_trait::async_trait;
use rmcp::model::ClientInfo;
use rmcp::service::{ClientInitializeError, ServiceExt};
use rmcp::transport::TokioChildProcess;
use tokio::process::Command;

use super::{MCPRunningService, MCPTransport};

/// Stdio-based MCP transport (for local MCP servers).
pub struct StdioTransport {
    command: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    cwd: Option<String>,
}

impl StdioTransport {
    /// Create a stdio transport from command and args.
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: Vec::new(),
            cwd: None,
        }
    }

    /// Create a stdio transport from command only.
    pub fn from_command(command: impl Into<String>) -> Self {
        Self::new(command, Vec::new())
    }

    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    pub fn with_cwd(mut self, cwd: Option<String>) -> Self {
        self.cwd = cwd;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn build_command(&self) -> Command {
        let mut command = Command::new(&self.command);
        command.args(&self.args);
        for (key, value) in &self.env {
            command.env(key, value);
        }
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }
        command
    }
}

#[async_trait]
impl MCPTransport for StdioTransport {
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> Result<MCPRunningService, ClientInitializeError> {
        let transport = TokioChildProcess::new(self.build_command()).map_err(|error| {
            ClientInitializeError::transport::<TokioChildProcess>(error, "spawn stdio transport")
        })?;

        client_info.into_dyn().serve(transport).await
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}
