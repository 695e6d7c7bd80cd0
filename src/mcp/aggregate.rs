//! Multi-server toolset aggregation with per-server status tracking.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::{ConfigLoader, ServerDescriptor};
use crate::error::{HubError, Result};

use super::params::{ConnectionParamsBuilder, TransportPolicy};
use super::toolset::{RmcpConnector, ToolFilter, Toolset, ToolsetConnector};

/// Outcome of one server's connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerStatus {
    Connected,
    InvalidConfig,
    ConnectionFailed,
    NoTools,
    Error(String),
}

impl ServerStatus {
    pub fn from_error(error: &HubError) -> Self {
        match error {
            HubError::Timeout(ms) => Self::Error(format!("timed out after {ms}ms")),
            other => Self::Error(other.to_string()),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected => f.write_str("connected"),
            Self::InvalidConfig => f.write_str("invalid_config"),
            Self::ConnectionFailed => f.write_str("connection_failed"),
            Self::NoTools => f.write_str("no_tools"),
            Self::Error(detail) => write!(f, "error:{detail}"),
        }
    }
}

/// Status of every configured server, keyed by server name.
pub type ServerStatusMap = BTreeMap<String, ServerStatus>;

/// Result of one aggregation pass.
pub struct Aggregation {
    /// Live toolsets in configuration order.
    pub toolsets: Vec<Box<dyn Toolset>>,
    pub status: ServerStatusMap,
}

/// Aggregation behavior controls.
#[derive(Debug, Clone, Default)]
pub struct AggregationConfig {
    pub tool_filter: Option<ToolFilter>,
    pub transport_policy: TransportPolicy,
    /// Upper bound on opening and listing one server.
    pub connect_timeout: Option<Duration>,
}

enum ServerAttempt {
    Connected(Box<dyn Toolset>),
    Skipped(ServerStatus),
}

/// Connects to every configured server and gathers the usable toolsets.
pub struct ToolsetAggregator {
    loader: ConfigLoader,
    connector: Box<dyn ToolsetConnector>,
    config: AggregationConfig,
}

impl ToolsetAggregator {
    pub fn new(loader: ConfigLoader, config: AggregationConfig) -> Self {
        Self::with_connector(loader, config, Box::new(RmcpConnector))
    }

    pub fn with_connector(
        loader: ConfigLoader,
        config: AggregationConfig,
        connector: Box<dyn ToolsetConnector>,
    ) -> Self {
        Self {
            loader,
            connector,
            config,
        }
    }

    pub fn loader(&self) -> &ConfigLoader {
        &self.loader
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Attempt every configured server in order.
    ///
    /// Only a failure to load the configuration is returned as an error; every
    /// per-server failure is recorded in the status map instead.
    pub async fn load_toolsets(&self) -> Result<Aggregation> {
        let servers = self.loader.get_servers()?;
        let builder = ConnectionParamsBuilder::new(self.config.transport_policy);

        let mut toolsets = Vec::new();
        let mut status = ServerStatusMap::new();

        for (name, descriptor) in servers {
            let outcome = match self.attempt(&builder, &name, &descriptor).await {
                ServerAttempt::Connected(toolset) => {
                    toolsets.push(toolset);
                    ServerStatus::Connected
                }
                ServerAttempt::Skipped(outcome) => outcome,
            };
            info!(server = %name, status = %outcome, "server processed");
            status.insert(name, outcome);
        }

        info!(
            connected = toolsets.len(),
            total = status.len(),
            "toolset aggregation complete"
        );
        Ok(Aggregation { toolsets, status })
    }

    async fn attempt(
        &self,
        builder: &ConnectionParamsBuilder,
        name: &str,
        descriptor: &ServerDescriptor,
    ) -> ServerAttempt {
        if !self.loader.validate_server_config(name, descriptor) {
            return ServerAttempt::Skipped(ServerStatus::InvalidConfig);
        }

        let Some(params) = builder.build(name, descriptor) else {
            return ServerAttempt::Skipped(ServerStatus::ConnectionFailed);
        };

        let opened = bounded(
            self.config.connect_timeout,
            self.connector
                .open(name, &params, self.config.tool_filter.as_ref()),
        )
        .await;
        let mut toolset = match opened {
            Ok(toolset) => toolset,
            Err(e) => {
                error!(server = %name, "Failed to connect to '{name}': {e}");
                return ServerAttempt::Skipped(ServerStatus::from_error(&e));
            }
        };

        let listed = bounded(self.config.connect_timeout, toolset.get_tools()).await;
        match listed {
            Ok(tools) if tools.is_empty() => {
                warn!(server = %name, "server advertised no tools");
                release(name, toolset).await;
                ServerAttempt::Skipped(ServerStatus::NoTools)
            }
            Ok(tools) => {
                info!(server = %name, tools = tools.len(), "connected");
                ServerAttempt::Connected(toolset)
            }
            Err(e) => {
                error!(server = %name, "Failed to list tools for '{name}': {e}");
                release(name, toolset).await;
                ServerAttempt::Skipped(ServerStatus::from_error(&e))
            }
        }
    }
}

async fn bounded<T>(limit: Option<Duration>, fut: impl Future<Output = Result<T>>) -> Result<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| HubError::timeout(limit))?,
        None => fut.await,
    }
}

async fn release(name: &str, mut toolset: Box<dyn Toolset>) {
    if let Err(e) = toolset.close().await {
        warn!(server = %name, "error releasing toolset: {e}");
    }
}
