//! Connection parameters derived from validated server descriptors.

use tracing::error;

use crate::config::{ServerDescriptor, TransportKind};
use crate::error::{HubError, Result};

use super::transport::{MCPTransport, StdioTransport, StreamableHttpTransport};

/// Transport-specific dial information for one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionParams {
    StreamableHttp {
        url: String,
    },
    Stdio {
        command: String,
        args: Vec<String>,
        env: Vec<(String, String)>,
        cwd: Option<String>,
    },
}

impl ConnectionParams {
    pub fn kind(&self) -> TransportKind {
        match self {
            Self::StreamableHttp { .. } => TransportKind::Http,
            Self::Stdio { .. } => TransportKind::Stdio,
        }
    }

    /// URL, or command line for stdio servers.
    pub fn target(&self) -> String {
        match self {
            Self::StreamableHttp { url } => url.clone(),
            Self::Stdio { command, args, .. } if args.is_empty() => command.clone(),
            Self::Stdio { command, args, .. } => format!("{command} {}", args.join(" ")),
        }
    }

    /// Create the transport that dials these parameters.
    pub fn to_transport(&self) -> Box<dyn MCPTransport> {
        match self {
            Self::StreamableHttp { url } => Box::new(StreamableHttpTransport::new(url.clone())),
            Self::Stdio {
                command,
                args,
                env,
                cwd,
            } => Box::new(
                StdioTransport::new(command.clone(), args.clone())
                    .with_env(env.clone())
                    .with_cwd(cwd.clone()),
            ),
        }
    }
}

/// Which declared transport types may be turned into connection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportPolicy {
    /// Only streamable HTTP servers are dialled; `stdio` is unsupported.
    #[default]
    HttpOnly,
    /// Streamable HTTP servers and locally spawned stdio servers.
    HttpAndStdio,
}

/// Translates descriptors into [`ConnectionParams`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionParamsBuilder {
    policy: TransportPolicy,
}

impl ConnectionParamsBuilder {
    pub fn new(policy: TransportPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> TransportPolicy {
        self.policy
    }

    /// Build parameters, logging and swallowing any failure.
    pub fn build(&self, server_name: &str, descriptor: &ServerDescriptor) -> Option<ConnectionParams> {
        match self.try_build(descriptor) {
            Ok(params) => Some(params),
            Err(e) => {
                error!(
                    server = %server_name,
                    "Error creating connection params for '{server_name}': {e}"
                );
                None
            }
        }
    }

    pub fn try_build(&self, descriptor: &ServerDescriptor) -> Result<ConnectionParams> {
        let declared = descriptor
            .transport_type()
            .ok_or_else(|| HubError::Configuration("server 'type' must be a string".into()))?;

        match (descriptor.transport_kind(), self.policy) {
            (Some(TransportKind::Http), _) => {
                let url = descriptor
                    .url()
                    .ok_or_else(|| HubError::Configuration("server 'url' must be a string".into()))?;
                validate_http_url(url)?;
                Ok(ConnectionParams::StreamableHttp {
                    url: url.to_owned(),
                })
            }
            (Some(TransportKind::Stdio), TransportPolicy::HttpAndStdio) => {
                let command = descriptor.command().ok_or_else(|| {
                    HubError::Configuration("server 'command' must be a string".into())
                })?;
                Ok(ConnectionParams::Stdio {
                    command: command.to_owned(),
                    args: descriptor.args(),
                    env: descriptor.env(),
                    cwd: descriptor.cwd().map(str::to_owned),
                })
            }
            _ => Err(HubError::UnsupportedTransport(format!(
                "Unsupported server type: {declared}"
            ))),
        }
    }
}

fn validate_http_url(url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| HubError::Configuration(format!("invalid url '{url}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(HubError::Configuration(format!(
            "invalid url '{url}': scheme '{other}' is not http(s)"
        ))),
    }
}
