//! Error types for ecommerce-mcp.

use thiserror::Error;

/// Primary error type for all hub operations.
#[derive(Error, Debug)]
pub enum HubError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported transport: {0}")]
    UnsupportedTransport(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Provider error: {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Agent build failed: {0}")]
    Build(String),
}

impl HubError {
    /// Shorthand for an error reported by an MCP peer.
    pub fn mcp(message: impl Into<String>) -> Self {
        Self::Provider {
            provider: "mcp".into(),
            message: message.into(),
        }
    }

    /// Timeout for `limit`, saturating at `u64::MAX` milliseconds.
    pub fn timeout(limit: std::time::Duration) -> Self {
        Self::Timeout(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX))
    }

    /// Whether this error must stop the caller rather than be recorded per server.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::Io(_) | Self::Serialization(_) | Self::Build(_)
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, HubError>;
