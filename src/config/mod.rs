//! MCP server configuration (layered: explicit path > env > default file).

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{error, info, warn};

use crate::error::{HubError, Result};

/// Environment variable overriding the configuration document path.
pub const CONFIG_PATH_ENV: &str = "MCP_CONFIG_PATH";

/// Path used when neither an explicit path nor the environment override is set.
pub const DEFAULT_CONFIG_PATH: &str = "server-config/servers.json";

/// Top-level configuration document.
///
/// ```json
/// { "mcpServers": { "ecommerce": { "type": "http", "url": "http://localhost:8000/mcp" } } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpConfigDocument {
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: serde_json::Map<String, serde_json::Value>,
}

/// Transport types a descriptor may declare in its `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TransportKind {
    Http,
    Stdio,
}

/// Static configuration record for one MCP server.
///
/// Holds the raw JSON object; accessors return `None` for absent or
/// mistyped fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerDescriptor {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl ServerDescriptor {
    /// Wrap a descriptor value; anything other than an object has no fields.
    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    /// Descriptor for a streamable HTTP server.
    pub fn http(url: impl Into<String>) -> Self {
        Self::from_value(serde_json::json!({ "type": "http", "url": url.into() }))
    }

    /// Descriptor for a locally spawned stdio server.
    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        Self::from_value(serde_json::json!({
            "type": "stdio",
            "command": command.into(),
            "args": args,
        }))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn transport_type(&self) -> Option<&str> {
        self.str_field("type")
    }

    /// Parsed transport kind; `None` when absent or not a known type.
    pub fn transport_kind(&self) -> Option<TransportKind> {
        self.transport_type()?.parse().ok()
    }

    pub fn url(&self) -> Option<&str> {
        self.str_field("url")
    }

    pub fn command(&self) -> Option<&str> {
        self.str_field("command")
    }

    pub fn cwd(&self) -> Option<&str> {
        self.str_field("cwd")
    }

    pub fn args(&self) -> Vec<String> {
        self.fields
            .get("args")
            .and_then(|value| value.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn env(&self) -> Vec<(String, String)> {
        self.fields
            .get("env")
            .and_then(|value| value.as_object())
            .map(|vars| {
                vars.iter()
                    .filter_map(|(key, value)| value.as_str().map(|v| (key.clone(), v.to_owned())))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|value| value.as_str())
    }
}

/// Validate one server descriptor.
///
/// Never errors: a missing or unsupported field is logged and reported as `false`.
pub fn validate_server_config(server_name: &str, descriptor: &ServerDescriptor) -> bool {
    if !descriptor.has_field("type") {
        error!(server = %server_name, "Server '{server_name}' missing required field: type");
        return false;
    }

    match descriptor.transport_kind() {
        Some(TransportKind::Http) if !descriptor.has_field("url") => {
            error!(server = %server_name, "HTTP server '{server_name}' missing 'url' field");
            false
        }
        Some(TransportKind::Stdio) if !descriptor.has_field("command") => {
            error!(server = %server_name, "Stdio server '{server_name}' missing 'command' field");
            false
        }
        Some(_) => true,
        None => {
            let declared = descriptor.transport_type().unwrap_or("<non-string>");
            error!(
                server = %server_name,
                "Server '{server_name}' has unsupported type: {declared}"
            );
            false
        }
    }
}

/// Loads the configuration document once and caches it for the loader's lifetime.
#[derive(Debug)]
pub struct ConfigLoader {
    path: PathBuf,
    cache: OnceLock<McpConfigDocument>,
}

impl ConfigLoader {
    /// Create a loader; `path` wins over `MCP_CONFIG_PATH`, which wins over the default.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: resolve_config_path(path, std::env::var_os(CONFIG_PATH_ENV)),
            cache: OnceLock::new(),
        }
    }

    /// Load `.env` (if present) and resolve the path from the environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::new(None)
    }

    /// Create a loader whose document is already cached.
    pub fn with_document(document: McpConfigDocument) -> Self {
        let cache = OnceLock::new();
        let _ = cache.set(document);
        Self {
            path: PathBuf::from("<in-memory>"),
            cache,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.get().is_some()
    }

    /// Read and parse the document on first use; later calls return the cache.
    pub fn load(&self) -> Result<&McpConfigDocument> {
        if let Some(document) = self.cache.get() {
            return Ok(document);
        }

        let document = read_document(&self.path).map_err(|e| {
            error!(path = %self.path.display(), "Failed to load configuration: {e}");
            e
        })?;
        info!(path = %self.path.display(), "Configuration loaded");
        Ok(self.cache.get_or_init(|| document))
    }

    /// Configured servers in document order.
    pub fn get_servers(&self) -> Result<Vec<(String, ServerDescriptor)>> {
        let document = self.load()?;
        Ok(document
            .mcp_servers
            .iter()
            .map(|(name, value)| {
                if !value.is_object() {
                    warn!(server = %name, "Server descriptor is not a JSON object");
                }
                (name.clone(), ServerDescriptor::from_value(value.clone()))
            })
            .collect())
    }

    pub fn validate_server_config(&self, server_name: &str, descriptor: &ServerDescriptor) -> bool {
        validate_server_config(server_name, descriptor)
    }
}

fn resolve_config_path(explicit: Option<PathBuf>, env_value: Option<OsString>) -> PathBuf {
    explicit
        .or_else(|| env_value.filter(|value| !value.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn read_document(path: &Path) -> Result<McpConfigDocument> {
    if !path.exists() {
        return Err(HubError::Configuration(format!(
            "Config file not found: {}",
            path.display()
        )));
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
