//! Shared test helpers: a fake streamable-HTTP MCP server and config fixtures.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::PathBuf;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Address nothing listens on; connections are refused immediately.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1/mcp";

fn tool_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "product_name": { "type": "string" }
        }
    })
}

fn mock_mcp_handler(
    server_name: &'static str,
    tools: &'static [(&'static str, &'static str)],
) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync {
    move |request: &Request| {
        let body: serde_json::Value = request.body_json().unwrap_or_else(|_| json!({}));
        let method = body
            .get("method")
            .and_then(|value| value.as_str())
            .unwrap_or_default();
        let id = body.get("id").cloned().unwrap_or_else(|| json!(1));

        let result = match method {
            "initialize" => json!({
                "protocolVersion": "2025-03-26",
                "capabilities": {
                    "tools": { "listChanged": false },
                    "resources": { "listChanged": false }
                },
                "serverInfo": { "name": server_name, "version": "0.1.0" }
            }),
            "tools/list" => {
                let definitions: Vec<_> = tools
                    .iter()
                    .map(|(tool_name, description)| {
                        json!({
                            "name": tool_name,
                            "description": description,
                            "inputSchema": tool_schema()
                        })
                    })
                    .collect();
                json!({ "tools": definitions, "nextCursor": null })
            }
            "resources/list" => json!({
                "resources": [{
                    "uri": "products://list_products",
                    "name": "list_products",
                    "mimeType": "application/json"
                }],
                "nextCursor": null
            }),
            "tools/call" => {
                let called_tool = body
                    .get("params")
                    .and_then(|params| params.get("name"))
                    .and_then(|name| name.as_str())
                    .unwrap_or_default();
                let arguments = body
                    .get("params")
                    .and_then(|params| params.get("arguments"))
                    .cloned()
                    .unwrap_or_else(|| json!({}));
                json!({
                    "content": [{ "type": "text", "text": format!("{server_name}:{called_tool}") }],
                    "structuredContent": {
                        "server": server_name,
                        "tool": called_tool,
                        "arguments": arguments
                    },
                    "isError": false
                })
            }
            m if m.starts_with("notifications/") => return ResponseTemplate::new(202),
            _ => serde_json::Value::Null,
        };

        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": result
        }))
    }
}

/// Start a fake MCP server at `<uri>/mcp` advertising `tools`.
pub async fn start_mcp_server(
    server_name: &'static str,
    tools: &'static [(&'static str, &'static str)],
) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(mock_mcp_handler(server_name, tools))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;
    server
}

pub fn mcp_url(server: &MockServer) -> String {
    format!("{}/mcp", server.uri())
}

/// Write `{"mcpServers": servers}` into a fresh temp dir.
pub fn write_config(servers: serde_json::Value) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let file = dir.path().join("servers.json");
    let document = json!({ "mcpServers": servers });
    std::fs::write(
        &file,
        serde_json::to_string_pretty(&document).expect("document should serialize"),
    )
    .expect("config should be written");
    (dir, file)
}

pub async fn request_methods(server: &MockServer) -> HashSet<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| {
            request
                .body_json::<serde_json::Value>()
                .ok()
                .and_then(|body| {
                    body.get("method")
                        .and_then(|method| method.as_str())
                        .map(str::to_string)
                })
        })
        .collect()
}
