//! Aggregation over real streamable-HTTP sessions against fake MCP servers.

mod common;

use std::time::Duration;

use ecommerce_mcp::config::ConfigLoader;
use ecommerce_mcp::mcp::{
    AggregationConfig, ServerStatus, ToolFilter, ToolsetAggregator,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::time::timeout;

use common::{mcp_url, request_methods, start_mcp_server, write_config, UNREACHABLE_URL};

const SHOP_TOOLS: &[(&str, &str)] = &[
    ("add_to_cart", "Add a product to the shopping cart"),
    ("checkout", "Finalize the purchase"),
];
const WEATHER_TOOLS: &[(&str, &str)] = &[("forecast", "Weather forecast")];
const NO_TOOLS: &[(&str, &str)] = &[];

fn aggregator(path: std::path::PathBuf, config: AggregationConfig) -> ToolsetAggregator {
    ToolsetAggregator::new(ConfigLoader::new(Some(path)), config)
}

fn bounded() -> AggregationConfig {
    AggregationConfig {
        connect_timeout: Some(Duration::from_secs(5)),
        ..AggregationConfig::default()
    }
}

#[tokio::test]
async fn mixed_configuration_yields_expected_status() {
    let shop = start_mcp_server("shop", SHOP_TOOLS).await;
    let empty = start_mcp_server("empty", NO_TOOLS).await;
    let weather = start_mcp_server("weather", WEATHER_TOOLS).await;

    let (_dir, path) = write_config(json!({
        "A": { "type": "http", "url": mcp_url(&shop) },
        "B": { "type": "http", "url": "http//missing-colon" },
        "C": { "type": "http", "url": mcp_url(&empty) },
        "D": { "type": "http", "url": mcp_url(&weather) },
        "E": { "type": "http" }
    }));

    let aggregation = timeout(
        Duration::from_secs(20),
        aggregator(path, bounded()).load_toolsets(),
    )
    .await
    .expect("aggregation should finish")
    .expect("aggregation should succeed");

    let names = aggregation
        .toolsets
        .iter()
        .map(|toolset| toolset.server_name().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["A", "D"]);

    assert_eq!(aggregation.status.len(), 5);
    assert_eq!(aggregation.status["A"], ServerStatus::Connected);
    assert_eq!(aggregation.status["B"], ServerStatus::ConnectionFailed);
    assert_eq!(aggregation.status["C"], ServerStatus::NoTools);
    assert_eq!(aggregation.status["D"], ServerStatus::Connected);
    assert_eq!(aggregation.status["E"], ServerStatus::InvalidConfig);

    let shop_tools = aggregation.toolsets[0]
        .tools()
        .iter()
        .map(|tool| tool.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(shop_tools, vec!["add_to_cart", "checkout"]);

    let shop_methods = request_methods(&shop).await;
    assert!(shop_methods.contains("initialize"));
    assert!(shop_methods.contains("tools/list"));

    for mut toolset in aggregation.toolsets {
        toolset.close().await.expect("toolset should close");
    }
}

#[tokio::test]
async fn unreachable_server_is_recorded_and_later_servers_still_connect() {
    let shop = start_mcp_server("shop", SHOP_TOOLS).await;
    let (_dir, path) = write_config(json!({
        "down": { "type": "http", "url": UNREACHABLE_URL },
        "shop": { "type": "http", "url": mcp_url(&shop) }
    }));

    let aggregation = timeout(
        Duration::from_secs(20),
        aggregator(path, bounded()).load_toolsets(),
    )
    .await
    .expect("aggregation should finish")
    .expect("aggregation should succeed");

    assert!(matches!(aggregation.status["down"], ServerStatus::Error(_)));
    assert!(aggregation.status["down"].to_string().starts_with("error:"));
    assert_eq!(aggregation.status["shop"], ServerStatus::Connected);
    assert_eq!(aggregation.toolsets.len(), 1);
}

#[tokio::test]
async fn tool_filter_limits_advertised_tools() {
    let shop = start_mcp_server("shop", SHOP_TOOLS).await;
    let (_dir, path) = write_config(json!({
        "shop": { "type": "http", "url": mcp_url(&shop) }
    }));

    let aggregation = aggregator(
        path,
        AggregationConfig {
            tool_filter: Some(ToolFilter::new(["checkout"])),
            ..bounded()
        },
    )
    .load_toolsets()
    .await
    .expect("aggregation should succeed");

    let tools = aggregation.toolsets[0]
        .tools()
        .iter()
        .map(|tool| tool.name.clone())
        .collect::<Vec<_>>();
    assert_eq!(tools, vec!["checkout".to_string()]);
}

#[tokio::test]
async fn stdio_descriptor_is_connection_failed_by_default() {
    let (_dir, path) = write_config(json!({
        "local": { "type": "stdio", "command": "python", "args": ["server.py"] }
    }));

    let aggregation = aggregator(path, AggregationConfig::default())
        .load_toolsets()
        .await
        .expect("aggregation should succeed");

    assert_eq!(aggregation.status["local"], ServerStatus::ConnectionFailed);
    assert!(aggregation.toolsets.is_empty());
}

#[tokio::test]
async fn missing_config_document_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = aggregator(dir.path().join("absent.json"), AggregationConfig::default())
        .load_toolsets()
        .await;

    match result {
        Ok(_) => panic!("missing config must fail"),
        Err(err) => assert!(err.is_fatal()),
    }
}

#[tokio::test]
async fn document_without_servers_yields_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("servers.json");
    std::fs::write(&path, "{}").expect("config should be written");

    let aggregation = aggregator(path, AggregationConfig::default())
        .load_toolsets()
        .await
        .expect("aggregation should succeed");
    assert!(aggregation.toolsets.is_empty());
    assert!(aggregation.status.is_empty());
}
