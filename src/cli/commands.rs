//! CLI command handlers.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::agent::{AgentSettings, McpAgent, ToolNaming};
use crate::config::{ConfigLoader, ServerDescriptor};
use crate::error::{HubError, Result};
use crate::mcp::{
    ConnectionParams, ConnectionParamsBuilder, MCPResourceSchema, MCPToolSchema, RemoteToolset,
    Toolset, TransportPolicy,
};

use super::{CallArgs, Cli, Commands, ProbeArgs};

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let settings = settings_from(&cli);
    match cli.command {
        Commands::Status => handle_status(settings, cli.config).await,
        Commands::Tools => handle_tools(settings, cli.config).await,
        Commands::Call(args) => handle_call(settings, cli.config, args).await,
        Commands::Probe(args) => handle_probe(args, settings.connect_timeout).await,
    }
}

fn settings_from(cli: &Cli) -> AgentSettings {
    AgentSettings::builder()
        .tool_naming(if cli.namespace_tools {
            ToolNaming::NamespaceServer
        } else {
            ToolNaming::Upstream
        })
        .transport_policy(if cli.allow_stdio {
            TransportPolicy::HttpAndStdio
        } else {
            TransportPolicy::HttpOnly
        })
        .maybe_connect_timeout(cli.connect_timeout_ms.map(Duration::from_millis))
        .build()
}

fn loader(config: Option<PathBuf>) -> ConfigLoader {
    match config {
        Some(path) => ConfigLoader::new(Some(path)),
        None => ConfigLoader::from_env(),
    }
}

async fn built_agent(
    settings: AgentSettings,
    config: Option<PathBuf>,
) -> Result<McpAgent> {
    let mut agent = McpAgent::new(settings, loader(config));
    agent.build().await?;
    Ok(agent)
}

async fn handle_status(settings: AgentSettings, config: Option<PathBuf>) -> Result<()> {
    let mut agent = built_agent(settings, config).await?;
    for (server, status) in agent.get_server_status() {
        println!("{server}: {status}");
    }
    agent.close().await;
    Ok(())
}

async fn handle_tools(settings: AgentSettings, config: Option<PathBuf>) -> Result<()> {
    let mut agent = built_agent(settings, config).await?;
    match agent.agent() {
        Some(built) if !built.tools().is_empty() => {
            for tool in built.tools() {
                println!("{} [{}]  {}", tool.exposed_name, tool.server_name, tool.description);
            }
        }
        _ => println!("No tools available."),
    }
    agent.close().await;
    Ok(())
}

async fn handle_call(
    settings: AgentSettings,
    config: Option<PathBuf>,
    args: CallArgs,
) -> Result<()> {
    let arguments: serde_json::Value = serde_json::from_str(&args.args)?;
    let mut agent = built_agent(settings, config).await?;
    let result = agent.call_tool(&args.tool, arguments).await;
    agent.close().await;

    match result?.into_value_or_text() {
        serde_json::Value::String(text) => println!("{text}"),
        other => println!("{}", serde_json::to_string_pretty(&other)?),
    }
    Ok(())
}

async fn handle_probe(args: ProbeArgs, timeout: Option<Duration>) -> Result<()> {
    let params =
        ConnectionParamsBuilder::default().try_build(&ServerDescriptor::http(args.url.clone()))?;

    let (tools, resources) = match timeout {
        Some(limit) => tokio::time::timeout(limit, probe_session(&params))
            .await
            .map_err(|_| HubError::timeout(limit))??,
        None => probe_session(&params).await?,
    };

    println!("Tools ({}):", tools.len());
    for tool in tools {
        println!("  {}  {}", tool.name, tool.description.unwrap_or_default());
    }
    println!("Resources ({}):", resources.len());
    for resource in resources {
        println!("  {}  {}", resource.uri, resource.name);
    }
    Ok(())
}

async fn probe_session(
    params: &ConnectionParams,
) -> Result<(Vec<MCPToolSchema>, Vec<MCPResourceSchema>)> {
    let mut toolset = RemoteToolset::open("probe", params, None).await?;
    let listed = list_everything(&mut toolset).await;
    if let Err(e) = toolset.close().await {
        warn!("Error closing probe session: {e}");
    }
    listed
}

async fn list_everything(
    toolset: &mut RemoteToolset,
) -> Result<(Vec<MCPToolSchema>, Vec<MCPResourceSchema>)> {
    let tools = toolset.get_tools().await?;
    let resources = toolset.get_resources().await?;
    Ok((tools, resources))
}
