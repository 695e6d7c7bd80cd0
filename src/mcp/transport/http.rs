use async_trait::async_trait;
use rmcp::model::ClientInfo;
use rmcp::service::{ClientInitializeError, ServiceExt};
use rmcp::transport::StreamableHttpClientTransport;

use super::{MCPRunningService, MCPTransport};

/// Streamable HTTP MCP transport (for remote MCP servers).
pub struct StreamableHttpTransport {
    url: String,
}

impl StreamableHttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MCPTransport for StreamableHttpTransport {
    async fn connect(
        &mut self,
        client_info: ClientInfo,
    ) -> Result<MCPRunningService, ClientInitializeError> {
        let transport = StreamableHttpClientTransport::from_uri(self.url.clone());
        client_info.into_dyn().serve(transport).await
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
