//! Demo e-commerce MCP server over streamable HTTP.
//!
//! Exposes a product catalog resource and two tools, `add_to_cart` and
//! `checkout`. Nothing is persisted; the tools only acknowledge the request.

use std::future::Future;
use std::sync::Arc;

use rmcp::{
    model::{
        AnnotateAble, CallToolRequestParams, CallToolResult, Content, Implementation,
        ListResourcesResult, ListToolsResult, PaginatedRequestParams, RawResource,
        ReadResourceRequestParams, ReadResourceResult, Resource, ResourceContents,
        ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
    },
    ErrorData, RoleServer, ServerHandler,
};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::mcp::SchemaBuilder;

pub const SERVER_NAME: &str = "Ecommerce Server";
pub const PRODUCTS_URI: &str = "products://list_products";
pub const MCP_PATH: &str = "/mcp";
pub const PRODUCTS: [&str; 5] = ["Laptop", "Smartphone", "Headphones", "Camera", "Smartwatch"];

/// Handler backing every MCP session of the demo server.
#[derive(Debug, Clone, Default)]
pub struct EcommerceServer;

impl EcommerceServer {
    pub fn new() -> Self {
        Self
    }

    pub fn tools(&self) -> Vec<Tool> {
        let add_to_cart = Tool::new(
            "add_to_cart",
            "Add a product to the shopping cart. The product name should match one of the available products.",
            Arc::new(
                SchemaBuilder::new()
                    .property("product_name", json!({ "type": "string" }), true)
                    .build_object(),
            ),
        );

        let mut checkout = Tool::new(
            "checkout",
            "Proceed to checkout and finalize the purchase of items in the cart.",
            Arc::new(SchemaBuilder::new().build_object()),
        );
        checkout.title = Some("cart checkout".into());

        vec![add_to_cart, checkout]
    }

    pub fn resources(&self) -> Vec<Resource> {
        let mut products = RawResource::new(PRODUCTS_URI, "list_products");
        products.description = Some("List the products available in the store.".into());
        products.mime_type = Some("application/json".into());
        vec![products.no_annotation()]
    }

    /// Run one tool call.
    pub fn dispatch(
        &self,
        name: &str,
        arguments: Option<&serde_json::Map<String, serde_json::Value>>,
    ) -> Result<CallToolResult, ErrorData> {
        match name {
            "add_to_cart" => {
                let product_name = arguments
                    .and_then(|args| args.get("product_name"))
                    .and_then(|value| value.as_str())
                    .ok_or_else(|| {
                        ErrorData::invalid_params("add_to_cart requires a string 'product_name'", None)
                    })?;
                info!(product = %product_name, "added to cart");
                Ok(CallToolResult::success(vec![Content::text(format!(
                    "Product '{product_name}' has been added to your cart."
                ))]))
            }
            "checkout" => {
                info!("checkout");
                Ok(CallToolResult::success(vec![Content::text(
                    "Checkout complete! Your order has been placed successfully.",
                )]))
            }
            other => Err(ErrorData::invalid_params(
                format!("unknown tool '{other}'"),
                None,
            )),
        }
    }

    pub fn read(&self, uri: &str) -> Result<ReadResourceResult, ErrorData> {
        if uri != PRODUCTS_URI {
            return Err(ErrorData::resource_not_found(
                format!("unknown resource '{uri}'"),
                Some(json!({ "uri": uri })),
            ));
        }
        let catalog = serde_json::to_string(&PRODUCTS)
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(catalog, uri)],
        })
    }
}

impl ServerHandler for EcommerceServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder()
            .enable_tools()
            .enable_resources()
            .build();
        info.server_info = Implementation {
            name: SERVER_NAME.into(),
            ..Implementation::from_build_env()
        };
        info.instructions = Some("Ecommerce Server: browse products, add them to a cart, check out.".into());
        info
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.dispatch(&request.name, request.arguments.as_ref())
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        Ok(ListResourcesResult::with_all_items(self.resources()))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        self.read(&request.uri)
    }
}

/// Axum router serving the MCP endpoint at [`MCP_PATH`].
pub fn router() -> axum::Router {
    let mut config = StreamableHttpServerConfig::default();
    config.stateful_mode = false;

    let service = StreamableHttpService::new(
        || Ok(EcommerceServer::new()),
        LocalSessionManager::default().into(),
        config,
    );
    axum::Router::new().nest_service(MCP_PATH, service)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!("Ecommerce server running on http://{addr}{MCP_PATH}");
    let result = axum::serve(listener, router())
        .with_graceful_shutdown(shutdown)
        .await;
    if let Err(e) = &result {
        warn!("Server error: {e}");
    }
    info!("Ecommerce server stopped");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_of(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|item| item.as_text().map(|text| text.text.clone()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn advertises_cart_tools() {
        let tools = EcommerceServer::new().tools();
        let names = tools.iter().map(|t| t.name.to_string()).collect::<Vec<_>>();
        assert_eq!(names, vec!["add_to_cart", "checkout"]);
        assert_eq!(tools[1].title.as_deref(), Some("cart checkout"));
        assert_eq!(
            tools[0].input_schema.get("required"),
            Some(&json!(["product_name"]))
        );
    }

    #[test]
    fn announces_itself_by_server_name() {
        let info = EcommerceServer::new().get_info();
        assert_eq!(info.server_info.name, SERVER_NAME);
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn add_to_cart_acknowledges_product() {
        let args = json!({ "product_name": "Laptop" });
        let result = EcommerceServer::new()
            .dispatch("add_to_cart", args.as_object())
            .expect("add_to_cart should succeed");
        assert_eq!(text_of(&result), "Product 'Laptop' has been added to your cart.");
    }

    #[test]
    fn add_to_cart_requires_product_name() {
        assert!(EcommerceServer::new().dispatch("add_to_cart", None).is_err());
    }

    #[test]
    fn checkout_completes() {
        let result = EcommerceServer::new()
            .dispatch("checkout", None)
            .expect("checkout should succeed");
        assert_eq!(
            text_of(&result),
            "Checkout complete! Your order has been placed successfully."
        );
    }

    #[test]
    fn unknown_tool_is_rejected() {
        assert!(EcommerceServer::new().dispatch("refund", None).is_err());
    }

    #[test]
    fn catalog_resource_lists_products() {
        let server = EcommerceServer::new();
        let resources = server.resources();
        assert_eq!(resources[0].raw.uri, PRODUCTS_URI);

        let read = server.read(PRODUCTS_URI).expect("catalog should read");
        match &read.contents[0] {
            ResourceContents::TextResourceContents { text, .. } => {
                let products: Vec<String> = serde_json::from_str(text).expect("catalog json");
                assert_eq!(products, PRODUCTS.to_vec());
            }
            other => panic!("expected text contents, got {other:?}"),
        }
        assert!(server.read("products://missing").is_err());
    }
}
