//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use asset_cache_client::Coordinator;

use crate::tools::{
    asset_fetch::{AssetFetchParams, fetch_impl},
    cache::{CacheGetParams, CachePurgeParams, get_impl, namespaces_impl, purge_impl},
    worker::{AssetPrefetchParams, WorkerMessageParams, activate_impl, install_impl, message_impl, prefetch_impl},
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for asset-cache.
#[derive(Clone)]
pub struct AssetCacheServer {
    tool_router: ToolRouter<Self>,
    coordinator: Coordinator,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl AssetCacheServer {
    /// Create a new server handler around a coordinator.
    pub fn new(coordinator: Coordinator) -> Self {
        Self { tool_router: Self::tool_router(), coordinator }
    }

    #[tool(description = "Fetch a URL through the asset cache coordinator. Picks network-first, cache-first, or \
                          stale-while-revalidate by URL pattern and reports which source answered.")]
    async fn asset_fetch(&self, params: Parameters<AssetFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.coordinator, params.0).await
    }

    #[tool(description = "Warm the dynamic cache with a URL in the background.")]
    async fn asset_prefetch(&self, params: Parameters<AssetPrefetchParams>) -> Result<CallToolResult, McpError> {
        prefetch_impl(&self.coordinator, params.0).await
    }

    #[tool(description = "Post a message to the worker. Only {\"type\": \"PREFETCH_URL\", \"url\": ...} is acted on.")]
    async fn worker_message(&self, params: Parameters<WorkerMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.coordinator, params.0).await
    }

    #[tool(description = "Populate the critical and static caches from the seed lists. Failed seeds are reported, \
                          not fatal.")]
    async fn worker_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.coordinator).await
    }

    #[tool(description = "Delete caches from previous deployments and take control of open pages.")]
    async fn worker_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.coordinator).await
    }

    #[tool(description = "List cache namespaces with entry counts.")]
    async fn cache_namespaces(&self) -> Result<CallToolResult, McpError> {
        namespaces_impl(&self.coordinator).await
    }

    #[tool(description = "Read one stored response by URL, optionally from a specific namespace.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.coordinator, params.0).await
    }

    #[tool(description = "Delete a namespace, or only its entries whose URL contains a given text.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.coordinator, params.0).await
    }
}

impl ServerHandler for AssetCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "asset-cache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::offline_coordinator;

    #[tokio::test]
    async fn test_all_tools_registered() {
        let server = AssetCacheServer::new(offline_coordinator().await);
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "asset_fetch",
                "asset_prefetch",
                "cache_get",
                "cache_namespaces",
                "cache_purge",
                "worker_activate",
                "worker_install",
                "worker_message",
            ]
        );
    }
}
