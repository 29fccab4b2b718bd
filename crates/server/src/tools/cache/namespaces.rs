//! cache_namespaces tool implementation.
//!
//! Lists every namespace, flagging the ones the current deployment uses.

use asset_cache_client::Coordinator;
use asset_cache_core::NamespaceSummary;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NamespaceEntry {
    #[serde(flatten)]
    pub summary: NamespaceSummary,
    /// False for namespaces the next activation will delete.
    pub current: bool,
}

/// Output from the cache_namespaces tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheNamespacesOutput {
    pub namespaces: Vec<NamespaceEntry>,
}

/// Implementation of the cache_namespaces tool.
pub async fn namespaces_impl(coordinator: &Coordinator) -> Result<CallToolResult, McpError> {
    let current = coordinator.manifest().current_namespaces();
    let namespaces = coordinator
        .db()
        .namespace_summaries()
        .await?
        .into_iter()
        .map(|summary| NamespaceEntry { current: current.contains(&summary.name.as_str()), summary })
        .collect();

    json_result(&CacheNamespacesOutput { namespaces })
}
