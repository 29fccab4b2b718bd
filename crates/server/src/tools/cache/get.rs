//! cache_get tool implementation.
//!
//! Retrieves one stored response by URL.

use asset_cache_client::fetch::canonicalize;
use asset_cache_client::Coordinator;
use asset_cache_core::{Error, RequestKey};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// URL or site path of the stored request.
    pub url: String,

    /// Restrict the lookup to one namespace; otherwise the oldest match wins.
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub namespace: String,
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub stored_at: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(coordinator: &Coordinator, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url =
        canonicalize(&params.url, &coordinator.manifest().origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let key = RequestKey::get(url.as_str());

    let hit = match &params.namespace {
        Some(namespace) => coordinator.db().match_in(namespace, &key).await?,
        None => coordinator.db().match_any(&key).await?,
    }
    .ok_or_else(|| Error::CacheMiss(url.to_string()))?;

    let output = CacheGetOutput {
        namespace: hit.namespace,
        url: hit.key.url,
        status: hit.response.status,
        status_text: hit.response.status_text,
        headers: hit.response.headers,
        body: String::from_utf8_lossy(&hit.response.body).into_owned(),
        stored_at: hit.stored_at,
    };

    json_result(&output)
}
