//! Shared fixtures for tool tests.

use std::sync::Arc;

use asset_cache_client::{Coordinator, FetchResponse, Fetcher};
use asset_cache_core::{AppConfig, CacheDb, Error};
use async_trait::async_trait;
use rmcp::model::CallToolResult;

/// Fetcher for a machine with no network.
pub(crate) struct OfflineFetcher;

#[async_trait]
impl Fetcher for OfflineFetcher {
    async fn fetch(&self, url: &url::Url) -> Result<FetchResponse, Error> {
        Err(Error::HttpError(format!("network error: {url} unreachable")))
    }
}

pub(crate) async fn offline_coordinator() -> Coordinator {
    let db = CacheDb::open_in_memory().await.unwrap();
    Coordinator::from_config(db, Arc::new(OfflineFetcher), &AppConfig::default()).unwrap()
}

/// Parse the JSON text of the first content block.
pub(crate) fn output_json(result: &CallToolResult) -> serde_json::Value {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
