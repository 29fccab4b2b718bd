//! asset_fetch tool implementation.
//!
//! Runs one request through the coordinator exactly as a page fetch would be
//! intercepted.

use asset_cache_client::{AssetRequest, Coordinator, ResponseSource};
use asset_cache_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for asset_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetFetchParams {
    /// Absolute URL, or a path resolved against the site origin.
    pub url: String,

    /// HTTP method (default: GET). Anything else is passed through.
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for asset_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetFetchOutput {
    /// False when the request is not intercepted (non-GET or non-HTTP).
    pub intercepted: bool,
    /// Strategy that served the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// "network", "cache", or "synthetic".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Namespace the cached copy came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(default)]
    pub headers: Vec<HeaderPair>,
    /// Body decoded as UTF-8 (lossy).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub body_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HeaderPair {
    pub name: String,
    pub value: String,
}

/// Implementation of the asset_fetch tool.
pub async fn fetch_impl(coordinator: &Coordinator, params: AssetFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let request = AssetRequest { method: params.method, url: params.url };

    let output = match coordinator.intercept(&request).await {
        None => AssetFetchOutput {
            intercepted: false,
            strategy: None,
            source: None,
            namespace: None,
            status: None,
            status_text: None,
            headers: Vec::new(),
            body: None,
            body_len: 0,
        },
        Some(res) => {
            let (source, namespace) = match res.source {
                ResponseSource::Network => ("network", None),
                ResponseSource::Cache { namespace } => ("cache", Some(namespace)),
                ResponseSource::Synthetic => ("synthetic", None),
            };
            AssetFetchOutput {
                intercepted: true,
                strategy: Some(res.strategy.to_string()),
                source: Some(source.to_string()),
                namespace,
                status: Some(res.response.status),
                status_text: Some(res.response.status_text.clone()),
                headers: res
                    .response
                    .headers
                    .iter()
                    .map(|(name, value)| HeaderPair { name: name.clone(), value: value.clone() })
                    .collect(),
                body_len: res.response.body.len(),
                body: Some(String::from_utf8_lossy(&res.response.body).into_owned()),
            }
        }
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{offline_coordinator, output_json};
    use asset_cache_core::{RequestKey, ResponseSnapshot};

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let coordinator = offline_coordinator().await;
        let params = AssetFetchParams { url: "  ".into(), method: "GET".into() };
        assert!(fetch_impl(&coordinator, params).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_offline_api() {
        let coordinator = offline_coordinator().await;
        let params = AssetFetchParams { url: "/api/data".into(), method: default_method() };

        let output = output_json(&fetch_impl(&coordinator, params).await.unwrap());
        assert_eq!(output["intercepted"], true);
        assert_eq!(output["strategy"], "network_first");
        assert_eq!(output["source"], "synthetic");
        assert_eq!(output["status"], 503);
        assert_eq!(output["body"], "Offline - content not available");
    }

    #[tokio::test]
    async fn test_fetch_cached_asset() {
        let coordinator = offline_coordinator().await;
        let snapshot = ResponseSnapshot {
            status: 200,
            status_text: "OK".into(),
            headers: vec![("content-type".into(), "text/css".into())],
            body: b"body{}".to_vec(),
        };
        coordinator
            .db()
            .put("static-v2.0", &RequestKey::get("http://localhost:4321/assets/site.css"), &snapshot)
            .await
            .unwrap();

        let params = AssetFetchParams { url: "/assets/site.css".into(), method: default_method() };
        let output = output_json(&fetch_impl(&coordinator, params).await.unwrap());
        assert_eq!(output["source"], "cache");
        assert_eq!(output["namespace"], "static-v2.0");
        assert_eq!(output["body_len"], 6);
        assert_eq!(output["headers"][0]["value"], "text/css");
    }

    #[tokio::test]
    async fn test_fetch_post_passes_through() {
        let coordinator = offline_coordinator().await;
        let params = AssetFetchParams { url: "/api/data".into(), method: "POST".into() };

        let output = output_json(&fetch_impl(&coordinator, params).await.unwrap());
        assert_eq!(output["intercepted"], false);
        assert!(output.get("status").is_none());
    }
}
