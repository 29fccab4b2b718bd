//! Worker lifecycle and messaging tools.
//!
//! Install and activate normally run once at startup; the tools exist so a
//! new deployment can be warmed and promoted without restarting.

use asset_cache_client::{Coordinator, MessageOutcome};
use asset_cache_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Parameters for the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// Message payload, e.g. `{"type": "PREFETCH_URL", "url": "/posts/foo"}`.
    pub data: serde_json::Value,
}

/// Parameters for the asset_prefetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AssetPrefetchParams {
    /// URL or site path to warm in the dynamic namespace.
    pub url: String,
}

/// Output from the message tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageOutput {
    /// Whether the message was recognized and acted on.
    pub accepted: bool,
    /// Canonical URL being prefetched, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefetching: Option<String>,
}

impl From<MessageOutcome> for WorkerMessageOutput {
    fn from(outcome: MessageOutcome) -> Self {
        match outcome {
            MessageOutcome::Prefetching { url } => Self { accepted: true, prefetching: Some(url) },
            MessageOutcome::Ignored => Self { accepted: false, prefetching: None },
        }
    }
}

/// Implementation of the worker_install tool.
pub async fn install_impl(coordinator: &Coordinator) -> Result<CallToolResult, McpError> {
    let report = coordinator.install().await?;
    json_result(&report)
}

/// Implementation of the worker_activate tool.
pub async fn activate_impl(coordinator: &Coordinator) -> Result<CallToolResult, McpError> {
    let report = coordinator.activate().await?;
    json_result(&report)
}

/// Implementation of the worker_message tool.
pub async fn message_impl(coordinator: &Coordinator, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let output = WorkerMessageOutput::from(coordinator.handle_message(&params.data).await);
    json_result(&output)
}

/// Implementation of the asset_prefetch tool.
pub async fn prefetch_impl(
    coordinator: &Coordinator, params: AssetPrefetchParams,
) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }
    let data = serde_json::json!({ "type": "PREFETCH_URL", "url": params.url });
    message_impl(coordinator, WorkerMessageParams { data }).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{offline_coordinator, output_json};

    #[tokio::test]
    async fn test_install_then_activate() {
        let coordinator = offline_coordinator().await;

        let installed = output_json(&install_impl(&coordinator).await.unwrap());
        assert_eq!(installed["skip_waiting"], true);
        assert_eq!(installed["cached"].as_array().unwrap().len(), 0);
        assert_eq!(installed["failed"].as_array().unwrap().len(), 9);

        let activated = output_json(&activate_impl(&coordinator).await.unwrap());
        assert_eq!(activated["controls_clients"], true);
    }

    #[tokio::test]
    async fn test_activate_before_install() {
        let coordinator = offline_coordinator().await;
        let err = activate_impl(&coordinator).await.unwrap_err();
        assert_eq!(err.code.0, -32009);
    }

    #[tokio::test]
    async fn test_unknown_message() {
        let coordinator = offline_coordinator().await;
        let params = WorkerMessageParams { data: serde_json::json!({ "type": "CLAIM" }) };

        let output = output_json(&message_impl(&coordinator, params).await.unwrap());
        assert_eq!(output["accepted"], false);
    }

    #[tokio::test]
    async fn test_prefetch_accepted() {
        let coordinator = offline_coordinator().await;
        let params = AssetPrefetchParams { url: "/posts/foo".into() };

        let output = output_json(&prefetch_impl(&coordinator, params).await.unwrap());
        assert_eq!(output["accepted"], true);
        assert_eq!(output["prefetching"], "http://localhost:4321/posts/foo");

        coordinator.settle().await;
    }
}
