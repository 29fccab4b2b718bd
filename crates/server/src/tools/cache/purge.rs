//! cache_purge tool implementation.
//!
//! Drops a whole namespace, or only the entries whose URL contains a fragment.

use asset_cache_client::Coordinator;
use asset_cache_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Namespace to purge.
    pub namespace: String,

    /// Only delete entries whose URL contains this text. Without it the
    /// namespace itself is deleted.
    #[serde(default)]
    pub url_contains: Option<String>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of entries deleted.
    pub deleted: u64,
    /// Whether the namespace itself was removed.
    pub namespace_deleted: bool,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(coordinator: &Coordinator, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let db = coordinator.db();

    if !db.has_namespace(&params.namespace).await? {
        return Err(Error::UnknownNamespace(params.namespace).into());
    }

    let output = match params.url_contains.as_deref() {
        Some("") => {
            return Err(Error::InvalidInput("url_contains cannot be empty".to_string()).into());
        }
        Some(fragment) => {
            let deleted = db.purge_entries_matching(&params.namespace, fragment).await?;
            CachePurgeOutput { deleted, namespace_deleted: false }
        }
        None => {
            let deleted = db.entries(&params.namespace).await?.len() as u64;
            let namespace_deleted = db.delete_namespace(&params.namespace).await?;
            CachePurgeOutput { deleted, namespace_deleted }
        }
    };

    tracing::info!(namespace = %params.namespace, deleted = output.deleted, "purged cache");

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{offline_coordinator, output_json};
    use asset_cache_core::{RequestKey, ResponseSnapshot};

    fn snapshot() -> ResponseSnapshot {
        ResponseSnapshot { status: 200, status_text: "OK".into(), headers: Vec::new(), body: b"x".to_vec() }
    }

    async fn seeded() -> Coordinator {
        let coordinator = offline_coordinator().await;
        for url in ["http://localhost:4321/api/a", "http://localhost:4321/posts/b"] {
            coordinator
                .db()
                .put("dynamic-v2.0", &RequestKey::get(url), &snapshot())
                .await
                .unwrap();
        }
        coordinator
    }

    #[tokio::test]
    async fn test_purge_matching() {
        let coordinator = seeded().await;
        let params = CachePurgeParams { namespace: "dynamic-v2.0".into(), url_contains: Some("/api/".into()) };

        let output = output_json(&purge_impl(&coordinator, params).await.unwrap());
        assert_eq!(output["deleted"], 1);
        assert_eq!(output["namespace_deleted"], false);
        assert_eq!(coordinator.db().entries("dynamic-v2.0").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_purge_whole_namespace() {
        let coordinator = seeded().await;
        let params = CachePurgeParams { namespace: "dynamic-v2.0".into(), url_contains: None };

        let output = output_json(&purge_impl(&coordinator, params).await.unwrap());
        assert_eq!(output["deleted"], 2);
        assert_eq!(output["namespace_deleted"], true);
        assert!(!coordinator.db().has_namespace("dynamic-v2.0").await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_unknown_namespace() {
        let coordinator = offline_coordinator().await;
        let params = CachePurgeParams { namespace: "nope".into(), url_contains: None };
        assert!(purge_impl(&coordinator, params).await.is_err());
    }

    #[tokio::test]
    async fn test_purge_empty_filter() {
        let coordinator = seeded().await;
        let params = CachePurgeParams { namespace: "dynamic-v2.0".into(), url_contains: Some(String::new()) };
        assert!(purge_impl(&coordinator, params).await.is_err());
    }
}
