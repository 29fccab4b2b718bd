//! Messages posted to the worker by page scripts.

use serde::{Deserialize, Serialize};

/// Recognized inbound message shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    /// Warm the dynamic namespace with `url` ahead of navigation.
    #[serde(rename = "PREFETCH_URL")]
    PrefetchUrl { url: String },
}

impl WorkerMessage {
    /// Interpret an arbitrary posted value.
    ///
    /// Returns `None` for anything that is not a recognized message, including
    /// recognized types with missing or mistyped fields.
    pub fn parse(data: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(data.clone()).ok()
    }
}
