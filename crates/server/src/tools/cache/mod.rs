//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting and pruning the namespaced cache.

pub mod get;
pub mod namespaces;
pub mod purge;

pub use get::{CacheGetParams, get_impl};
pub use namespaces::namespaces_impl;
pub use purge::{CachePurgeParams, purge_impl};
