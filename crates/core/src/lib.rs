//! Core types and shared functionality for asset-cache.
//!
//! This crate provides:
//! - Namespaced response cache with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CachedResponse, EntryMeta, NamespaceSummary, RequestKey, ResponseSnapshot};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
