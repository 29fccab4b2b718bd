//! SQLite-backed response cache partitioned into named namespaces.
//!
//! This module provides the persistent storage behind the asset cache
//! coordinator, using SQLite with async access via tokio-rusqlite:
//!
//! - Named namespaces, created on open and deleted wholesale
//! - Entries keyed by a SHA-256 hash of method and canonical URL
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod namespaces;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{CachedResponse, EntryMeta, RequestKey, ResponseSnapshot};
pub use namespaces::NamespaceSummary;
