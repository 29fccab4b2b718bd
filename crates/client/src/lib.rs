//! Client code for asset-cache.
//!
//! This crate provides the network fetch pipeline, strategy routing, and the
//! asset cache coordinator that the server exposes.

pub mod coordinator;
pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod routing;

pub use coordinator::{
    ActivateReport, AssetRequest, Coordinator, CoordinatorResponse, EventOutcome, InstallReport, Manifest,
    MessageOutcome, ResponseSource, SeedFailure, Unavailable, WorkerEvent,
};
pub use fetch::{FetchConfig, FetchResponse, Fetcher, HttpFetcher};
pub use lifecycle::{Lifecycle, WorkerState};
pub use message::WorkerMessage;
pub use routing::{RouteMatch, RouteTable, Strategy};
