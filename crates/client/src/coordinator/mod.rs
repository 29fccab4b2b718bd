//! Asset cache coordinator.
//!
//! Intercepts GET requests for the site and fulfils each one with a
//! caching strategy picked by [`RouteTable`]:
//!
//! - **Network-first**: live fetch, stored in the dynamic namespace; cache
//!   and then a synthetic 503 on transport failure.
//! - **Cache-first**: any cached copy wins; critical pages get one detached
//!   background refresh per hit. Misses are fetched and stored.
//! - **Stale-while-revalidate**: cache lookup, then a detached fetch that
//!   rewrites the entry; a hit never waits on the network.
//!
//! Every failure degrades to a cached copy or a synthetic response. Nothing
//! reaches the requester as an error.

mod lifecycle_ops;
pub mod manifest;
mod strategies;
pub mod synthetic;

pub use lifecycle_ops::{ActivateReport, InstallReport, SeedFailure};
pub use manifest::Manifest;
pub use synthetic::Unavailable;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use asset_cache_core::{AppConfig, CacheDb, CachedResponse, Error, RequestKey, ResponseSnapshot};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use url::Url;

use crate::fetch::{Fetcher, UrlError, canonicalize};
use crate::lifecycle::Lifecycle;
use crate::message::WorkerMessage;
use crate::routing::Strategy;

/// A request issued by a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRequest {
    pub method: String,
    pub url: String,
}

impl AssetRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self { method: "GET".into(), url: url.into() }
    }
}

/// Where a returned response came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache { namespace: String },
    Synthetic,
}

/// Response handed back to the page for an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorResponse {
    pub strategy: Strategy,
    pub source: ResponseSource,
    pub response: ResponseSnapshot,
}

impl CoordinatorResponse {
    fn network(strategy: Strategy, response: ResponseSnapshot) -> Self {
        Self { strategy, source: ResponseSource::Network, response }
    }

    fn cached(strategy: Strategy, hit: CachedResponse) -> Self {
        Self { strategy, source: ResponseSource::Cache { namespace: hit.namespace }, response: hit.response }
    }

    fn unavailable(strategy: Strategy, kind: Unavailable) -> Self {
        Self { strategy, source: ResponseSource::Synthetic, response: kind.response() }
    }
}

/// Result of handling a posted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// A prefetch of this canonical URL was started.
    Prefetching { url: String },
    Ignored,
}

/// The four event kinds a worker receives.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(AssetRequest),
    Message(serde_json::Value),
}

#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivateReport),
    Responded(CoordinatorResponse),
    /// Not intercepted; the page's own network stack handles the request.
    PassedThrough,
    Message(MessageOutcome),
}

/// The coordinator. Cloning shares storage, network, and background tasks.
#[derive(Clone)]
pub struct Coordinator {
    db: CacheDb,
    fetcher: Arc<dyn Fetcher>,
    manifest: Arc<Manifest>,
    lifecycle: Arc<Mutex<Lifecycle>>,
    background: Arc<Mutex<JoinSet<()>>>,
}

impl Coordinator {
    pub fn new(db: CacheDb, fetcher: Arc<dyn Fetcher>, manifest: Manifest) -> Self {
        Self {
            db,
            fetcher,
            manifest: Arc::new(manifest),
            lifecycle: Arc::new(Mutex::new(Lifecycle::default())),
            background: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    pub fn from_config(db: CacheDb, fetcher: Arc<dyn Fetcher>, config: &AppConfig) -> Result<Self, Error> {
        Ok(Self::new(db, fetcher, Manifest::from_config(config)?))
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.lock().await
    }

    /// Handle one worker event.
    ///
    /// Only install and activate can fail, and only on storage errors or
    /// lifecycle misuse.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, Error> {
        match event {
            WorkerEvent::Install => self.install().await.map(EventOutcome::Installed),
            WorkerEvent::Activate => self.activate().await.map(EventOutcome::Activated),
            WorkerEvent::Fetch(request) => Ok(match self.intercept(&request).await {
                Some(response) => EventOutcome::Responded(response),
                None => EventOutcome::PassedThrough,
            }),
            WorkerEvent::Message(data) => Ok(EventOutcome::Message(self.handle_message(&data).await)),
        }
    }

    /// Canonical URL for a request, or `None` if it is not ours to intercept.
    pub fn interceptable(&self, request: &AssetRequest) -> Option<Url> {
        if !request.method.eq_ignore_ascii_case("GET") {
            return None;
        }
        match canonicalize(&request.url, &self.manifest.origin) {
            Ok(url) => Some(url),
            Err(UrlError::UnsupportedScheme(_)) => None,
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "not intercepting unparseable request");
                None
            }
        }
    }

    /// Fulfil a page request, or return `None` to let it through untouched.
    pub async fn intercept(&self, request: &AssetRequest) -> Option<CoordinatorResponse> {
        let url = self.interceptable(request)?;
        let strategy = self.manifest.routes.classify(&url);

        tracing::debug!(url = %url, strategy = %strategy, "intercepted request");

        let response = match strategy {
            Strategy::NetworkFirst => self.network_first(url).await,
            Strategy::CacheFirst => {
                let namespace = self.manifest.static_namespace.clone();
                self.cache_first(url, &namespace).await
            }
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(url).await,
        };
        Some(response)
    }

    /// Handle a message posted by a page script.
    ///
    /// Unrecognized messages and unusable URLs are ignored without error.
    pub async fn handle_message(&self, data: &serde_json::Value) -> MessageOutcome {
        let Some(WorkerMessage::PrefetchUrl { url }) = WorkerMessage::parse(data) else {
            return MessageOutcome::Ignored;
        };

        let url = match canonicalize(&url, &self.manifest.origin) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "ignoring prefetch for unusable URL");
                return MessageOutcome::Ignored;
            }
        };

        let canonical = url.to_string();
        let namespace = self.manifest.dynamic_namespace.clone();
        let this = self.clone();
        self.spawn_background(async move {
            this.refresh(&url, &namespace).await;
        })
        .await;

        MessageOutcome::Prefetching { url: canonical }
    }

    /// Wait for every detached task spawned so far, including ones they spawn.
    pub async fn settle(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.background.lock().await);
            if pending.is_empty() {
                return;
            }
            while let Some(joined) = pending.join_next().await {
                if let Err(e) = joined {
                    tracing::warn!(error = %e, "background cache task panicked");
                }
            }
        }
    }

    /// Like [`settle`](Self::settle), but gives up after `grace` and aborts
    /// whatever is still running. Returns false if anything was aborted.
    pub async fn settle_for(&self, grace: Duration) -> bool {
        if tokio::time::timeout(grace, self.settle()).await.is_ok() {
            return true;
        }
        // Dropping the timed-out settle aborted the tasks it had taken.
        let mut leftover = std::mem::take(&mut *self.background.lock().await);
        leftover.shutdown().await;
        tracing::warn!(grace_ms = grace.as_millis() as u64, "aborted background cache tasks at shutdown");
        false
    }

    /// Run `task` detached from the response path.
    async fn spawn_background<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.background.lock().await;
        while set.try_join_next().is_some() {}
        set.spawn(task);
    }

    /// Fetch `url` and overwrite its entry in `namespace` on a 2xx.
    ///
    /// Failures are logged and dropped.
    async fn refresh(&self, url: &Url, namespace: &str) {
        match self.fetcher.fetch(url).await {
            Ok(response) if response.is_ok() => {
                self.store(namespace, &RequestKey::get(url.as_str()), &response.to_snapshot())
                    .await;
            }
            Ok(response) => {
                tracing::debug!(url = %url, status = response.status.as_u16(), "background fetch not stored");
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "background fetch failed");
            }
        }
    }

    /// Cache lookup across every namespace. Storage errors count as a miss.
    async fn lookup(&self, key: &RequestKey) -> Option<CachedResponse> {
        match self.db.match_any(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(url = %key.url, error = %e, "cache lookup failed");
                None
            }
        }
    }

    /// Store a response, logging instead of failing.
    async fn store(&self, namespace: &str, key: &RequestKey, response: &ResponseSnapshot) {
        if let Err(e) = self.db.put(namespace, key, response).await {
            tracing::warn!(namespace, url = %key.url, error = %e, "cache write failed");
        }
    }
}
