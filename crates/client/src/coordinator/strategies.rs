//! The three caching strategies.

use asset_cache_core::RequestKey;
use tokio::sync::oneshot;
use url::Url;

use super::{Coordinator, CoordinatorResponse, Unavailable};
use crate::routing::Strategy;

impl Coordinator {
    /// Live response first; a 2xx is copied into the dynamic namespace.
    ///
    /// Non-2xx responses are returned as-is and not stored. Only a transport
    /// failure falls back to the cache.
    pub(crate) async fn network_first(&self, url: Url) -> CoordinatorResponse {
        let key = RequestKey::get(url.as_str());

        match self.fetcher.fetch(&url).await {
            Ok(response) => {
                let snapshot = response.to_snapshot();
                if response.is_ok() {
                    self.store(&self.manifest.dynamic_namespace, &key, &snapshot).await;
                }
                CoordinatorResponse::network(Strategy::NetworkFirst, snapshot)
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "network-first fetch failed; trying cache");
                match self.lookup(&key).await {
                    Some(hit) => CoordinatorResponse::cached(Strategy::NetworkFirst, hit),
                    None => CoordinatorResponse::unavailable(Strategy::NetworkFirst, Unavailable::Content),
                }
            }
        }
    }

    /// Cached copy first; misses are fetched and stored in `namespace`.
    ///
    /// A hit on a critical-path page also starts one detached refresh of that
    /// entry, which never affects the response returned here.
    pub(crate) async fn cache_first(&self, url: Url, namespace: &str) -> CoordinatorResponse {
        let key = RequestKey::get(url.as_str());

        if let Some(hit) = self.lookup(&key).await {
            if self.manifest.is_critical(&url) {
                let this = self.clone();
                let namespace = namespace.to_string();
                self.spawn_background(async move {
                    this.refresh(&url, &namespace).await;
                })
                .await;
            }
            return CoordinatorResponse::cached(Strategy::CacheFirst, hit);
        }

        match self.fetcher.fetch(&url).await {
            Ok(response) => {
                let snapshot = response.to_snapshot();
                if response.is_ok() {
                    self.store(namespace, &key, &snapshot).await;
                }
                CoordinatorResponse::network(Strategy::CacheFirst, snapshot)
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "cache-first miss and fetch failed");
                CoordinatorResponse::unavailable(Strategy::CacheFirst, Unavailable::Resource)
            }
        }
    }

    /// Cached copy immediately if present, while a detached fetch rewrites the
    /// entry in the critical namespace. Without a cached copy the live result
    /// is awaited.
    pub(crate) async fn stale_while_revalidate(&self, url: Url) -> CoordinatorResponse {
        let key = RequestKey::get(url.as_str());
        let cached = self.lookup(&key).await;
        let (tx, rx) = oneshot::channel();

        let this = self.clone();
        self.spawn_background(async move {
            let live = match this.fetcher.fetch(&url).await {
                Ok(response) => {
                    let snapshot = response.to_snapshot();
                    if response.is_ok() {
                        this.store(&this.manifest.critical_namespace, &key, &snapshot).await;
                    }
                    Some(snapshot)
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "revalidation fetch failed");
                    None
                }
            };
            // The receiver is gone once a cached copy has been served.
            let _ = tx.send(live);
        })
        .await;

        if let Some(hit) = cached {
            return CoordinatorResponse::cached(Strategy::StaleWhileRevalidate, hit);
        }

        match rx.await {
            Ok(Some(snapshot)) => CoordinatorResponse::network(Strategy::StaleWhileRevalidate, snapshot),
            _ => CoordinatorResponse::unavailable(Strategy::StaleWhileRevalidate, Unavailable::Page),
        }
    }
}
