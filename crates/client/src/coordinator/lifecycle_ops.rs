//! Install and activate: warming the seed namespaces and dropping stale ones.

use std::sync::Arc;

use asset_cache_core::{Error, RequestKey};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use super::Coordinator;

/// A seed URL that could not be cached during install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedFailure {
    pub namespace: String,
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReport {
    /// Seed URLs stored, in completion order.
    pub cached: Vec<String>,
    pub failed: Vec<SeedFailure>,
    /// Always true on success: the new worker does not wait for old pages to close.
    pub skip_waiting: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateReport {
    /// Namespaces removed because they belong to another deployment.
    pub deleted: Vec<String>,
    /// Namespaces kept.
    pub kept: Vec<String>,
    pub controls_clients: bool,
}

impl Coordinator {
    /// Populate the critical and static namespaces from the seed lists.
    ///
    /// Seeds are fetched independently; one failing seed is logged and
    /// reported but never stops the rest. Only a storage failure while
    /// opening the namespaces fails the install.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.lifecycle.lock().await.begin_install()?;

        let critical = self.manifest.critical_namespace.clone();
        let statics = self.manifest.static_namespace.clone();

        for namespace in [&critical, &statics] {
            if let Err(e) = self.db.open_namespace(namespace).await {
                self.lifecycle.lock().await.fail_install();
                return Err(e);
            }
        }

        let seeds: Vec<(String, Url)> = self
            .manifest
            .critical_urls
            .iter()
            .map(|u| (critical.clone(), u.clone()))
            .chain(
                self.manifest
                    .static_urls
                    .iter()
                    .chain(self.manifest.font_urls.iter())
                    .map(|u| (statics.clone(), u.clone())),
            )
            .collect();

        tracing::info!(seeds = seeds.len(), "installing asset cache");

        let semaphore = Arc::new(Semaphore::new(self.manifest.install_concurrency));
        let mut join_set = JoinSet::new();

        for (namespace, url) in seeds {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::InvalidState(format!("install semaphore closed: {e}")))?;
            let this = self.clone();

            join_set.spawn(async move {
                let _permit = permit;
                let result = this.seed(&namespace, &url).await;
                (namespace, url, result)
            });
        }

        let mut report = InstallReport::default();

        while let Some(joined) = join_set.join_next().await {
            let (namespace, url, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tracing::warn!(error = %e, "seed task panicked");
                    continue;
                }
            };

            match result {
                Ok(()) => report.cached.push(url.to_string()),
                Err(reason) => {
                    tracing::warn!(namespace = %namespace, url = %url, reason = %reason, "seed cache failed");
                    report.failed.push(SeedFailure { namespace, url: url.to_string(), reason });
                }
            }
        }

        let mut lifecycle = self.lifecycle.lock().await;
        lifecycle.finish_install();
        report.skip_waiting = lifecycle.skip_waiting;

        tracing::info!(cached = report.cached.len(), failed = report.failed.len(), "install complete");

        Ok(report)
    }

    /// Fetch one seed and store it. Non-2xx counts as a failure.
    async fn seed(&self, namespace: &str, url: &Url) -> Result<(), String> {
        let response = self.fetcher.fetch(url).await.map_err(|e| e.to_string())?;
        if !response.is_ok() {
            return Err(format!("status {}", response.status.as_u16()));
        }
        self.db
            .put(namespace, &RequestKey::get(url.as_str()), &response.to_snapshot())
            .await
            .map_err(|e| e.to_string())
    }

    /// Delete every namespace that is not one of the three current ones,
    /// then take control of all open pages.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.lifecycle.lock().await.begin_activate()?;

        match self.prune_namespaces().await {
            Ok(mut report) => {
                let mut lifecycle = self.lifecycle.lock().await;
                lifecycle.finish_activate();
                report.controls_clients = lifecycle.controls_clients;
                Ok(report)
            }
            Err(e) => {
                self.lifecycle.lock().await.abort_activate();
                Err(e)
            }
        }
    }

    async fn prune_namespaces(&self) -> Result<ActivateReport, Error> {
        let current = self.manifest.current_namespaces();
        let mut report = ActivateReport::default();

        for name in self.db.namespace_names().await? {
            if current.contains(&name.as_str()) {
                report.kept.push(name);
                continue;
            }
            self.db.delete_namespace(&name).await?;
            tracing::info!(namespace = %name, "deleted stale cache namespace");
            report.deleted.push(name);
        }

        Ok(report)
    }
}
