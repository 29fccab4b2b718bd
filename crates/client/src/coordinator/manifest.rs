//! Immutable worker-wide settings, built once from `AppConfig`.

use asset_cache_core::{AppConfig, Error};
use url::Url;

use crate::fetch::url::canonicalize;
use crate::routing::RouteTable;

/// Namespace names, seed lists, and routing rules for one deployment.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub origin: Url,
    pub critical_namespace: String,
    pub static_namespace: String,
    pub dynamic_namespace: String,
    pub critical_urls: Vec<Url>,
    pub static_urls: Vec<Url>,
    pub font_urls: Vec<Url>,
    pub routes: RouteTable,
    pub install_concurrency: usize,
}

fn resolve_all(field: &str, urls: &[String], origin: &Url) -> Result<Vec<Url>, Error> {
    urls.iter()
        .map(|u| canonicalize(u, origin).map_err(|e| Error::InvalidUrl(format!("{field} entry {u}: {e}"))))
        .collect()
}

impl Manifest {
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;

        Ok(Self {
            critical_namespace: config.critical_namespace(),
            static_namespace: config.static_namespace(),
            dynamic_namespace: config.dynamic_namespace(),
            critical_urls: resolve_all("critical_urls", &config.critical_urls, &origin)?,
            static_urls: resolve_all("static_urls", &config.static_urls, &origin)?,
            font_urls: resolve_all("font_urls", &config.font_urls, &origin)?,
            routes: RouteTable::from_config(config)?,
            install_concurrency: config.install_concurrency.max(1),
            origin,
        })
    }

    /// The namespaces that survive activation.
    pub fn current_namespaces(&self) -> [&str; 3] {
        [self.critical_namespace.as_str(), self.static_namespace.as_str(), self.dynamic_namespace.as_str()]
    }

    /// Whether `url` is one of the critical-path pages.
    pub fn is_critical(&self, url: &Url) -> bool {
        self.critical_urls.iter().any(|c| c == url)
    }
}
