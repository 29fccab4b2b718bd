//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (ASSET_CACHE_*)
//! 2. TOML config file (if ASSET_CACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Seed lists and route patterns are literal configuration: they are read once
//! at startup and never discovered at runtime.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (ASSET_CACHE_*)
/// 2. TOML config file (if ASSET_CACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin of the site whose requests are intercepted.
    ///
    /// Relative URLs (seed lists, prefetch messages) resolve against it.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// User-Agent string for outgoing requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to read per response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Optional request timeout in milliseconds. Unset means fetches wait
    /// until the transport resolves or fails.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Redirects followed per fetch.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Deployment version suffixed onto every namespace name.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Critical-path pages cached at install and refreshed in the background on hit.
    #[serde(default = "default_critical_urls")]
    pub critical_urls: Vec<String>,

    /// Static assets cached at install.
    #[serde(default = "default_static_urls")]
    pub static_urls: Vec<String>,

    /// Cross-origin font files cached at install alongside static assets.
    #[serde(default = "default_font_urls")]
    pub font_urls: Vec<String>,

    /// Origins whose requests are served cache-first from the static namespace.
    #[serde(default = "default_font_origins")]
    pub font_origins: Vec<String>,

    /// Path regexes routed network-first, in priority order.
    #[serde(default = "default_network_first_patterns")]
    pub network_first_patterns: Vec<String>,

    /// Path regexes routed cache-first, in priority order.
    #[serde(default = "default_cache_first_patterns")]
    pub cache_first_patterns: Vec<String>,

    /// Seed fetches in flight at once during install.
    #[serde(default = "default_install_concurrency")]
    pub install_concurrency: usize,

    /// Run install and activate when the server starts.
    #[serde(default = "default_true")]
    pub install_on_start: bool,

    /// How long shutdown waits for background fetches before aborting them.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./asset-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:4321".into()
}

fn default_user_agent() -> String {
    "asset-cache/0.1".into()
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_max_redirects() -> usize {
    5
}

fn default_cache_version() -> String {
    "v2.0".into()
}

fn default_critical_urls() -> Vec<String> {
    vec!["/".into(), "/posts".into(), "/about".into()]
}

fn default_static_urls() -> Vec<String> {
    vec![
        "/favicon.ico".into(),
        "/favicon.svg".into(),
        "/logo.png".into(),
        "/scripts/hamburger-menu.js".into(),
        "/scripts/performance-optimizations.js".into(),
    ]
}

fn default_font_urls() -> Vec<String> {
    vec![
        "https://fonts.gstatic.com/s/inter/v13/UcCO3FwrK3iLTeHuS_fvQtMwCp50KnMw2boKoduKmMEVuLyfAZ9hiA.woff2".into(),
    ]
}

fn default_font_origins() -> Vec<String> {
    vec!["https://fonts.googleapis.com".into(), "https://fonts.gstatic.com".into()]
}

fn default_network_first_patterns() -> Vec<String> {
    vec![r"/api/".into(), r"/rss\.xml$".into(), r"/sitemap".into()]
}

fn default_cache_first_patterns() -> Vec<String> {
    vec![
        r"\.(?:js|css|woff|woff2|ttf|eot)$".into(),
        r"/assets/".into(),
        r"/images/".into(),
        r"/scripts/".into(),
    ]
}

fn default_install_concurrency() -> usize {
    4
}

fn default_shutdown_grace_ms() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: None,
            max_redirects: default_max_redirects(),
            cache_version: default_cache_version(),
            critical_urls: default_critical_urls(),
            static_urls: default_static_urls(),
            font_urls: default_font_urls(),
            font_origins: default_font_origins(),
            network_first_patterns: default_network_first_patterns(),
            cache_first_patterns: default_cache_first_patterns(),
            install_concurrency: default_install_concurrency(),
            install_on_start: true,
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Name of the namespace holding critical-path pages.
    pub fn critical_namespace(&self) -> String {
        format!("critical-{}", self.cache_version)
    }

    /// Name of the namespace holding static assets and fonts.
    pub fn static_namespace(&self) -> String {
        format!("static-{}", self.cache_version)
    }

    /// Name of the namespace holding opportunistically cached dynamic content.
    pub fn dynamic_namespace(&self) -> String {
        format!("dynamic-{}", self.cache_version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `ASSET_CACHE_`
    /// 2. TOML file from `ASSET_CACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("ASSET_CACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("ASSET_CACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
