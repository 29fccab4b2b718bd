//! Strategy dispatch over URL patterns.
//!
//! Rules are evaluated first-match-wins in a fixed order:
//! network-first path patterns, cache-first path patterns, font origins,
//! then stale-while-revalidate as the fallback for pages.

use asset_cache_core::{AppConfig, Error};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetch::url::origin_of;

/// Caching strategy chosen for one intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    NetworkFirst,
    CacheFirst,
    StaleWhileRevalidate,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::NetworkFirst => "network_first",
            Strategy::CacheFirst => "cache_first",
            Strategy::StaleWhileRevalidate => "stale_while_revalidate",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule matched, kept for logging and tool output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    NetworkFirstPattern(usize),
    CacheFirstPattern(usize),
    FontOrigin,
    Fallback,
}

/// Compiled, ordered routing rules.
#[derive(Debug, Clone)]
pub struct RouteTable {
    network_first: Vec<Regex>,
    cache_first: Vec<Regex>,
    font_origins: Vec<String>,
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, Error> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(|e| Error::InvalidPattern(format!("{p}: {e}"))))
        .collect()
}

impl RouteTable {
    /// Compile the pattern lists.
    ///
    /// Font origins are normalized to `scheme://host[:port]` so they compare
    /// equal to [`origin_of`] output.
    pub fn new(
        network_first: &[String], cache_first: &[String], font_origins: &[String],
    ) -> Result<Self, Error> {
        let font_origins = font_origins
            .iter()
            .map(|o| {
                Url::parse(o)
                    .map(|u| origin_of(&u))
                    .map_err(|e| Error::InvalidUrl(format!("font origin {o}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { network_first: compile(network_first)?, cache_first: compile(cache_first)?, font_origins })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::new(&config.network_first_patterns, &config.cache_first_patterns, &config.font_origins)
    }

    /// Find the rule that applies to `url`.
    ///
    /// Path patterns are tested against the path only, so they fire for
    /// any origin.
    pub fn route(&self, url: &Url) -> RouteMatch {
        let path = url.path();

        if let Some(i) = self.network_first.iter().position(|re| re.is_match(path)) {
            return RouteMatch::NetworkFirstPattern(i);
        }
        if let Some(i) = self.cache_first.iter().position(|re| re.is_match(path)) {
            return RouteMatch::CacheFirstPattern(i);
        }
        if self.font_origins.iter().any(|o| *o == origin_of(url)) {
            return RouteMatch::FontOrigin;
        }
        RouteMatch::Fallback
    }

    /// Strategy for `url`.
    pub fn classify(&self, url: &Url) -> Strategy {
        match self.route(url) {
            RouteMatch::NetworkFirstPattern(_) => Strategy::NetworkFirst,
            RouteMatch::CacheFirstPattern(_) | RouteMatch::FontOrigin => Strategy::CacheFirst,
            RouteMatch::Fallback => Strategy::StaleWhileRevalidate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::from_config(&AppConfig::default()).unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_network_first_paths() {
        let t = table();
        assert_eq!(t.classify(&url("http://localhost:4321/api/data")), Strategy::NetworkFirst);
        assert_eq!(t.classify(&url("http://localhost:4321/rss.xml")), Strategy::NetworkFirst);
        assert_eq!(t.classify(&url("http://localhost:4321/sitemap-index.xml")), Strategy::NetworkFirst);
    }

    #[test]
    fn test_cache_first_paths() {
        let t = table();
        assert_eq!(t.classify(&url("http://localhost:4321/assets/app.js")), Strategy::CacheFirst);
        assert_eq!(t.classify(&url("http://localhost:4321/site.css")), Strategy::CacheFirst);
        assert_eq!(t.classify(&url("http://localhost:4321/images/hero.png")), Strategy::CacheFirst);
        assert_eq!(t.route(&url("http://localhost:4321/images/hero.png")), RouteMatch::CacheFirstPattern(2));
    }

    #[test]
    fn test_order_breaks_ties() {
        // Matches both `/api/` and the `.js` extension rule.
        let t = table();
        assert_eq!(t.route(&url("http://localhost:4321/api/config.js")), RouteMatch::NetworkFirstPattern(0));
    }

    #[test]
    fn test_font_origin() {
        let t = table();
        let css = url("https://fonts.googleapis.com/css2?family=Inter");
        assert_eq!(t.route(&css), RouteMatch::FontOrigin);
        assert_eq!(t.classify(&css), Strategy::CacheFirst);
    }

    #[test]
    fn test_pages_fall_back_to_swr() {
        let t = table();
        assert_eq!(t.classify(&url("http://localhost:4321/")), Strategy::StaleWhileRevalidate);
        assert_eq!(t.classify(&url("http://localhost:4321/posts/hello-world")), Strategy::StaleWhileRevalidate);
        // Query strings are not part of the path.
        assert_eq!(t.classify(&url("http://localhost:4321/posts?file=app.js")), Strategy::StaleWhileRevalidate);
    }

    #[test]
    fn test_invalid_pattern() {
        let result = RouteTable::new(&["(".to_string()], &[], &[]);
        assert!(matches!(result, Err(Error::InvalidPattern(_))));
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(Strategy::StaleWhileRevalidate.to_string(), "stale_while_revalidate");
    }
}
