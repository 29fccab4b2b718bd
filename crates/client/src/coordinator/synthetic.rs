//! Locally built fallbacks for when neither network nor cache can answer.

use asset_cache_core::ResponseSnapshot;

/// The three offline fallbacks, one per strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    /// Network-first request with no cached copy.
    Content,
    /// Cache-first asset with no cached copy.
    Resource,
    /// Page with neither a cached copy nor a live response.
    Page,
}

impl Unavailable {
    pub fn body(&self) -> &'static str {
        match self {
            Unavailable::Content => "Offline - content not available",
            Unavailable::Resource => "Resource not available offline",
            Unavailable::Page => "Page not available offline",
        }
    }

    pub fn response(&self) -> ResponseSnapshot {
        ResponseSnapshot {
            status: 503,
            status_text: "Service Unavailable".to_string(),
            headers: vec![("content-type".to_string(), "text/plain; charset=utf-8".to_string())],
            body: self.body().as_bytes().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_fallbacks_are_503() {
        for kind in [Unavailable::Content, Unavailable::Resource, Unavailable::Page] {
            let response = kind.response();
            assert_eq!(response.status, 503);
            assert_eq!(response.status_text, "Service Unavailable");
            assert_eq!(response.body, kind.body().as_bytes());
            assert!(!response.is_ok());
        }
    }

    #[test]
    fn test_bodies_are_distinct() {
        assert_ne!(Unavailable::Content.body(), Unavailable::Resource.body());
        assert_ne!(Unavailable::Resource.body(), Unavailable::Page.body());
    }
}
