//! Scripted fetcher for coordinator tests.

use super::{FetchResponse, Fetcher};
use asset_cache_core::Error;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, Url, header};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
pub(crate) enum Script {
    Respond { status: u16, body: String },
    Fail,
    Hang,
}

/// Fetcher that answers from a per-URL script and counts every call.
///
/// Unscripted URLs fail like an unreachable network.
#[derive(Debug, Default)]
pub(crate) struct MockFetcher {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<String>>,
    total: AtomicUsize,
}

impl MockFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, url: &str, status: u16, body: &str) {
        self.set(url, Script::Respond { status, body: body.to_string() });
    }

    pub(crate) fn fail(&self, url: &str) {
        self.set(url, Script::Fail);
    }

    pub(crate) fn hang(&self, url: &str) {
        self.set(url, Script::Hang);
    }

    fn set(&self, url: &str, script: Script) {
        self.scripts.lock().unwrap().insert(url.to_string(), script);
    }

    pub(crate) fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| u.as_str() == url).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, Error> {
        self.total.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(url.to_string());
        let script = self.scripts.lock().unwrap().get(url.as_str()).cloned();

        match script {
            Some(Script::Respond { status, body }) => {
                let mut headers = header::HeaderMap::new();
                headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/plain"));
                Ok(FetchResponse {
                    url: url.clone(),
                    final_url: url.clone(),
                    status: StatusCode::from_u16(status).unwrap(),
                    bytes: Bytes::from(body),
                    headers,
                    fetch_ms: 1,
                })
            }
            Some(Script::Hang) => std::future::pending().await,
            Some(Script::Fail) | None => Err(Error::HttpError(format!("network error: {url} unreachable"))),
        }
    }
}
