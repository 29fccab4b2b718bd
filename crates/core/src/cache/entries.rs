//! Entry CRUD operations.
//!
//! An entry maps a request descriptor (method + canonical URL) to a stored
//! response snapshot inside one namespace. Entries are never edited in
//! place: `put` replaces the whole row.

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Normalized request descriptor used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    /// Key for a GET of the given canonical URL.
    pub fn get(url: impl Into<String>) -> Self {
        Self { method: "GET".into(), url: url.into() }
    }

    pub fn hash(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}

/// A stored response: status line, headers, and body bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ResponseSnapshot {
    /// True for 2xx statuses, the only ones worth storing.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value with this name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A snapshot read back from storage along with where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub namespace: String,
    pub key: RequestKey,
    pub response: ResponseSnapshot,
    pub stored_at: String,
}

/// Entry listing row, without the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntryMeta {
    pub namespace: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub body_len: u64,
    pub stored_at: String,
}

/// Row as read from SQLite, before the headers JSON is decoded.
struct RawEntry {
    namespace: String,
    method: String,
    url: String,
    status: u16,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
    stored_at: String,
}

impl RawEntry {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            namespace: row.get(0)?,
            method: row.get(1)?,
            url: row.get(2)?,
            status: row.get::<_, i64>(3)? as u16,
            status_text: row.get(4)?,
            headers_json: row.get(5)?,
            body: row.get(6)?,
            stored_at: row.get(7)?,
        })
    }

    fn decode(self) -> Result<CachedResponse, Error> {
        let headers: Vec<(String, String)> = serde_json::from_str(&self.headers_json)?;
        Ok(CachedResponse {
            namespace: self.namespace,
            key: RequestKey { method: self.method, url: self.url },
            response: ResponseSnapshot { status: self.status, status_text: self.status_text, headers, body: self.body },
            stored_at: self.stored_at,
        })
    }
}

const SELECT_COLUMNS: &str = "e.namespace, e.method, e.url, e.status, e.status_text, e.headers_json, e.body, e.stored_at";

impl CacheDb {
    /// Store a response under `key` in `namespace`, replacing any previous entry.
    ///
    /// The namespace is created if it does not exist yet.
    pub async fn put(&self, namespace: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        let namespace = namespace.to_string();
        let key = key.clone();
        let key_hash = key.hash();
        let headers_json = serde_json::to_string(&response.headers)?;
        let response = response.clone();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO namespaces (name, created_at) VALUES (?1, ?2)",
                    params![&namespace, &now],
                )?;
                tx.execute(
                    "INSERT INTO entries (
                        namespace, key_hash, method, url, status, status_text, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(namespace, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        status_text = excluded.status_text,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        &namespace,
                        &key_hash,
                        &key.method,
                        &key.url,
                        response.status as i64,
                        &response.status_text,
                        &headers_json,
                        &response.body,
                        &now,
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up `key` in a single namespace.
    pub async fn match_in(&self, namespace: &str, key: &RequestKey) -> Result<Option<CachedResponse>, Error> {
        let namespace = namespace.to_string();
        let key_hash = key.hash();
        let sql = format!("SELECT {SELECT_COLUMNS} FROM entries e WHERE e.namespace = ?1 AND e.key_hash = ?2");
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let result = conn.query_row(&sql, params![namespace, key_hash], RawEntry::from_row);
                match result {
                    Ok(raw) => raw.decode().map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Look up `key` across every namespace, oldest namespace first.
    pub async fn match_any(&self, key: &RequestKey) -> Result<Option<CachedResponse>, Error> {
        let key_hash = key.hash();
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM entries e
             JOIN namespaces n ON n.name = e.namespace
             WHERE e.key_hash = ?1
             ORDER BY n.rowid ASC
             LIMIT 1"
        );
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let result = conn.query_row(&sql, params![key_hash], RawEntry::from_row);
                match result {
                    Ok(raw) => raw.decode().map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// List entry metadata for one namespace, ordered by URL.
    pub async fn entries(&self, namespace: &str) -> Result<Vec<EntryMeta>, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<EntryMeta>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT namespace, method, url, status, LENGTH(body), stored_at
                     FROM entries WHERE namespace = ?1 ORDER BY url ASC",
                )?;
                let rows = stmt
                    .query_map(params![namespace], |row| {
                        Ok(EntryMeta {
                            namespace: row.get(0)?,
                            method: row.get(1)?,
                            url: row.get(2)?,
                            status: row.get::<_, i64>(3)? as u16,
                            body_len: row.get::<_, i64>(4)? as u64,
                            stored_at: row.get(5)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete entries in `namespace` whose URL contains `fragment` literally.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_entries_matching(&self, namespace: &str, fragment: &str) -> Result<u64, Error> {
        let namespace = namespace.to_string();
        let fragment = fragment.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                // instr, not LIKE: `_` and `%` in URLs are ordinary characters.
                let count = conn.execute(
                    "DELETE FROM entries WHERE namespace = ?1 AND instr(url, ?2) > 0",
                    params![namespace, fragment],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_response(body: &str) -> ResponseSnapshot {
        ResponseSnapshot {
            status: 200,
            status_text: "OK".to_string(),
            headers: vec![("Content-Type".to_string(), "text/html".to_string())],
            body: body.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn test_put_and_match_in() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = RequestKey::get("https://example.com/assets/app.js");

        db.put("static-v1", &key, &make_response("console.log(1)")).await.unwrap();

        let hit = db.match_in("static-v1", &key).await.unwrap().unwrap();
        assert_eq!(hit.namespace, "static-v1");
        assert_eq!(hit.key, key);
        assert_eq!(hit.response.body, b"console.log(1)");
        assert_eq!(hit.response.header("content-type"), Some("text/html"));
        assert!(db.has_namespace("static-v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_replaces_wholesale() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = RequestKey::get("https://example.com/");

        db.put("critical-v1", &key, &make_response("old")).await.unwrap();
        let replacement = ResponseSnapshot { headers: Vec::new(), ..make_response("new") };
        db.put("critical-v1", &key, &replacement).await.unwrap();

        let hit = db.match_in("critical-v1", &key).await.unwrap().unwrap();
        assert_eq!(hit.response, replacement);
        assert_eq!(db.entries("critical-v1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = RequestKey::get("https://example.com/nope");
        assert!(db.match_in("static-v1", &key).await.unwrap().is_none());
        assert!(db.match_any(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_namespace() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = RequestKey::get("https://example.com/posts");

        db.open_namespace("critical-v1").await.unwrap();
        db.open_namespace("dynamic-v1").await.unwrap();
        db.put("dynamic-v1", &key, &make_response("dynamic")).await.unwrap();
        db.put("critical-v1", &key, &make_response("critical")).await.unwrap();

        let hit = db.match_any(&key).await.unwrap().unwrap();
        assert_eq!(hit.namespace, "critical-v1");
        assert_eq!(hit.response.body, b"critical");
    }

    #[tokio::test]
    async fn test_delete_namespace_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = RequestKey::get("https://example.com/old.css");
        db.put("static-v0", &key, &make_response("body{}")).await.unwrap();

        db.delete_namespace("static-v0").await.unwrap();

        assert!(db.match_any(&key).await.unwrap().is_none());
        assert!(db.entries("static-v0").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purge_entries_matching() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("dynamic-v1", &RequestKey::get("https://example.com/api/a"), &make_response("a"))
            .await
            .unwrap();
        db.put("dynamic-v1", &RequestKey::get("https://example.com/posts/b"), &make_response("b"))
            .await
            .unwrap();

        let deleted = db.purge_entries_matching("dynamic-v1", "/api/").await.unwrap();
        assert_eq!(deleted, 1);

        let remaining = db.entries("dynamic-v1").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].url, "https://example.com/posts/b");
        assert_eq!(remaining[0].body_len, 1);
    }

    #[tokio::test]
    async fn test_purge_fragment_is_literal() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("dynamic-v1", &RequestKey::get("https://example.com/posts/my-post"), &make_response("a"))
            .await
            .unwrap();
        db.put("dynamic-v1", &RequestKey::get("https://example.com/posts/my_post"), &make_response("b"))
            .await
            .unwrap();
        db.put("dynamic-v1", &RequestKey::get("https://example.com/search?q=100%25"), &make_response("c"))
            .await
            .unwrap();

        assert_eq!(db.purge_entries_matching("dynamic-v1", "my_post").await.unwrap(), 1);
        assert_eq!(db.purge_entries_matching("dynamic-v1", "%").await.unwrap(), 1);

        let remaining = db.entries("dynamic-v1").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].url, "https://example.com/posts/my-post");
    }

    #[test]
    fn test_is_ok() {
        assert!(make_response("").is_ok());
        assert!(!ResponseSnapshot { status: 404, ..make_response("") }.is_ok());
        assert!(!ResponseSnapshot { status: 304, ..make_response("") }.is_ok());
    }
}
