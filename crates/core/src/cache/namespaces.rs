//! Namespace management: open, enumerate, delete.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// A namespace together with the number of entries it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NamespaceSummary {
    pub name: String,
    pub created_at: String,
    pub entry_count: u64,
}

impl CacheDb {
    /// Create the namespace if it does not exist yet.
    ///
    /// Opening an existing namespace leaves its entries and creation order untouched.
    pub async fn open_namespace(&self, name: &str) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::InvalidInput("namespace name cannot be empty".into()));
        }
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO namespaces (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Whether a namespace with this name exists.
    pub async fn has_namespace(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM namespaces WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// All namespace names in creation order.
    pub async fn namespace_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM namespaces ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Namespaces with their entry counts, in creation order.
    pub async fn namespace_summaries(&self) -> Result<Vec<NamespaceSummary>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<NamespaceSummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT n.name, n.created_at, COUNT(e.key_hash)
                     FROM namespaces n
                     LEFT JOIN entries e ON e.namespace = n.name
                     GROUP BY n.name
                     ORDER BY n.rowid ASC",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok(NamespaceSummary {
                            name: row.get(0)?,
                            created_at: row.get(1)?,
                            entry_count: row.get::<_, i64>(2)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a namespace and every entry in it.
    ///
    /// Returns false if no namespace had that name.
    pub async fn delete_namespace(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM namespaces WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}
