use crate::error::Result;
use pyscout_scanner::{CacheStore, Page};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

pub const CACHE_FILE_NAME: &str = "http_cache.sqlite";

/// HTTP responses keyed by method and URL, kept in sqlite until cleared.
pub struct ResponseCache {
    conn: Mutex<Connection>,
}

impl ResponseCache {
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        let cache = ResponseCache {
            conn: Mutex::new(conn),
        };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> Result<()> {
        self.connection().execute_batch(
            "
            CREATE TABLE IF NOT EXISTS responses (
                method TEXT NOT NULL,
                url TEXT NOT NULL,
                status_code INTEGER NOT NULL,
                headers TEXT NOT NULL,     -- JSON object
                body BLOB NOT NULL,
                fetched_at INTEGER NOT NULL,
                PRIMARY KEY (method, url)
            );
            ",
        )?;
        Ok(())
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, method: &str, url: &str) -> Result<Option<Page>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            "SELECT url, status_code, headers, body FROM responses WHERE method = ?1 AND url = ?2",
        )?;

        let page = stmt
            .query_row(params![method, url], |row| {
                let headers_json: String = row.get(2)?;
                let headers: BTreeMap<String, String> = serde_json::from_str(&headers_json)
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e))
                    })?;

                Ok(Page {
                    url: row.get(0)?,
                    status_code: row.get(1)?,
                    headers,
                    body: row.get(3)?,
                })
            })
            .optional()?;
        Ok(page)
    }

    pub fn put(&self, method: &str, url: &str, page: &Page) -> Result<()> {
        let headers_json = serde_json::to_string(&page.headers)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        self.connection().execute(
            "INSERT OR REPLACE INTO responses (method, url, status_code, headers, body, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                method,
                url,
                page.status_code,
                headers_json,
                page.body,
                chrono::Utc::now().timestamp()
            ],
        )?;
        Ok(())
    }

    /// Remove every stored response, returning how many were dropped.
    pub fn clear(&self) -> Result<usize> {
        let removed = self.connection().execute("DELETE FROM responses", [])?;
        debug!(removed, "Cleared response cache");
        Ok(removed)
    }

    pub fn len(&self) -> Result<usize> {
        let count = self
            .connection()
            .query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl CacheStore for ResponseCache {
    fn lookup(&self, method: &str, url: &str) -> Option<Page> {
        match self.get(method, url) {
            Ok(page) => page,
            Err(e) => {
                warn!(%url, error = %e, "Cache lookup failed");
                None
            }
        }
    }

    fn store(&self, method: &str, url: &str, page: &Page) {
        if let Err(e) = self.put(method, url, page) {
            warn!(%url, error = %e, "Failed to cache response");
        }
    }
}
