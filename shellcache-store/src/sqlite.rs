//! SQLite-backed store provider.
//!
//! Stores survive restarts of the worker process. The connection lives
//! behind a mutex and every call runs on the blocking pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use shellcache_core::{Method, RequestKey, Response, ResponseType};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::provider::{StoreProvider, StoredEntry};

/// Schema for store tables.
const STORE_SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS stores (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS entries (
    store_id INTEGER NOT NULL,
    method TEXT NOT NULL,
    url TEXT NOT NULL,
    variant TEXT NOT NULL DEFAULT '',
    status INTEGER NOT NULL,
    status_text TEXT NOT NULL,
    headers TEXT NOT NULL,
    body BLOB NOT NULL,
    kind TEXT NOT NULL,
    stored_at TEXT NOT NULL,
    PRIMARY KEY (store_id, method, url, variant)
);
";

/// Store provider backed by a SQLite database file.
pub struct SqliteStoreProvider {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStoreProvider {
    /// Opens (or creates) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the parent directory cannot be created or the
    /// database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        info!(path = %path.display(), "Opening store database");
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns error if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(STORE_SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::TaskFailed(e.to_string()))?
    }
}

fn store_id(conn: &Connection, name: &str) -> Result<Option<i64>, StoreError> {
    Ok(conn
        .query_row("SELECT id FROM stores WHERE name = ?1", params![name], |row| {
            row.get(0)
        })
        .optional()?)
}

fn ensure_store(conn: &Connection, name: &str) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT OR IGNORE INTO stores (name) VALUES (?1)",
        params![name],
    )?;
    store_id(conn, name)?.ok_or_else(|| StoreError::NotFound(name.to_string()))
}

fn insert_entry(
    conn: &Connection,
    store_id: i64,
    key: &RequestKey,
    entry: &StoredEntry,
    headers: &str,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO entries
         (store_id, method, url, variant, status, status_text, headers, body, kind, stored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            store_id,
            key.method.as_str(),
            key.url,
            key.variant.as_deref().unwrap_or(""),
            entry.response.status,
            entry.response.status_text,
            headers,
            entry.response.body,
            encode_kind(entry.response.kind),
            entry.stored_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn encode_kind(kind: ResponseType) -> &'static str {
    match kind {
        ResponseType::Basic => "basic",
        ResponseType::Cors => "cors",
        ResponseType::Opaque => "opaque",
    }
}

fn decode_kind(kind: &str) -> Result<ResponseType, StoreError> {
    match kind {
        "basic" => Ok(ResponseType::Basic),
        "cors" => Ok(ResponseType::Cors),
        "opaque" => Ok(ResponseType::Opaque),
        other => Err(StoreError::Corrupt(format!("unknown response type '{other}'"))),
    }
}

/// Raw entry row, decoded outside the rusqlite row callback.
struct EntryRow {
    status: u16,
    status_text: String,
    headers: String,
    body: Vec<u8>,
    kind: String,
    stored_at: String,
}

impl EntryRow {
    fn decode(self) -> Result<StoredEntry, StoreError> {
        let headers: BTreeMap<String, String> = serde_json::from_str(&self.headers)?;
        let stored_at = DateTime::parse_from_rfc3339(&self.stored_at)
            .map_err(|e| StoreError::Corrupt(format!("bad timestamp: {e}")))?
            .with_timezone(&Utc);
        Ok(StoredEntry {
            response: Response {
                status: self.status,
                status_text: self.status_text,
                headers,
                body: self.body,
                kind: decode_kind(&self.kind)?,
            },
            stored_at,
        })
    }
}

#[async_trait]
impl StoreProvider for SqliteStoreProvider {
    async fn open(&self, name: &str) -> Result<(), StoreError> {
        let name = name.to_string();
        self.with_conn(move |conn| ensure_store(conn, &name).map(|_| ()))
            .await
    }

    async fn has(&self, name: &str) -> Result<bool, StoreError> {
        let name = name.to_string();
        self.with_conn(move |conn| Ok(store_id(conn, &name)?.is_some()))
            .await
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let Some(id) = store_id(&tx, &name)? else {
                return Ok(false);
            };
            let removed = tx.execute("DELETE FROM entries WHERE store_id = ?1", params![id])?;
            tx.execute("DELETE FROM stores WHERE id = ?1", params![id])?;
            tx.commit()?;
            debug!(store = %name, entries = removed, "Deleted store");
            Ok(true)
        })
        .await
    }

    async fn names(&self) -> Result<Vec<String>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY id")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(names)
        })
        .await
    }

    async fn get(&self, name: &str, key: &RequestKey) -> Result<Option<StoredEntry>, StoreError> {
        let name = name.to_string();
        let key = key.clone();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT e.status, e.status_text, e.headers, e.body, e.kind, e.stored_at
                     FROM entries e JOIN stores s ON s.id = e.store_id
                     WHERE s.name = ?1 AND e.method = ?2 AND e.url = ?3 AND e.variant = ?4",
                    params![
                        name,
                        key.method.as_str(),
                        key.url,
                        key.variant.as_deref().unwrap_or("")
                    ],
                    |row| {
                        Ok(EntryRow {
                            status: row.get(0)?,
                            status_text: row.get(1)?,
                            headers: row.get(2)?,
                            body: row.get(3)?,
                            kind: row.get(4)?,
                            stored_at: row.get(5)?,
                        })
                    },
                )
                .optional()?;
            row.map(EntryRow::decode).transpose()
        })
        .await
    }

    async fn put(&self, name: &str, key: &RequestKey, entry: StoredEntry) -> Result<(), StoreError> {
        let name = name.to_string();
        let key = key.clone();
        let headers = serde_json::to_string(&entry.response.headers)?;
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let id = ensure_store(&tx, &name)?;
            insert_entry(&tx, id, &key, &entry, &headers)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn put_existing(
        &self,
        name: &str,
        key: &RequestKey,
        entry: StoredEntry,
    ) -> Result<bool, StoreError> {
        let name = name.to_string();
        let key = key.clone();
        let headers = serde_json::to_string(&entry.response.headers)?;
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let Some(id) = store_id(&tx, &name)? else {
                debug!(store = %name, "Store is gone, skipping write");
                return Ok(false);
            };
            insert_entry(&tx, id, &key, &entry, &headers)?;
            tx.commit()?;
            Ok(true)
        })
        .await
    }

    async fn keys(&self, name: &str) -> Result<Vec<RequestKey>, StoreError> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT e.method, e.url, e.variant
                 FROM entries e JOIN stores s ON s.id = e.store_id
                 WHERE s.name = ?1 ORDER BY e.url",
            )?;
            let rows = stmt
                .query_map(params![name], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|(method, url, variant)| -> Result<RequestKey, StoreError> {
                    Ok(RequestKey {
                        method: method.parse::<Method>()?,
                        url,
                        variant: (!variant.is_empty()).then_some(variant),
                    })
                })
                .collect()
        })
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================
