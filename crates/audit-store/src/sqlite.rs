//! SQLite-backed document store (persistence).

use crate::into_page;
use audit_types::{AuditDocument, ContinuationToken, DocumentPage, DocumentQuery, DocumentStore, StoreError};
use async_trait::async_trait;
use rusqlite::{params, ErrorCode};
use std::path::Path;

/// SQLite-backed document store. The table is created by `ensure_collection`;
/// until then writes and reads report `NotFound`.
pub struct SqliteDocumentStore {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteDocumentStore {
    /// Open (or create) the database file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn =
            rusqlite::Connection::open(path).map_err(|e| StoreError::Other(e.to_string()))?;
        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    /// Open and provision in one step.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let store = Self::new(path)?;
        store.with_conn(create_schema)?;
        Ok(store)
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, rusqlite::Error>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Other(format!("failed to acquire lock: {}", e)))?;
        f(&conn).map_err(map_sqlite_error)
    }
}

fn create_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS audit_documents (
            partition_key TEXT NOT NULL,
            id TEXT NOT NULL,
            timestamp_key TEXT NOT NULL,
            event_type_lc TEXT NOT NULL,
            user_name_lc TEXT NOT NULL,
            body TEXT NOT NULL,
            PRIMARY KEY (partition_key, id)
        );

        CREATE INDEX IF NOT EXISTS idx_audit_partition_ts
            ON audit_documents(partition_key, timestamp_key DESC, id DESC);
        "#,
    )
}

fn map_sqlite_error(e: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(ref failure, _) = e {
        if failure.code == ErrorCode::ConstraintViolation {
            return StoreError::Conflict(e.to_string());
        }
    }
    let message = e.to_string();
    if message.contains("no such table") {
        StoreError::NotFound(message)
    } else {
        StoreError::Other(message)
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn create_document(&self, document: &AuditDocument) -> Result<(), StoreError> {
        let body = serde_json::to_string(document).map_err(|e| StoreError::Other(e.to_string()))?;
        let timestamp_key = document.timestamp_key();
        // Search columns are folded here; SQLite's lower() only handles ASCII.
        let folded = |field: &Option<String>| field.as_deref().unwrap_or_default().to_lowercase();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO audit_documents (partition_key, id, timestamp_key, event_type_lc, user_name_lc, body)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    document.partition_key,
                    document.id,
                    timestamp_key,
                    folded(&document.event_type),
                    folded(&document.user_name),
                    body,
                ],
            )
        })?;
        Ok(())
    }

    async fn ensure_collection(&self) -> Result<(), StoreError> {
        tracing::info!("ensuring sqlite audit_documents table");
        self.with_conn(create_schema)
    }

    async fn query(
        &self,
        query: &DocumentQuery,
        page_size: usize,
        continuation: Option<&str>,
    ) -> Result<DocumentPage, StoreError> {
        if page_size == 0 {
            return Err(StoreError::Other("page size must be greater than zero".to_string()));
        }
        let after = ContinuationToken::parse(continuation)?;
        let term = query.search_term.as_deref().map(str::to_lowercase);
        let (after_ts, after_id) = match after {
            Some(t) => (Some(t.timestamp_key), Some(t.id)),
            None => (None, None),
        };
        let limit = i64::try_from(page_size.saturating_add(1)).unwrap_or(i64::MAX);

        let bodies = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT body FROM audit_documents
                 WHERE partition_key = ?1
                   AND (?2 IS NULL
                        OR instr(user_name_lc, ?2) > 0
                        OR instr(event_type_lc, ?2) > 0)
                   AND (?3 IS NULL OR timestamp_key < ?3 OR (timestamp_key = ?3 AND id < ?4))
                 ORDER BY timestamp_key DESC, id DESC
                 LIMIT ?5",
            )?;
            let rows = stmt.query_map(
                params![query.partition_key, term, after_ts, after_id, limit],
                |row| row.get::<_, String>(0),
            )?;
            rows.collect::<Result<Vec<_>, _>>()
        })?;

        let documents = bodies
            .iter()
            .map(|b| serde_json::from_str::<AuditDocument>(b))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Other(e.to_string()))?;
        Ok(into_page(documents, page_size))
    }
}
