//! SQLite-backed document store.
//!
//! Documents are JSON blobs grouped into named tables inside a single
//! `documents` relation; record order within a table is insertion order.
//! The store is the process-wide single writer: all mutating operations
//! serialize behind one lock, so `replace_all` and `update_where_uid`
//! never interleave.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::StoreError;

// Path relative to crates/shopwatch-store/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Clone)]
pub struct DocStore {
    pool: SqlitePool,
    writer: Arc<Mutex<()>>,
}

impl DocStore {
    /// Opens (and creates, if missing) a document store at the given path
    /// and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the database cannot be opened and
    /// [`StoreError::Migration`] if a migration fails.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    /// Opens an in-memory store, used by tests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] or [`StoreError::Migration`] on setup
    /// failure.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // One connection only: each in-memory connection is its own database,
        // and an idle reap would drop the data.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        MIGRATOR.run(&pool).await?;
        Ok(Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        })
    }

    /// Returns all documents of a table in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] on query failure and
    /// [`StoreError::Malformed`] if a stored document is not valid JSON.
    pub async fn load_all(&self, table: &str) -> Result<Vec<Value>, StoreError> {
        let rows =
            sqlx::query_scalar::<_, String>("SELECT doc FROM documents WHERE tbl = ?1 ORDER BY id")
                .bind(table)
                .fetch_all(&self.pool)
                .await?;

        rows.iter()
            .map(|raw| {
                serde_json::from_str(raw).map_err(|e| StoreError::Malformed {
                    table: table.to_owned(),
                    source: e,
                })
            })
            .collect()
    }

    /// Replaces the entire table content (truncate-then-insert) in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] on query failure.
    pub async fn replace_all(&self, table: &str, docs: &[Value]) -> Result<(), StoreError> {
        let _write = self.writer.lock().await;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM documents WHERE tbl = ?1")
            .bind(table)
            .execute(&mut *tx)
            .await?;
        for doc in docs {
            sqlx::query("INSERT INTO documents (tbl, doc) VALUES (?1, ?2)")
                .bind(table)
                .bind(doc.to_string())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::debug!(table, count = docs.len(), "table content replaced");
        Ok(())
    }

    /// Appends one document to a table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] on query failure.
    pub async fn insert(&self, table: &str, doc: &Value) -> Result<(), StoreError> {
        let _write = self.writer.lock().await;

        sqlx::query("INSERT INTO documents (tbl, doc) VALUES (?1, ?2)")
            .bind(table)
            .bind(doc.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replaces the single document whose `uid` field matches.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record carries the uid and
    /// [`StoreError::AmbiguousUid`] when more than one does; the table is
    /// left untouched in both cases.
    pub async fn update_where_uid(
        &self,
        table: &str,
        uid: &str,
        doc: &Value,
    ) -> Result<(), StoreError> {
        let _write = self.writer.lock().await;

        let mut tx = self.pool.begin().await?;
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM documents WHERE tbl = ?1 AND json_extract(doc, '$.uid') = ?2",
        )
        .bind(table)
        .bind(uid)
        .fetch_one(&mut *tx)
        .await?;

        if count == 0 {
            return Err(StoreError::NotFound {
                table: table.to_owned(),
                uid: uid.to_owned(),
            });
        }
        if count > 1 {
            return Err(StoreError::AmbiguousUid {
                table: table.to_owned(),
                uid: uid.to_owned(),
                count,
            });
        }

        sqlx::query(
            "UPDATE documents SET doc = ?3 WHERE tbl = ?1 AND json_extract(doc, '$.uid') = ?2",
        )
        .bind(table)
        .bind(uid)
        .bind(doc.to_string())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Returns all documents of a table whose top-level `field` equals the
    /// given string value, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] on query failure and
    /// [`StoreError::Malformed`] if a stored document is not valid JSON.
    pub async fn find_where_eq(
        &self,
        table: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Value>, StoreError> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT doc FROM documents \
             WHERE tbl = ?1 AND json_extract(doc, '$.' || ?2) = ?3 \
             ORDER BY id",
        )
        .bind(table)
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|raw| {
                serde_json::from_str(raw).map_err(|e| StoreError::Malformed {
                    table: table.to_owned(),
                    source: e,
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "docstore_test.rs"]
mod tests;
