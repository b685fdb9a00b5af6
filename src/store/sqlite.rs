/// SQLite document store backend
///
/// Persists documents in a single table keyed by (collection, id) with
/// the field map stored as JSON text. Equality filters are applied in
/// process after the per-collection fetch; collections here are small
/// per-user working sets, not analytical tables.
///
/// Change signals share the in-process notifier with the memory backend,
/// so live queries behave identically. Cross-process change visibility
/// is out of scope.
use crate::error::{SyncError, SyncResult};
use crate::store::{
    spawn_snapshot_producer, ChangeNotifier, Document, DocumentRef, DocumentStore, Query,
    Subscription, DEFAULT_SUBSCRIPTION_BUFFER,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;

/// Connection options for the SQLite backend
#[derive(Debug, Clone)]
pub struct SqliteStoreOptions {
    pub max_connections: u32,
    pub enable_wal: bool,
    pub subscription_buffer: usize,
}

impl Default for SqliteStoreOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            enable_wal: true,
            subscription_buffer: DEFAULT_SUBSCRIPTION_BUFFER,
        }
    }
}

pub struct SqliteStore {
    pool: SqlitePool,
    notifier: ChangeNotifier,
    buffer_size: usize,
}

impl SqliteStore {
    /// Open (creating if missing) a document database at the given path
    pub async fn open(path: &Path, options: SqliteStoreOptions) -> SyncResult<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let connect_options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(if options.enable_wal {
                SqliteJournalMode::Wal
            } else {
                SqliteJournalMode::Delete
            })
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .connect_with(connect_options)
            .await?;

        Self::from_pool(pool, options.subscription_buffer).await
    }

    /// Build a store over an existing pool (tests use an in-memory pool)
    pub async fn from_pool(pool: SqlitePool, subscription_buffer: usize) -> SyncResult<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                fields TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            pool,
            notifier: ChangeNotifier::new(),
            buffer_size: subscription_buffer,
        })
    }

    async fn run_query(pool: &SqlitePool, query: &Query) -> SyncResult<Vec<Document>> {
        let rows = sqlx::query("SELECT id, fields FROM documents WHERE collection = ?1 ORDER BY id")
            .bind(&query.collection)
            .fetch_all(pool)
            .await?;

        let mut results = Vec::new();
        for row in rows {
            let id: String = row.get("id");
            let raw: String = row.get("fields");
            let fields: Map<String, Value> = serde_json::from_str(&raw)?;
            if query.matches(&fields) {
                results.push(Document { id, fields });
            }
        }
        Ok(results)
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn create(&self, collection: &str, fields: Map<String, Value>) -> SyncResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let raw = serde_json::to_string(&fields)?;

        sqlx::query("INSERT INTO documents (collection, id, fields) VALUES (?1, ?2, ?3)")
            .bind(collection)
            .bind(&id)
            .bind(&raw)
            .execute(&self.pool)
            .await?;

        self.notifier.publish(collection);
        crate::metrics::record_document_write("create", collection);
        Ok(id)
    }

    async fn update(&self, doc: &DocumentRef, fields: Map<String, Value>) -> SyncResult<()> {
        // The read and the write share one transaction; a concurrent
        // update cannot slip between them and drop merged fields. The
        // memory backend gets the same guarantee from its write lock.
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT fields FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(&doc.collection)
            .bind(&doc.id)
            .fetch_optional(&mut *tx)
            .await?;

        let raw: String = match row {
            Some(row) => row.get("fields"),
            None => {
                return Err(SyncError::NotFound(format!(
                    "{}/{}",
                    doc.collection, doc.id
                )))
            }
        };

        let mut existing: Map<String, Value> = serde_json::from_str(&raw)?;
        for (key, value) in fields {
            existing.insert(key, value);
        }
        let merged = serde_json::to_string(&existing)?;

        sqlx::query("UPDATE documents SET fields = ?3 WHERE collection = ?1 AND id = ?2")
            .bind(&doc.collection)
            .bind(&doc.id)
            .bind(&merged)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.notifier.publish(&doc.collection);
        crate::metrics::record_document_write("update", &doc.collection);
        Ok(())
    }

    async fn delete(&self, doc: &DocumentRef) -> SyncResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(&doc.collection)
            .bind(&doc.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            self.notifier.publish(&doc.collection);
            crate::metrics::record_document_write("delete", &doc.collection);
        }
        Ok(())
    }

    async fn get(&self, doc: &DocumentRef) -> SyncResult<Option<Document>> {
        let row = sqlx::query("SELECT fields FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(&doc.collection)
            .bind(&doc.id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.get("fields");
                let fields: Map<String, Value> = serde_json::from_str(&raw)?;
                Ok(Some(Document {
                    id: doc.id.clone(),
                    fields,
                }))
            }
            None => Ok(None),
        }
    }

    async fn query(&self, query: &Query) -> SyncResult<Vec<Document>> {
        Self::run_query(&self.pool, query).await
    }

    fn subscribe(&self, query: Query) -> Subscription {
        let pool = self.pool.clone();
        spawn_snapshot_producer(query, &self.notifier, self.buffer_size, move |q| {
            let pool = pool.clone();
            async move { Self::run_query(&pool, &q).await }
        })
    }
}
