/// Document store abstraction
///
/// All application state flows through this module: collections of
/// schemaless documents with equality-filter queries, partial updates,
/// and live subscriptions that re-deliver the full matching set on every
/// change. Storage backends plug in behind the `DocumentStore` trait.
///
/// # Subscription model
///
/// - Buffered channel per subscription prevents overwhelming slow consumers
/// - Every emission is a complete snapshot, so a lagged subscriber that
///   re-queries loses nothing
/// - Producer tasks stop when the handle is dropped or unsubscribed

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, SqliteStoreOptions};

use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Subscription plumbing constants
const CHANGE_CHANNEL_CAPACITY: usize = 256; // Collection change signals buffered per notifier
pub(crate) const DEFAULT_SUBSCRIPTION_BUFFER: usize = 100; // Snapshots buffered per subscription

/// A document: store-assigned id plus a flat map of named fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Decode the document into a typed entity
    ///
    /// The store-assigned id is injected into the field map first so
    /// entity structs can carry an `id` field.
    pub fn decode<T: DeserializeOwned>(&self) -> SyncResult<T> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    /// Encode a typed entity into a field map for persistence
    ///
    /// Any `id` field is stripped; the store owns document ids.
    pub fn encode<T: Serialize>(entity: &T) -> SyncResult<Map<String, Value>> {
        match serde_json::to_value(entity)? {
            Value::Object(mut fields) => {
                fields.remove("id");
                Ok(fields)
            }
            _ => Err(SyncError::Store(
                "Entity must encode to a JSON object".to_string(),
            )),
        }
    }
}

/// Reference to a single document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub collection: String,
    pub id: String,
}

impl DocumentRef {
    pub fn new(collection: &str, id: &str) -> Self {
        Self {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// An equality-filter query over one collection
///
/// No range filters, no joins, no ordering. Result order is whatever the
/// backend yields; callers that need an order sort explicitly.
#[derive(Debug, Clone)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<(String, Value)>,
}

impl Query {
    pub fn collection(name: &str) -> Self {
        Self {
            collection: name.to_string(),
            filters: Vec::new(),
        }
    }

    /// Add an equality filter on a field
    pub fn filter(mut self, field: &str, value: Value) -> Self {
        self.filters.push((field.to_string(), value));
        self
    }

    /// Check whether a field map satisfies every filter
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| fields.get(field) == Some(expected))
    }
}

/// Fan-out of collection-level change signals
///
/// Backends publish the collection name after every successful write.
/// Subscription producers re-run their query on each signal for their
/// collection; a lagged receiver simply re-queries, since snapshots are
/// always computed from current store state.
#[derive(Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<String>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Signal that a collection changed. No-op when nothing is listening.
    pub fn publish(&self, collection: &str) {
        let _ = self.sender.send(collection.to_string());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a live query
///
/// Delivers the current full matching set on every relevant change,
/// starting with an initial snapshot. Dropping the handle (or calling
/// `unsubscribe`) stops the producer task.
pub struct Subscription {
    receiver: mpsc::Receiver<Vec<Document>>,
    producer: JoinHandle<()>,
}

impl Subscription {
    /// Wait for the next snapshot. Returns `None` once the producer
    /// has stopped.
    pub async fn next_snapshot(&mut self) -> Option<Vec<Document>> {
        self.receiver.recv().await
    }

    /// Stop receiving snapshots and tear down the producer
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.producer.abort();
        crate::metrics::SUBSCRIPTIONS_ACTIVE.dec();
    }
}

/// Storage backend trait
///
/// Writes are independent: there are no transactions spanning calls, and
/// a failure leaves every other document untouched.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return its assigned id
    async fn create(&self, collection: &str, fields: Map<String, Value>) -> SyncResult<String>;

    /// Shallow-merge partial fields into an existing document
    async fn update(&self, doc: &DocumentRef, fields: Map<String, Value>) -> SyncResult<()>;

    /// Delete a document. Deleting an absent document succeeds.
    async fn delete(&self, doc: &DocumentRef) -> SyncResult<()>;

    /// Fetch a single document
    async fn get(&self, doc: &DocumentRef) -> SyncResult<Option<Document>>;

    /// Run a one-shot query against current state
    async fn query(&self, query: &Query) -> SyncResult<Vec<Document>>;

    /// Open a live query
    fn subscribe(&self, query: Query) -> Subscription;
}

/// Spawn the producer task behind a `Subscription`
///
/// Emits an initial snapshot, then re-runs the query and emits a fresh
/// snapshot every time the notifier signals the subscribed collection.
/// Failed re-queries are logged and skipped; the next signal tries again.
pub(crate) fn spawn_snapshot_producer<F, Fut>(
    query: Query,
    notifier: &ChangeNotifier,
    buffer_size: usize,
    run_query: F,
) -> Subscription
where
    F: Fn(Query) -> Fut + Send + 'static,
    Fut: Future<Output = SyncResult<Vec<Document>>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(buffer_size);
    let mut changes = notifier.subscribe();
    crate::metrics::SUBSCRIPTIONS_ACTIVE.inc();

    let producer = tokio::spawn(async move {
        match run_query(query.clone()).await {
            Ok(docs) => {
                crate::metrics::record_snapshot_delivered(&query.collection);
                if tx.send(docs).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!("Initial snapshot failed for {}: {}", query.collection, e);
                crate::metrics::record_live_query_failure(&query.collection);
            }
        }

        loop {
            match changes.recv().await {
                Ok(collection) => {
                    if collection != query.collection {
                        continue;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(
                        "Subscription on {} lagged {} signals, re-querying",
                        query.collection, skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }

            match run_query(query.clone()).await {
                Ok(docs) => {
                    crate::metrics::record_snapshot_delivered(&query.collection);
                    if tx.send(docs).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Live query failed for {}: {}", query.collection, e);
                    crate::metrics::record_live_query_failure(&query.collection);
                }
            }
        }
    });

    Subscription {
        receiver: rx,
        producer,
    }
}
