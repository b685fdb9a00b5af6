/// In-memory document store backend
///
/// The default backend. Collections live in a process-local map; query
/// order is deterministic (document id order). Change signals fan out
/// through the shared notifier just like the persistent backend, so the
/// subscription behavior is identical.
use crate::error::{SyncError, SyncResult};
use crate::store::{
    spawn_snapshot_producer, ChangeNotifier, Document, DocumentRef, DocumentStore, Query,
    Subscription, DEFAULT_SUBSCRIPTION_BUFFER,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

type Collections = HashMap<String, BTreeMap<String, Map<String, Value>>>;

pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
    notifier: ChangeNotifier,
    buffer_size: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_SUBSCRIPTION_BUFFER)
    }

    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            notifier: ChangeNotifier::new(),
            buffer_size,
        }
    }

    async fn run_query(collections: &RwLock<Collections>, query: &Query) -> Vec<Document> {
        let guard = collections.read().await;
        match guard.get(&query.collection) {
            Some(docs) => docs
                .iter()
                .filter(|(_, fields)| query.matches(fields))
                .map(|(id, fields)| Document {
                    id: id.clone(),
                    fields: fields.clone(),
                })
                .collect(),
            None => Vec::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, fields: Map<String, Value>) -> SyncResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        {
            let mut guard = self.collections.write().await;
            guard
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), fields);
        }
        self.notifier.publish(collection);
        crate::metrics::record_document_write("create", collection);
        Ok(id)
    }

    async fn update(&self, doc: &DocumentRef, fields: Map<String, Value>) -> SyncResult<()> {
        {
            let mut guard = self.collections.write().await;
            let existing = guard
                .get_mut(&doc.collection)
                .and_then(|docs| docs.get_mut(&doc.id))
                .ok_or_else(|| {
                    SyncError::NotFound(format!("{}/{}", doc.collection, doc.id))
                })?;
            for (key, value) in fields {
                existing.insert(key, value);
            }
        }
        self.notifier.publish(&doc.collection);
        crate::metrics::record_document_write("update", &doc.collection);
        Ok(())
    }

    async fn delete(&self, doc: &DocumentRef) -> SyncResult<()> {
        let removed = {
            let mut guard = self.collections.write().await;
            guard
                .get_mut(&doc.collection)
                .and_then(|docs| docs.remove(&doc.id))
                .is_some()
        };
        if removed {
            self.notifier.publish(&doc.collection);
            crate::metrics::record_document_write("delete", &doc.collection);
        }
        Ok(())
    }

    async fn get(&self, doc: &DocumentRef) -> SyncResult<Option<Document>> {
        let guard = self.collections.read().await;
        Ok(guard
            .get(&doc.collection)
            .and_then(|docs| docs.get(&doc.id))
            .map(|fields| Document {
                id: doc.id.clone(),
                fields: fields.clone(),
            }))
    }

    async fn query(&self, query: &Query) -> SyncResult<Vec<Document>> {
        Ok(Self::run_query(&self.collections, query).await)
    }

    fn subscribe(&self, query: Query) -> Subscription {
        let collections = Arc::clone(&self.collections);
        spawn_snapshot_producer(query, &self.notifier, self.buffer_size, move |q| {
            let collections = Arc::clone(&collections);
            async move { Ok(Self::run_query(&collections, &q).await) }
        })
    }
}
