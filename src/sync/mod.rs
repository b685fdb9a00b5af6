/// Live view plumbing shared by the social graph and messaging managers
///
/// A `LiveView<T>` is a reactive full-snapshot view over one or two live
/// store queries. Every emission replaces the previous rows wholesale, so
/// consumers that miss intermediate snapshots still end up consistent.
/// Views hold their background tasks and store subscriptions; dropping a
/// view tears everything down.
use crate::error::{SyncError, SyncResult};
use crate::store::{Document, DocumentStore, Query, Subscription};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

/// Reactive snapshot view
///
/// `current()` returns the latest rows (empty until the first snapshot
/// arrives); `changed()` waits for the next emission.
pub struct LiveView<T> {
    receiver: watch::Receiver<Vec<T>>,
    tasks: Vec<JoinHandle<()>>,
}

impl<T: Clone> LiveView<T> {
    /// Latest rows
    pub fn current(&self) -> Vec<T> {
        self.receiver.borrow().clone()
    }

    /// Wait until the rows change
    pub async fn changed(&mut self) -> SyncResult<()> {
        self.receiver
            .changed()
            .await
            .map_err(|_| SyncError::SubscriptionClosed)
    }

    /// Tear down the view and its subscriptions
    pub fn close(self) {
        // Drop does the work
    }
}

impl<T: Clone + Send + Sync + 'static> LiveView<T> {
    /// View over a single live query; each snapshot is transformed into
    /// the view rows.
    pub(crate) fn from_subscription<F>(mut sub: Subscription, mut project: F) -> Self
    where
        F: FnMut(Vec<Document>) -> Vec<T> + Send + 'static,
    {
        let (tx, rx) = watch::channel(Vec::new());
        let task = tokio::spawn(async move {
            while let Some(docs) = sub.next_snapshot().await {
                if tx.send(project(docs)).is_err() {
                    break;
                }
            }
        });

        Self {
            receiver: rx,
            tasks: vec![task],
        }
    }

    /// View over two live queries used as change signals
    ///
    /// Whenever either subscription delivers, both one-shot queries are
    /// re-run in full and the view is rebuilt from the combined results.
    /// Deliberately non-incremental.
    pub(crate) fn from_dual_refetch<F>(
        store: Arc<dyn DocumentStore>,
        first: Query,
        second: Query,
        mut rebuild: F,
    ) -> Self
    where
        F: FnMut(Vec<Document>, Vec<Document>) -> Vec<T> + Send + 'static,
    {
        let (tx, rx) = watch::channel(Vec::new());
        let mut sub_first = store.subscribe(first.clone());
        let mut sub_second = store.subscribe(second.clone());

        let task = tokio::spawn(async move {
            loop {
                let signal = tokio::select! {
                    snapshot = sub_first.next_snapshot() => snapshot,
                    snapshot = sub_second.next_snapshot() => snapshot,
                };
                if signal.is_none() {
                    break;
                }

                let first_docs = match store.query(&first).await {
                    Ok(docs) => docs,
                    Err(e) => {
                        warn!("Refetch failed for {}: {}", first.collection, e);
                        continue;
                    }
                };
                let second_docs = match store.query(&second).await {
                    Ok(docs) => docs,
                    Err(e) => {
                        warn!("Refetch failed for {}: {}", second.collection, e);
                        continue;
                    }
                };

                if tx.send(rebuild(first_docs, second_docs)).is_err() {
                    break;
                }
            }
        });

        Self {
            receiver: rx,
            tasks: vec![task],
        }
    }
}

impl<T> Drop for LiveView<T> {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Drop duplicate documents by id, keeping the first occurrence
pub fn dedup_by_id(docs: Vec<Document>) -> Vec<Document> {
    let mut seen = HashSet::new();
    docs.into_iter()
        .filter(|doc| seen.insert(doc.id.clone()))
        .collect()
}

/// Decode a snapshot into typed entities, dropping documents that fail
/// to decode rather than poisoning the whole view
pub fn decode_all<T: DeserializeOwned>(docs: &[Document]) -> Vec<T> {
    let mut entities = Vec::with_capacity(docs.len());
    for doc in docs {
        match doc.decode::<T>() {
            Ok(entity) => entities.push(entity),
            Err(e) => warn!("Dropping undecodable document {}: {}", doc.id, e),
        }
    }
    entities
}

/// Stable ascending sort by timestamp; entries without a timestamp sort
/// as the Unix epoch
pub fn sort_by_timestamp<T, F>(items: &mut [T], timestamp_of: F)
where
    F: Fn(&T) -> Option<DateTime<Utc>>,
{
    items.sort_by_key(|item| timestamp_of(item).unwrap_or(DateTime::<Utc>::UNIX_EPOCH));
}
