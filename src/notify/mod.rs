/// In-app notifications
///
/// Social and chat actions raise notifications for the affected user.
/// Delivery is best-effort through `try_notify`: a failed write warns
/// and moves on, it never fails the action that triggered it.
use crate::error::SyncResult;
use crate::store::{Document, DocumentStore, Query};
use crate::sync::{decode_all, sort_by_timestamp, LiveView};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

pub const NOTIFICATIONS_COLLECTION: &str = "notifications";

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    FriendRequest,
    FriendAccepted,
    Follow,
    Message,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::FriendRequest => "friend_request",
            NotificationKind::FriendAccepted => "friend_accepted",
            NotificationKind::Follow => "follow",
            NotificationKind::Message => "message",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default)]
    pub id: String,
    pub receiver_id: String,
    pub sender_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub read: bool,
}

pub struct NotificationManager {
    store: Arc<dyn DocumentStore>,
}

impl NotificationManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a notification
    pub async fn notify(
        &self,
        receiver_id: &str,
        sender_id: &str,
        kind: NotificationKind,
        message: &str,
    ) -> SyncResult<String> {
        let notification = Notification {
            id: String::new(),
            receiver_id: receiver_id.to_string(),
            sender_id: sender_id.to_string(),
            kind,
            message: message.to_string(),
            timestamp: Some(Utc::now()),
            read: false,
        };

        let fields = Document::encode(&notification)?;
        let id = self.store.create(NOTIFICATIONS_COLLECTION, fields).await?;
        crate::metrics::record_notification(kind.as_str());
        Ok(id)
    }

    /// Best-effort notify: log and swallow failures
    pub async fn try_notify(
        &self,
        receiver_id: &str,
        sender_id: &str,
        kind: NotificationKind,
        message: &str,
    ) {
        if let Err(e) = self.notify(receiver_id, sender_id, kind, message).await {
            warn!(
                "Failed to deliver {} notification to {}: {}",
                kind.as_str(),
                receiver_id,
                e
            );
            crate::metrics::record_notification_failure();
        }
    }

    /// Live view of a user's notifications, newest first
    pub fn watch_notifications(&self, user_id: &str) -> LiveView<Notification> {
        let query = Query::collection(NOTIFICATIONS_COLLECTION).filter("receiverId", json!(user_id));
        let sub = self.store.subscribe(query);
        LiveView::from_subscription(sub, |docs| {
            let mut notifications: Vec<Notification> = decode_all(&docs);
            sort_by_timestamp(&mut notifications, |n| n.timestamp);
            notifications.reverse();
            notifications
        })
    }

    pub async fn unread_count(&self, user_id: &str) -> SyncResult<usize> {
        let docs = self
            .store
            .query(
                &Query::collection(NOTIFICATIONS_COLLECTION)
                    .filter("receiverId", json!(user_id))
                    .filter("read", json!(false)),
            )
            .await?;
        Ok(docs.len())
    }

    /// Mark one notification read. Marking an already-read one is a no-op.
    pub async fn mark_read(&self, notification_id: &str) -> SyncResult<()> {
        let mut fields = serde_json::Map::new();
        fields.insert("read".to_string(), json!(true));
        self.store
            .update(
                &crate::store::DocumentRef::new(NOTIFICATIONS_COLLECTION, notification_id),
                fields,
            )
            .await
    }

    /// Mark every unread notification for a user read
    pub async fn mark_all_read(&self, user_id: &str) -> SyncResult<usize> {
        let docs = self
            .store
            .query(
                &Query::collection(NOTIFICATIONS_COLLECTION)
                    .filter("receiverId", json!(user_id))
                    .filter("read", json!(false)),
            )
            .await?;

        let count = docs.len();
        for doc in &docs {
            self.mark_read(&doc.id).await?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SyncError, SyncResult};
    use crate::store::{
        spawn_snapshot_producer, ChangeNotifier, DocumentRef, MemoryStore, Subscription,
    };
    use async_trait::async_trait;
    use serde_json::{Map, Value};

    fn create_test_manager() -> (NotificationManager, Arc<dyn DocumentStore>) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        (NotificationManager::new(Arc::clone(&store)), store)
    }

    #[tokio::test]
    async fn test_notify_creates_unread_notification() {
        let (manager, store) = create_test_manager();
        manager
            .notify("u2", "u1", NotificationKind::FriendRequest, "Asha sent you a friend request")
            .await
            .unwrap();

        let docs = store
            .query(&Query::collection(NOTIFICATIONS_COLLECTION))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);

        let notification: Notification = docs[0].decode().unwrap();
        assert_eq!(notification.receiver_id, "u2");
        assert_eq!(notification.kind, NotificationKind::FriendRequest);
        assert!(!notification.read);
        assert!(notification.timestamp.is_some());
    }

    #[tokio::test]
    async fn test_unread_count_and_mark_all_read() {
        let (manager, _store) = create_test_manager();
        manager
            .notify("u2", "u1", NotificationKind::Follow, "Asha started following you")
            .await
            .unwrap();
        manager
            .notify("u2", "u3", NotificationKind::Message, "New message from Dev")
            .await
            .unwrap();
        manager
            .notify("u9", "u1", NotificationKind::Follow, "unrelated")
            .await
            .unwrap();

        assert_eq!(manager.unread_count("u2").await.unwrap(), 2);

        let marked = manager.mark_all_read("u2").await.unwrap();
        assert_eq!(marked, 2);
        assert_eq!(manager.unread_count("u2").await.unwrap(), 0);
        assert_eq!(manager.unread_count("u9").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mark_read_twice_is_harmless() {
        let (manager, _store) = create_test_manager();
        let id = manager
            .notify("u2", "u1", NotificationKind::Follow, "hi")
            .await
            .unwrap();

        manager.mark_read(&id).await.unwrap();
        manager.mark_read(&id).await.unwrap();
        assert_eq!(manager.unread_count("u2").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_watch_orders_newest_first() {
        let (manager, _store) = create_test_manager();
        let mut view = manager.watch_notifications("u2");

        manager
            .notify("u2", "u1", NotificationKind::Follow, "first")
            .await
            .unwrap();
        manager
            .notify("u2", "u1", NotificationKind::Message, "second")
            .await
            .unwrap();

        let mut current = view.current();
        while current.len() < 2 {
            view.changed().await.unwrap();
            current = view.current();
        }
        assert_eq!(current[0].message, "second");
        assert_eq!(current[1].message, "first");
    }

    /// Store that fails every write, for exercising the swallow path
    struct FailingStore;

    #[async_trait]
    impl DocumentStore for FailingStore {
        async fn create(&self, _: &str, _: Map<String, Value>) -> SyncResult<String> {
            Err(SyncError::Store("store offline".to_string()))
        }
        async fn update(&self, _: &DocumentRef, _: Map<String, Value>) -> SyncResult<()> {
            Err(SyncError::Store("store offline".to_string()))
        }
        async fn delete(&self, _: &DocumentRef) -> SyncResult<()> {
            Err(SyncError::Store("store offline".to_string()))
        }
        async fn get(&self, _: &DocumentRef) -> SyncResult<Option<crate::store::Document>> {
            Err(SyncError::Store("store offline".to_string()))
        }
        async fn query(&self, _: &Query) -> SyncResult<Vec<crate::store::Document>> {
            Err(SyncError::Store("store offline".to_string()))
        }
        fn subscribe(&self, query: Query) -> Subscription {
            spawn_snapshot_producer(query, &ChangeNotifier::new(), 1, |_| async {
                Err(SyncError::Store("store offline".to_string()))
            })
        }
    }

    #[tokio::test]
    async fn test_try_notify_swallows_store_failure() {
        let manager = NotificationManager::new(Arc::new(FailingStore));
        manager
            .try_notify("u2", "u1", NotificationKind::Follow, "never lands")
            .await;

        let direct = manager
            .notify("u2", "u1", NotificationKind::Follow, "also fails")
            .await;
        assert!(direct.is_err());
    }
}
