/// Messaging synchronization
///
/// Sends run through the content filter before anything is persisted.
/// The message view merges the as-sender and as-receiver query results,
/// dedups by id, and sorts ascending by timestamp; per-thread filtering
/// is a pure function over that merged list.
use crate::chat::entities::{DeleteScope, Message, MESSAGES_COLLECTION};
use crate::error::{SyncError, SyncResult};
use crate::filter::{ContentFilter, ViolationLog};
use crate::identity::{require_member, UserIdentity};
use crate::notify::{NotificationKind, NotificationManager};
use crate::store::{Document, DocumentRef, DocumentStore, Query};
use crate::sync::{decode_all, dedup_by_id, sort_by_timestamp, LiveView};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

pub struct MessagingManager {
    store: Arc<dyn DocumentStore>,
    filter: Arc<dyn ContentFilter>,
    violations: ViolationLog,
    notifications: Arc<NotificationManager>,
}

impl MessagingManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        filter: Arc<dyn ContentFilter>,
        notifications: Arc<NotificationManager>,
    ) -> Self {
        let violations = ViolationLog::new(Arc::clone(&store));
        Self {
            store,
            filter,
            violations,
            notifications,
        }
    }

    /// Every message a user sent or received, merged and ordered
    ///
    /// Two live queries cover both directions. Any change re-fetches
    /// both in full; duplicates (self-messages land in both results)
    /// keep their first occurrence, and messages without a timestamp
    /// sort to the front as the epoch.
    pub fn watch_messages(&self, user_id: &str) -> LiveView<Message> {
        let as_receiver =
            Query::collection(MESSAGES_COLLECTION).filter("receiverId", json!(user_id));
        let as_sender = Query::collection(MESSAGES_COLLECTION).filter("senderId", json!(user_id));
        LiveView::from_dual_refetch(
            Arc::clone(&self.store),
            as_receiver,
            as_sender,
            |mut received, sent| {
                received.extend(sent);
                let deduped = dedup_by_id(received);
                let mut messages: Vec<Message> = decode_all(&deduped);
                sort_by_timestamp(&mut messages, |m| m.timestamp);
                messages
            },
        )
    }

    /// The conversation between the current user and one peer
    ///
    /// Pure filter over an already-merged list: both directions of the
    /// pair, minus messages the current user deleted for themselves.
    /// Source order is preserved.
    pub fn thread_for(messages: &[Message], current_user_id: &str, peer_id: &str) -> Vec<Message> {
        messages
            .iter()
            .filter(|m| m.is_between(current_user_id, peer_id) && m.visible_to(current_user_id))
            .cloned()
            .collect()
    }

    /// Send a message, gated by the content filter
    ///
    /// Blocked text never reaches the store. Flagged text is recorded
    /// for review and the send proceeds.
    pub async fn send_message(
        &self,
        sender: &UserIdentity,
        receiver_id: &str,
        text: &str,
    ) -> SyncResult<String> {
        require_member(sender, "send messages")?;

        let verdict = self.filter.check(text).await;
        if verdict.should_flag {
            self.violations.record(&sender.id, text, &verdict).await;
        }
        if verdict.should_block {
            crate::metrics::record_message_blocked(&verdict.categories);
            return Err(SyncError::ContentBlocked(verdict.categories.join(", ")));
        }

        let message = Message {
            id: String::new(),
            sender_id: sender.id.clone(),
            receiver_id: receiver_id.to_string(),
            sender_name: sender.display_name.clone(),
            sender_photo: sender.photo_url.clone(),
            message: text.to_string(),
            timestamp: Some(Utc::now()),
            read: false,
            edited: false,
            edited_at: None,
            deleted_for: Vec::new(),
        };

        let fields = Document::encode(&message)?;
        let id = self.store.create(MESSAGES_COLLECTION, fields).await?;
        crate::metrics::record_message_sent();

        self.notifications
            .try_notify(
                receiver_id,
                &sender.id,
                NotificationKind::Message,
                &format!("New message from {}", sender.display_name),
            )
            .await;

        Ok(id)
    }

    /// Edit a message's text. Sender only; edits pass the same filter
    /// gate as sends.
    pub async fn edit_message(
        &self,
        message_id: &str,
        current_user: &UserIdentity,
        new_text: &str,
    ) -> SyncResult<()> {
        let doc_ref = DocumentRef::new(MESSAGES_COLLECTION, message_id);
        let doc = self
            .store
            .get(&doc_ref)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("message {}", message_id)))?;
        let message: Message = doc.decode()?;

        if message.sender_id != current_user.id {
            return Err(SyncError::NotMessageSender(message_id.to_string()));
        }

        let verdict = self.filter.check(new_text).await;
        if verdict.should_flag {
            self.violations
                .record(&current_user.id, new_text, &verdict)
                .await;
        }
        if verdict.should_block {
            crate::metrics::record_message_blocked(&verdict.categories);
            return Err(SyncError::ContentBlocked(verdict.categories.join(", ")));
        }

        let mut fields = serde_json::Map::new();
        fields.insert("message".to_string(), json!(new_text));
        fields.insert("edited".to_string(), json!(true));
        fields.insert("editedAt".to_string(), json!(Utc::now()));
        self.store.update(&doc_ref, fields).await?;
        crate::metrics::record_message_edited();
        Ok(())
    }

    /// Delete a message for one user or for everyone
    ///
    /// `Me` appends the user to `deletedFor`; calling it again is a
    /// no-op. `Everyone` hard-deletes and is sender-only.
    pub async fn delete_message(
        &self,
        message_id: &str,
        current_user_id: &str,
        scope: DeleteScope,
    ) -> SyncResult<()> {
        let doc_ref = DocumentRef::new(MESSAGES_COLLECTION, message_id);
        let doc = self
            .store
            .get(&doc_ref)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("message {}", message_id)))?;
        let message: Message = doc.decode()?;

        match scope {
            DeleteScope::Me => {
                if !message.visible_to(current_user_id) {
                    return Ok(());
                }
                let mut deleted_for = message.deleted_for;
                deleted_for.push(current_user_id.to_string());
                let mut fields = serde_json::Map::new();
                fields.insert("deletedFor".to_string(), json!(deleted_for));
                self.store.update(&doc_ref, fields).await?;
            }
            DeleteScope::Everyone => {
                if message.sender_id != current_user_id {
                    return Err(SyncError::NotMessageSender(message_id.to_string()));
                }
                self.store.delete(&doc_ref).await?;
                info!("Message {} deleted for everyone", message_id);
            }
        }

        crate::metrics::record_message_deleted(scope.as_str());
        Ok(())
    }
}
