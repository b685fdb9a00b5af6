/// Chat entities
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MESSAGES_COLLECTION: &str = "messages";

/// A direct message between two users
///
/// Deletion for a single user is soft: their id lands in `deletedFor`
/// and the document stays for the other side. Only the sender may hard
/// delete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub sender_name: String,
    #[serde(default)]
    pub sender_photo: Option<String>,
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub edited: bool,
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_for: Vec<String>,
}

impl Message {
    /// Whether this message travels between exactly these two users,
    /// in either direction
    pub fn is_between(&self, user_a: &str, user_b: &str) -> bool {
        (self.sender_id == user_a && self.receiver_id == user_b)
            || (self.sender_id == user_b && self.receiver_id == user_a)
    }

    pub fn visible_to(&self, user_id: &str) -> bool {
        !self.deleted_for.iter().any(|id| id == user_id)
    }

    /// Permissions behind the per-message action menu
    pub fn actions_for(&self, user_id: &str) -> MessageActions {
        let is_sender = self.sender_id == user_id;
        let involved = is_sender || self.receiver_id == user_id;
        MessageActions {
            can_edit: is_sender,
            can_delete_for_everyone: is_sender,
            can_delete_for_me: involved && self.visible_to(user_id),
        }
    }
}

/// Deletion scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteScope {
    /// Hide the message from the requesting user only
    Me,
    /// Remove the document for both sides (sender only)
    Everyone,
}

impl DeleteScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteScope::Me => "me",
            DeleteScope::Everyone => "everyone",
        }
    }
}

/// What a user may do with one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageActions {
    pub can_edit: bool,
    pub can_delete_for_everyone: bool,
    pub can_delete_for_me: bool,
}
