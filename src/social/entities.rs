/// Social graph entities
///
/// Field names match the wire format of the document store (camelCase).
/// Ids are store-assigned; `#[serde(default)]` lets entities round-trip
/// through `Document::encode`, which strips them.
use crate::error::{SyncError, SyncResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FRIEND_REQUESTS_COLLECTION: &str = "friendRequests";
pub const FRIENDSHIPS_COLLECTION: &str = "friendships";
pub const FOLLOWS_COLLECTION: &str = "follows";

/// Friend request lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> SyncResult<Self> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" => Ok(RequestStatus::Accepted),
            "rejected" => Ok(RequestStatus::Rejected),
            _ => Err(SyncError::Validation(format!(
                "Invalid request status: {}",
                s
            ))),
        }
    }
}

/// A pending, accepted, or rejected friend request
///
/// Carries denormalized names and photos of both parties so request
/// lists render without extra lookups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    #[serde(default)]
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub sender_name: String,
    #[serde(default)]
    pub sender_photo: Option<String>,
    pub receiver_name: String,
    #[serde(default)]
    pub receiver_photo: Option<String>,
    pub status: RequestStatus,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A symmetric friendship stored as one document
///
/// Which user lands in `user1` depends on who accepted; queries always
/// check both orientations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    #[serde(default)]
    pub id: String,
    pub user1: String,
    pub user2: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Friendship {
    pub fn involves(&self, user_id: &str) -> bool {
        self.user1 == user_id || self.user2 == user_id
    }

    /// The other side of the friendship, if `user_id` is part of it
    pub fn peer_of(&self, user_id: &str) -> Option<&str> {
        if self.user1 == user_id {
            Some(&self.user2)
        } else if self.user2 == user_id {
            Some(&self.user1)
        } else {
            None
        }
    }
}

/// A directed follow edge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    #[serde(default)]
    pub id: String,
    pub follower_id: String,
    pub following_id: String,
    pub follower_name: String,
    #[serde(default)]
    pub following_name: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}
