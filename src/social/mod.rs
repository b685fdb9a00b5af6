/// Social Graph Sync
///
/// Friend requests, friendships, and follow edges: live views for the
/// UI plus the mutations behind request/accept/reject, follow toggling,
/// and unfriending.

pub mod entities;
pub mod manager;

pub use entities::{
    Follow, FriendRequest, Friendship, RequestStatus, FOLLOWS_COLLECTION,
    FRIENDSHIPS_COLLECTION, FRIEND_REQUESTS_COLLECTION,
};
pub use manager::SocialGraphManager;
