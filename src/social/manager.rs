/// Social graph synchronization
///
/// Friend requests, friendships, and follows over the document store.
/// Writes are independent and never retried; views re-derive themselves
/// from store snapshots, so tolerated races (duplicate requests, a
/// request accepted without its friendship) converge through queries
/// and the reconciliation pass rather than through coordination.
use crate::error::SyncResult;
use crate::identity::{require_member, UserIdentity};
use crate::notify::{NotificationKind, NotificationManager};
use crate::social::entities::{
    Follow, FriendRequest, Friendship, RequestStatus, FOLLOWS_COLLECTION,
    FRIENDSHIPS_COLLECTION, FRIEND_REQUESTS_COLLECTION,
};
use crate::store::{Document, DocumentRef, DocumentStore, Query};
use crate::sync::{decode_all, LiveView};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

pub struct SocialGraphManager {
    store: Arc<dyn DocumentStore>,
    notifications: Arc<NotificationManager>,
}

impl SocialGraphManager {
    pub fn new(store: Arc<dyn DocumentStore>, notifications: Arc<NotificationManager>) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Pending requests addressed to a user
    pub fn watch_incoming_requests(&self, user_id: &str) -> LiveView<FriendRequest> {
        let query = Query::collection(FRIEND_REQUESTS_COLLECTION)
            .filter("receiverId", json!(user_id))
            .filter("status", json!(RequestStatus::Pending.as_str()));
        let sub = self.store.subscribe(query);
        LiveView::from_subscription(sub, |docs| decode_all(&docs))
    }

    /// Pending requests a user has sent; the local cache request
    /// toggling consults
    pub fn watch_sent_requests(&self, user_id: &str) -> LiveView<FriendRequest> {
        let query = Query::collection(FRIEND_REQUESTS_COLLECTION)
            .filter("senderId", json!(user_id))
            .filter("status", json!(RequestStatus::Pending.as_str()));
        let sub = self.store.subscribe(query);
        LiveView::from_subscription(sub, |docs| decode_all(&docs))
    }

    /// A user's friendships
    ///
    /// The symmetric relation is stored one-directional, so this runs a
    /// query per orientation and concatenates. Any change re-fetches
    /// both sides in full.
    pub fn watch_friendships(&self, user_id: &str) -> LiveView<Friendship> {
        let first = Query::collection(FRIENDSHIPS_COLLECTION).filter("user1", json!(user_id));
        let second = Query::collection(FRIENDSHIPS_COLLECTION).filter("user2", json!(user_id));
        LiveView::from_dual_refetch(
            Arc::clone(&self.store),
            first,
            second,
            |mut first_docs, second_docs| {
                first_docs.extend(second_docs);
                decode_all(&first_docs)
            },
        )
    }

    /// Ids of everyone a user follows
    pub fn watch_following(&self, user_id: &str) -> LiveView<String> {
        let query = Query::collection(FOLLOWS_COLLECTION).filter("followerId", json!(user_id));
        let sub = self.store.subscribe(query);
        LiveView::from_subscription(sub, |docs| {
            decode_all::<Follow>(&docs)
                .into_iter()
                .map(|follow| follow.following_id)
                .collect()
        })
    }

    /// Send a friend request and raise a best-effort notification
    pub async fn send_friend_request(
        &self,
        sender: &UserIdentity,
        receiver: &UserIdentity,
    ) -> SyncResult<String> {
        require_member(sender, "send friend requests")?;

        let request = FriendRequest {
            id: String::new(),
            sender_id: sender.id.clone(),
            receiver_id: receiver.id.clone(),
            sender_name: sender.display_name.clone(),
            sender_photo: sender.photo_url.clone(),
            receiver_name: receiver.display_name.clone(),
            receiver_photo: receiver.photo_url.clone(),
            status: RequestStatus::Pending,
            timestamp: Some(Utc::now()),
        };

        let fields = Document::encode(&request)?;
        let id = self.store.create(FRIEND_REQUESTS_COLLECTION, fields).await?;
        crate::metrics::record_social_mutation("request_sent");
        info!("Friend request sent: {} -> {}", sender.id, receiver.id);

        self.notifications
            .try_notify(
                &receiver.id,
                &sender.id,
                NotificationKind::FriendRequest,
                &format!("{} sent you a friend request", sender.display_name),
            )
            .await;

        Ok(id)
    }

    /// Withdraw a pending request
    pub async fn cancel_friend_request(&self, request_id: &str) -> SyncResult<()> {
        self.store
            .delete(&DocumentRef::new(FRIEND_REQUESTS_COLLECTION, request_id))
            .await?;
        crate::metrics::record_social_mutation("request_cancelled");
        Ok(())
    }

    /// Send-or-cancel, decided by the caller's local view of their own
    /// pending requests. Returns true when a request is now pending.
    ///
    /// The decision is made against the supplied snapshot, so two tabs
    /// toggling at once can both send; duplicates are tolerated.
    pub async fn toggle_friend_request(
        &self,
        sender: &UserIdentity,
        receiver: &UserIdentity,
        sent_requests: &[FriendRequest],
    ) -> SyncResult<bool> {
        let existing = sent_requests
            .iter()
            .find(|request| request.receiver_id == receiver.id);

        match existing {
            Some(request) => {
                self.cancel_friend_request(&request.id).await?;
                Ok(false)
            }
            None => {
                self.send_friend_request(sender, receiver).await?;
                Ok(true)
            }
        }
    }

    /// Accept a request: mark it accepted, then create the friendship
    ///
    /// Two independent writes. If the second fails the request stays
    /// accepted with no friendship document; the error surfaces and the
    /// reconciliation pass repairs the pair later. No rollback.
    pub async fn accept_friend_request(
        &self,
        request_id: &str,
        sender_id: &str,
        current_user: &UserIdentity,
    ) -> SyncResult<()> {
        let mut status_fields = serde_json::Map::new();
        status_fields.insert(
            "status".to_string(),
            json!(RequestStatus::Accepted.as_str()),
        );
        self.store
            .update(
                &DocumentRef::new(FRIEND_REQUESTS_COLLECTION, request_id),
                status_fields,
            )
            .await?;

        let friendship = Friendship {
            id: String::new(),
            user1: current_user.id.clone(),
            user2: sender_id.to_string(),
            created_at: Some(Utc::now()),
        };
        let fields = Document::encode(&friendship)?;
        self.store.create(FRIENDSHIPS_COLLECTION, fields).await?;

        crate::metrics::record_social_mutation("request_accepted");
        info!(
            "✓ Friend request accepted: {} and {} are now friends",
            current_user.id, sender_id
        );

        self.notifications
            .try_notify(
                sender_id,
                &current_user.id,
                NotificationKind::FriendAccepted,
                &format!("{} accepted your friend request", current_user.display_name),
            )
            .await;

        Ok(())
    }

    /// Reject a request. Terminal; the document stays for the sender's
    /// client to observe.
    pub async fn reject_friend_request(&self, request_id: &str) -> SyncResult<()> {
        let mut fields = serde_json::Map::new();
        fields.insert(
            "status".to_string(),
            json!(RequestStatus::Rejected.as_str()),
        );
        self.store
            .update(
                &DocumentRef::new(FRIEND_REQUESTS_COLLECTION, request_id),
                fields,
            )
            .await?;
        crate::metrics::record_social_mutation("request_rejected");
        Ok(())
    }

    /// Follow-or-unfollow, decided by the caller's local following list.
    /// Returns true when the user now follows the target.
    ///
    /// Unfollow deletes every matching edge, not just one, so duplicate
    /// follows self-heal here.
    pub async fn toggle_follow(
        &self,
        current_user: &UserIdentity,
        target_id: &str,
        target_name: &str,
        following: &[String],
    ) -> SyncResult<bool> {
        require_member(current_user, "follow other athletes")?;

        if following.iter().any(|id| id == target_id) {
            let edges = self
                .store
                .query(
                    &Query::collection(FOLLOWS_COLLECTION)
                        .filter("followerId", json!(current_user.id))
                        .filter("followingId", json!(target_id)),
                )
                .await?;
            for edge in &edges {
                self.store
                    .delete(&DocumentRef::new(FOLLOWS_COLLECTION, &edge.id))
                    .await?;
            }
            crate::metrics::record_social_mutation("unfollow");
            info!("{} unfollowed {}", current_user.id, target_id);
            return Ok(false);
        }

        let follow = Follow {
            id: String::new(),
            follower_id: current_user.id.clone(),
            following_id: target_id.to_string(),
            follower_name: current_user.display_name.clone(),
            following_name: target_name.to_string(),
            timestamp: Some(Utc::now()),
        };
        let fields = Document::encode(&follow)?;
        self.store.create(FOLLOWS_COLLECTION, fields).await?;
        crate::metrics::record_social_mutation("follow");
        info!("{} followed {}", current_user.id, target_id);

        self.notifications
            .try_notify(
                target_id,
                &current_user.id,
                NotificationKind::Follow,
                &format!("{} started following you", current_user.display_name),
            )
            .await;

        Ok(true)
    }

    /// Remove a friendship in both stored orientations. Returns how many
    /// friendship documents were deleted.
    ///
    /// Accepted requests between the pair are deleted as well; an
    /// accepted request left behind would read as accepted-but-unfriended
    /// to the reconciliation pass, which would recreate the edge on its
    /// next run.
    pub async fn unfriend(&self, user_a: &str, user_b: &str) -> SyncResult<usize> {
        // Requests go first: if a friendship delete fails the pair is
        // still friends, while the reverse order can leave an accepted
        // request behind for the repair pass to act on.
        for (sender, receiver) in [(user_a, user_b), (user_b, user_a)] {
            let accepted = self
                .store
                .query(
                    &Query::collection(FRIEND_REQUESTS_COLLECTION)
                        .filter("senderId", json!(sender))
                        .filter("receiverId", json!(receiver))
                        .filter("status", json!(RequestStatus::Accepted.as_str())),
                )
                .await?;
            for doc in &accepted {
                self.store
                    .delete(&DocumentRef::new(FRIEND_REQUESTS_COLLECTION, &doc.id))
                    .await?;
            }
        }

        let mut removed = 0;
        for (first, second) in [(user_a, user_b), (user_b, user_a)] {
            let matches = self
                .store
                .query(
                    &Query::collection(FRIENDSHIPS_COLLECTION)
                        .filter("user1", json!(first))
                        .filter("user2", json!(second)),
                )
                .await?;
            for doc in &matches {
                self.store
                    .delete(&DocumentRef::new(FRIENDSHIPS_COLLECTION, &doc.id))
                    .await?;
                removed += 1;
            }
        }

        if removed > 0 {
            crate::metrics::record_social_mutation("unfriend");
            info!("Unfriended: {} and {}", user_a, user_b);
        }
        Ok(removed)
    }

    /// Repair pass for requests accepted without their friendship
    ///
    /// Scans accepted requests and creates the missing friendship in the
    /// canonical direction (receiver as user1). Returns how many were
    /// created. Consistent data is a no-op.
    pub async fn reconcile_accepted_requests(&self) -> SyncResult<usize> {
        let accepted = self
            .store
            .query(
                &Query::collection(FRIEND_REQUESTS_COLLECTION)
                    .filter("status", json!(RequestStatus::Accepted.as_str())),
            )
            .await?;

        let mut created = 0;
        for doc in &accepted {
            let request: FriendRequest = match doc.decode() {
                Ok(request) => request,
                Err(e) => {
                    warn!("Skipping undecodable accepted request {}: {}", doc.id, e);
                    continue;
                }
            };

            if self
                .friendship_exists(&request.receiver_id, &request.sender_id)
                .await?
            {
                continue;
            }

            let friendship = Friendship {
                id: String::new(),
                user1: request.receiver_id.clone(),
                user2: request.sender_id.clone(),
                created_at: Some(Utc::now()),
            };
            let fields = Document::encode(&friendship)?;
            self.store.create(FRIENDSHIPS_COLLECTION, fields).await?;
            created += 1;
            info!(
                "Reconciled friendship for accepted request {}: {} and {}",
                doc.id, request.receiver_id, request.sender_id
            );
        }

        Ok(created)
    }

    async fn friendship_exists(&self, user_a: &str, user_b: &str) -> SyncResult<bool> {
        for (first, second) in [(user_a, user_b), (user_b, user_a)] {
            let matches = self
                .store
                .query(
                    &Query::collection(FRIENDSHIPS_COLLECTION)
                        .filter("user1", json!(first))
                        .filter("user2", json!(second)),
                )
                .await?;
            if !matches.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SyncError, SyncResult};
    use crate::store::{MemoryStore, Subscription};
    use async_trait::async_trait;
    use serde_json::{Map, Value};

    fn create_test_manager() -> (SocialGraphManager, Arc<dyn DocumentStore>) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let notifications = Arc::new(NotificationManager::new(Arc::clone(&store)));
        (
            SocialGraphManager::new(Arc::clone(&store), notifications),
            store,
        )
    }

    fn asha() -> UserIdentity {
        UserIdentity::new("u1", "Asha").with_photo("https://cdn.example/asha.jpg")
    }

    fn dev() -> UserIdentity {
        UserIdentity::new("u2", "Dev")
    }

    async fn pending_request_id(
        manager: &SocialGraphManager,
        sender: &UserIdentity,
        receiver: &UserIdentity,
    ) -> String {
        manager.send_friend_request(sender, receiver).await.unwrap()
    }

    #[tokio::test]
    async fn test_send_friend_request_persists_and_notifies() {
        let (manager, store) = create_test_manager();
        let id = pending_request_id(&manager, &asha(), &dev()).await;

        let doc = store
            .get(&DocumentRef::new(FRIEND_REQUESTS_COLLECTION, &id))
            .await
            .unwrap()
            .unwrap();
        let request: FriendRequest = doc.decode().unwrap();
        assert_eq!(request.sender_id, "u1");
        assert_eq!(request.receiver_id, "u2");
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.sender_name, "Asha");
        assert!(request.sender_photo.is_some());

        let notifications = store
            .query(
                &Query::collection(crate::notify::NOTIFICATIONS_COLLECTION)
                    .filter("receiverId", json!("u2")),
            )
            .await
            .unwrap();
        assert_eq!(notifications.len(), 1);
    }

    #[tokio::test]
    async fn test_accept_updates_status_and_creates_friendship() {
        let (manager, store) = create_test_manager();
        let id = pending_request_id(&manager, &asha(), &dev()).await;

        manager.accept_friend_request(&id, "u1", &dev()).await.unwrap();

        let doc = store
            .get(&DocumentRef::new(FRIEND_REQUESTS_COLLECTION, &id))
            .await
            .unwrap()
            .unwrap();
        let request: FriendRequest = doc.decode().unwrap();
        assert_eq!(request.status, RequestStatus::Accepted);

        let friendships = store
            .query(&Query::collection(FRIENDSHIPS_COLLECTION))
            .await
            .unwrap();
        assert_eq!(friendships.len(), 1);
        let friendship: Friendship = friendships[0].decode().unwrap();
        assert!(friendship.involves("u1"));
        assert!(friendship.involves("u2"));
    }

    #[tokio::test]
    async fn test_reject_is_terminal_without_friendship() {
        let (manager, store) = create_test_manager();
        let id = pending_request_id(&manager, &asha(), &dev()).await;

        manager.reject_friend_request(&id).await.unwrap();

        let doc = store
            .get(&DocumentRef::new(FRIEND_REQUESTS_COLLECTION, &id))
            .await
            .unwrap()
            .unwrap();
        let request: FriendRequest = doc.decode().unwrap();
        assert_eq!(request.status, RequestStatus::Rejected);

        let friendships = store
            .query(&Query::collection(FRIENDSHIPS_COLLECTION))
            .await
            .unwrap();
        assert!(friendships.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_request_sends_then_cancels() {
        let (manager, store) = create_test_manager();

        let sent = manager
            .toggle_friend_request(&asha(), &dev(), &[])
            .await
            .unwrap();
        assert!(sent);

        let pending = store
            .query(
                &Query::collection(FRIEND_REQUESTS_COLLECTION).filter("senderId", json!("u1")),
            )
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        let cached: Vec<FriendRequest> =
            pending.iter().map(|d| d.decode().unwrap()).collect();

        let still_sent = manager
            .toggle_friend_request(&asha(), &dev(), &cached)
            .await
            .unwrap();
        assert!(!still_sent);

        let remaining = store
            .query(&Query::collection(FRIEND_REQUESTS_COLLECTION))
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_follow_and_defensive_unfollow() {
        let (manager, store) = create_test_manager();

        let following = manager
            .toggle_follow(&asha(), "u2", "Dev", &[])
            .await
            .unwrap();
        assert!(following);

        // Seed a duplicate edge the way a racing second tab would
        let duplicate = Follow {
            id: String::new(),
            follower_id: "u1".to_string(),
            following_id: "u2".to_string(),
            follower_name: "Asha".to_string(),
            following_name: "Dev".to_string(),
            timestamp: None,
        };
        store
            .create(FOLLOWS_COLLECTION, Document::encode(&duplicate).unwrap())
            .await
            .unwrap();

        let still_following = manager
            .toggle_follow(&asha(), "u2", "Dev", &["u2".to_string()])
            .await
            .unwrap();
        assert!(!still_following);

        let edges = store
            .query(&Query::collection(FOLLOWS_COLLECTION))
            .await
            .unwrap();
        assert!(edges.is_empty());
    }

    #[tokio::test]
    async fn test_unfriend_removes_both_orientations() {
        let (manager, store) = create_test_manager();
        for (user1, user2) in [("u1", "u2"), ("u2", "u1")] {
            let friendship = Friendship {
                id: String::new(),
                user1: user1.to_string(),
                user2: user2.to_string(),
                created_at: None,
            };
            store
                .create(FRIENDSHIPS_COLLECTION, Document::encode(&friendship).unwrap())
                .await
                .unwrap();
        }

        let removed = manager.unfriend("u1", "u2").await.unwrap();
        assert_eq!(removed, 2);

        let remaining = store
            .query(&Query::collection(FRIENDSHIPS_COLLECTION))
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_unfriend_retires_the_accepted_request() {
        let (manager, store) = create_test_manager();
        let id = pending_request_id(&manager, &asha(), &dev()).await;
        manager.accept_friend_request(&id, "u1", &dev()).await.unwrap();

        let removed = manager.unfriend("u1", "u2").await.unwrap();
        assert_eq!(removed, 1);

        // The accepted request goes with the friendship
        let requests = store
            .query(&Query::collection(FRIEND_REQUESTS_COLLECTION))
            .await
            .unwrap();
        assert!(requests.is_empty());

        // The repair pass finds nothing; the pair stays unfriended
        let created = manager.reconcile_accepted_requests().await.unwrap();
        assert_eq!(created, 0);
        let friendships = store
            .query(&Query::collection(FRIENDSHIPS_COLLECTION))
            .await
            .unwrap();
        assert!(friendships.is_empty());
    }

    #[tokio::test]
    async fn test_guests_cannot_mutate() {
        let (manager, _store) = create_test_manager();
        let guest = UserIdentity::guest("g1");

        let request = manager.send_friend_request(&guest, &dev()).await;
        assert!(matches!(request, Err(SyncError::GuestRestricted(_))));

        let follow = manager.toggle_follow(&guest, "u2", "Dev", &[]).await;
        assert!(matches!(follow, Err(SyncError::GuestRestricted(_))));
    }

    #[tokio::test]
    async fn test_watch_incoming_requests_sees_only_pending() {
        let (manager, _store) = create_test_manager();
        let mut view = manager.watch_incoming_requests("u2");

        let first = pending_request_id(&manager, &asha(), &dev()).await;
        let _second = pending_request_id(
            &manager,
            &UserIdentity::new("u3", "Kiran"),
            &dev(),
        )
        .await;
        manager.accept_friend_request(&first, "u1", &dev()).await.unwrap();

        // Settle on exactly the one remaining pending request
        let mut current = view.current();
        while current.len() != 1 || current[0].sender_id != "u3" {
            view.changed().await.unwrap();
            current = view.current();
        }
        assert_eq!(current[0].status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_watch_friendships_merges_both_orientations() {
        let (manager, store) = create_test_manager();
        let mut view = manager.watch_friendships("u1");

        for (user1, user2) in [("u1", "u2"), ("u3", "u1")] {
            let friendship = Friendship {
                id: String::new(),
                user1: user1.to_string(),
                user2: user2.to_string(),
                created_at: None,
            };
            store
                .create(FRIENDSHIPS_COLLECTION, Document::encode(&friendship).unwrap())
                .await
                .unwrap();
        }

        let mut current = view.current();
        while current.len() < 2 {
            view.changed().await.unwrap();
            current = view.current();
        }
        let peers: Vec<&str> = current
            .iter()
            .filter_map(|f| f.peer_of("u1"))
            .collect();
        assert!(peers.contains(&"u2"));
        assert!(peers.contains(&"u3"));
    }

    #[tokio::test]
    async fn test_watch_following_lists_target_ids() {
        let (manager, _store) = create_test_manager();
        let mut view = manager.watch_following("u1");

        manager.toggle_follow(&asha(), "u2", "Dev", &[]).await.unwrap();
        manager.toggle_follow(&asha(), "u3", "Kiran", &[]).await.unwrap();

        let mut current = view.current();
        while current.len() < 2 {
            view.changed().await.unwrap();
            current = view.current();
        }
        assert!(current.contains(&"u2".to_string()));
        assert!(current.contains(&"u3".to_string()));
    }

    #[tokio::test]
    async fn test_reconcile_creates_missing_friendship() {
        let (manager, store) = create_test_manager();
        let id = pending_request_id(&manager, &asha(), &dev()).await;

        // Simulate the partial accept: status flips but the friendship
        // write never happened
        let mut fields = Map::new();
        fields.insert(
            "status".to_string(),
            json!(RequestStatus::Accepted.as_str()),
        );
        store
            .update(&DocumentRef::new(FRIEND_REQUESTS_COLLECTION, &id), fields)
            .await
            .unwrap();

        let created = manager.reconcile_accepted_requests().await.unwrap();
        assert_eq!(created, 1);

        let friendships = store
            .query(&Query::collection(FRIENDSHIPS_COLLECTION))
            .await
            .unwrap();
        assert_eq!(friendships.len(), 1);
        let friendship: Friendship = friendships[0].decode().unwrap();
        assert_eq!(friendship.user1, "u2");
        assert_eq!(friendship.user2, "u1");

        // Consistent data is a no-op
        let second_run = manager.reconcile_accepted_requests().await.unwrap();
        assert_eq!(second_run, 0);
        let after = store
            .query(&Query::collection(FRIENDSHIPS_COLLECTION))
            .await
            .unwrap();
        assert_eq!(after.len(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_skips_undecodable_requests() {
        let (manager, store) = create_test_manager();

        // An accepted request whose senderId has the wrong shape
        let mut malformed = Map::new();
        malformed.insert("senderId".to_string(), json!(7));
        malformed.insert("receiverId".to_string(), json!("u2"));
        malformed.insert(
            "status".to_string(),
            json!(RequestStatus::Accepted.as_str()),
        );
        store
            .create(FRIEND_REQUESTS_COLLECTION, malformed)
            .await
            .unwrap();

        // A well-formed accepted request still missing its friendship
        let id = pending_request_id(&manager, &asha(), &dev()).await;
        let mut fields = Map::new();
        fields.insert(
            "status".to_string(),
            json!(RequestStatus::Accepted.as_str()),
        );
        store
            .update(&DocumentRef::new(FRIEND_REQUESTS_COLLECTION, &id), fields)
            .await
            .unwrap();

        // The malformed document is skipped, not fatal
        let created = manager.reconcile_accepted_requests().await.unwrap();
        assert_eq!(created, 1);
        let friendships = store
            .query(&Query::collection(FRIENDSHIPS_COLLECTION))
            .await
            .unwrap();
        assert_eq!(friendships.len(), 1);
        let friendship: Friendship = friendships[0].decode().unwrap();
        assert!(friendship.involves("u1"));
        assert!(friendship.involves("u2"));
    }

    /// Store whose friendship writes fail, for the partial-accept path
    struct FriendshipWritesFail {
        inner: MemoryStore,
    }

    #[async_trait]
    impl DocumentStore for FriendshipWritesFail {
        async fn create(&self, collection: &str, fields: Map<String, Value>) -> SyncResult<String> {
            if collection == FRIENDSHIPS_COLLECTION {
                return Err(SyncError::Store("friendships unavailable".to_string()));
            }
            self.inner.create(collection, fields).await
        }
        async fn update(&self, doc: &DocumentRef, fields: Map<String, Value>) -> SyncResult<()> {
            self.inner.update(doc, fields).await
        }
        async fn delete(&self, doc: &DocumentRef) -> SyncResult<()> {
            self.inner.delete(doc).await
        }
        async fn get(&self, doc: &DocumentRef) -> SyncResult<Option<Document>> {
            self.inner.get(doc).await
        }
        async fn query(&self, query: &Query) -> SyncResult<Vec<Document>> {
            self.inner.query(query).await
        }
        fn subscribe(&self, query: Query) -> Subscription {
            self.inner.subscribe(query)
        }
    }

    #[tokio::test]
    async fn test_partial_accept_surfaces_error_without_rollback() {
        let store: Arc<dyn DocumentStore> = Arc::new(FriendshipWritesFail {
            inner: MemoryStore::new(),
        });
        let notifications = Arc::new(NotificationManager::new(Arc::clone(&store)));
        let manager = SocialGraphManager::new(Arc::clone(&store), notifications);

        let id = manager
            .send_friend_request(&asha(), &dev())
            .await
            .unwrap();
        let result = manager.accept_friend_request(&id, "u1", &dev()).await;
        assert!(result.is_err());

        // The status update stays; nothing is rolled back
        let doc = store
            .get(&DocumentRef::new(FRIEND_REQUESTS_COLLECTION, &id))
            .await
            .unwrap()
            .unwrap();
        let request: FriendRequest = doc.decode().unwrap();
        assert_eq!(request.status, RequestStatus::Accepted);

        let friendships = store
            .query(&Query::collection(FRIENDSHIPS_COLLECTION))
            .await
            .unwrap();
        assert!(friendships.is_empty());
    }
}
