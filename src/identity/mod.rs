/// Identity provider boundary
///
/// Authentication lives outside this crate. The sync engine only needs
/// the current user's stable id, display name, optional photo, and
/// whether they are an anonymous guest.
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub guest: bool,
}

impl UserIdentity {
    pub fn new(id: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            photo_url: None,
            guest: false,
        }
    }

    pub fn with_photo(mut self, url: &str) -> Self {
        self.photo_url = Some(url.to_string());
        self
    }

    /// An anonymous guest session
    pub fn guest(id: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: "Guest".to_string(),
            photo_url: None,
            guest: true,
        }
    }
}

/// Source of the current user
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, or `None` when signed out
    async fn current_user(&self) -> SyncResult<Option<UserIdentity>>;
}

/// Provider pinned to one known identity
pub struct StaticIdentity {
    user: Option<UserIdentity>,
}

impl StaticIdentity {
    pub fn signed_in(user: UserIdentity) -> Self {
        Self { user: Some(user) }
    }

    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> SyncResult<Option<UserIdentity>> {
        Ok(self.user.clone())
    }
}

/// Guests can browse and observe but never write social or chat
/// documents.
pub(crate) fn require_member(user: &UserIdentity, action: &str) -> SyncResult<()> {
    if user.guest {
        return Err(SyncError::GuestRestricted(action.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_identity_returns_pinned_user() {
        let provider = StaticIdentity::signed_in(UserIdentity::new("u1", "Asha"));
        let user = provider.current_user().await.unwrap().unwrap();
        assert_eq!(user.id, "u1");
        assert!(!user.guest);

        let signed_out = StaticIdentity::signed_out();
        assert!(signed_out.current_user().await.unwrap().is_none());
    }

    #[test]
    fn test_require_member_rejects_guests() {
        let member = UserIdentity::new("u1", "Asha");
        assert!(require_member(&member, "send messages").is_ok());

        let guest = UserIdentity::guest("g1");
        let result = require_member(&guest, "send messages");
        assert!(matches!(result, Err(SyncError::GuestRestricted(_))));
    }
}
