use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequest {
    pub id: u64,
    pub sender: UserId,
    #[serde(default)]
    pub sender_username: Option<String>,
    pub receiver: UserId,
    #[serde(default)]
    pub receiver_username: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of the accept/decline endpoints.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FriendRequestAction {
    pub request_id: u64,
}

/// A user reference as embedded in friend and follow lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendList {
    pub user: String,
    pub user_id: UserId,
    #[serde(default)]
    pub friends: Vec<UserRef>,
}

impl FriendList {
    #[must_use]
    pub fn contains(&self, id: UserId) -> bool {
        self.friends.iter().any(|f| f.id == id)
    }
}

/// Users that `user_id` follows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowingList {
    pub username: String,
    pub user_id: UserId,
    #[serde(default)]
    pub following: Vec<UserRef>,
}

impl FollowingList {
    #[must_use]
    pub fn is_following(&self, id: UserId) -> bool {
        self.following.iter().any(|f| f.id == id)
    }
}

/// Users that follow `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowersList {
    pub username: String,
    pub user_id: UserId,
    #[serde(default)]
    pub followers: Vec<UserRef>,
}

/// Acknowledgement body used by the social endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl Ack {
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().or(self.detail.as_deref())
    }
}
