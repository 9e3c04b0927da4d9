//! Friend and follow endpoints.

use super::api::ApiClient;
use crate::error::{ClientError, Result};
use crate::models::social::{Ack, FriendRequestAction};
use crate::models::{FollowersList, FollowingList, FriendList, FriendRequest, UserId};

impl ApiClient {
    pub async fn my_friends(&self) -> Result<FriendList> {
        let mut lists: Vec<FriendList> = self.get("friends/").await?;
        lists
            .pop()
            .ok_or_else(|| ClientError::NotFound("Friend list not found".to_string()))
    }

    pub async fn friends_of(&self, user: UserId) -> Result<FriendList> {
        self.get(&format!("friends/{user}/")).await
    }

    /// Pending requests addressed to the signed-in user.
    pub async fn friend_requests(&self) -> Result<Vec<FriendRequest>> {
        self.get("friends/requests/").await
    }

    pub async fn sent_friend_requests(&self) -> Result<Vec<FriendRequest>> {
        self.get("friends/requests/sent/").await
    }

    pub async fn send_friend_request(&self, user: UserId) -> Result<FriendRequest> {
        self.post(&format!("friends/requests/add/{user}/"), &serde_json::json!({}))
            .await
    }

    pub async fn accept_friend_request(&self, request_id: u64) -> Result<Ack> {
        self.post("friends/requests/accept/", &FriendRequestAction { request_id })
            .await
    }

    pub async fn decline_friend_request(&self, request_id: u64) -> Result<Ack> {
        self.post("friends/requests/decline/", &FriendRequestAction { request_id })
            .await
    }

    pub async fn cancel_friend_request(&self, request_id: u64) -> Result<()> {
        self.post_empty(&format!("friends/requests/cancel/{request_id}/"))
            .await
    }

    pub async fn unfriend(&self, user: UserId) -> Result<()> {
        self.post_empty(&format!("friends/unfriend/{user}/")).await
    }

    pub async fn follow(&self, user: UserId) -> Result<()> {
        self.post_empty(&format!("follow/user/{user}/")).await
    }

    pub async fn unfollow(&self, user: UserId) -> Result<()> {
        self.post_empty(&format!("follow/unfollow/{user}/")).await
    }

    pub async fn following(&self, user: UserId) -> Result<FollowingList> {
        self.get(&format!("follow/following/{user}/")).await
    }

    pub async fn followers(&self, user: UserId) -> Result<FollowersList> {
        self.get(&format!("follow/followers/{user}/")).await
    }
}
