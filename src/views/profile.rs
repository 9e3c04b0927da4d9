use tracing::info;

use super::{fetch, report, signed_in};
use crate::chat::RoomId;
use crate::clients::ApiClient;
use crate::error::{ClientError, Result};
use crate::models::{
    CurrentUser, FollowersList, FollowingList, FriendList, FriendRequest, Profile, ProfileUpdate,
    UserAnime, UserId,
};

pub const RECENT_LIMIT: usize = 5;

fn most_recent(mut entries: Vec<UserAnime>) -> Vec<UserAnime> {
    entries.sort_by(|a, b| b.add_time.cmp(&a.add_time));
    entries.truncate(RECENT_LIMIT);
    entries
}

/// The signed-in user's own profile page.
#[derive(Debug)]
pub struct OwnProfileView {
    api: ApiClient,
    pub profile: Profile,
    pub recent: Vec<UserAnime>,
    pub requests: Vec<FriendRequest>,
    pub friends: FriendList,
    pub following: FollowingList,
}

impl OwnProfileView {
    pub async fn load(api: &ApiClient) -> Result<Self> {
        let me = signed_in(api)?;

        let (profile, recent, requests, friends, following) = tokio::try_join!(
            fetch("profile", api.profile(me.id)),
            fetch("recent anime", api.recent_anime(me.id)),
            fetch("friend requests", api.friend_requests()),
            fetch("friends", api.my_friends()),
            fetch("following", api.following(me.id)),
        )?;

        Ok(Self {
            api: api.clone(),
            profile,
            recent: most_recent(recent),
            requests: requests.into_iter().filter(|r| r.is_active).collect(),
            friends,
            following,
        })
    }

    pub async fn accept(&mut self, request_id: u64) -> Result<()> {
        let result = self.api.accept_friend_request(request_id).await;
        report(&self.api, result, |_| "Friend request accepted!".to_string())?;

        if let Some(pos) = self.requests.iter().position(|r| r.id == request_id) {
            let request = self.requests.remove(pos);
            let username = request
                .sender_username
                .unwrap_or_else(|| format!("User {}", request.sender));
            if !self.friends.contains(request.sender) {
                self.friends.friends.push(crate::models::UserRef {
                    id: request.sender,
                    username,
                });
            }
        }
        Ok(())
    }

    pub async fn decline(&mut self, request_id: u64) -> Result<()> {
        let result = self.api.decline_friend_request(request_id).await;
        report(&self.api, result, |_| "Friend request rejected".to_string())?;
        self.requests.retain(|r| r.id != request_id);
        Ok(())
    }

    pub async fn unfriend(&mut self, user: UserId) -> Result<()> {
        let result = self.api.unfriend(user).await;
        report(&self.api, result, |_| "Friend removed".to_string())?;
        self.friends.friends.retain(|f| f.id != user);
        Ok(())
    }

    pub async fn unfollow(&mut self, user: UserId) -> Result<()> {
        let result = self.api.unfollow(user).await;
        report(&self.api, result, |_| "You have unfollowed this user".to_string())?;
        self.following.following.retain(|f| f.id != user);
        Ok(())
    }
}

/// Somebody else's profile as seen by the signed-in user.
#[derive(Debug)]
pub struct PublicProfileView {
    api: ApiClient,
    viewer: CurrentUser,
    pub profile: Profile,
    pub recent: Vec<UserAnime>,
    pub friends: FriendList,
    pub following: FollowingList,
    pub followers: FollowersList,
}

impl PublicProfileView {
    pub async fn load(api: &ApiClient, user: UserId) -> Result<Self> {
        let viewer = signed_in(api)?;

        let (profile, recent, friends, following, followers) = tokio::try_join!(
            fetch("profile", api.profile(user)),
            fetch("recent anime", api.recent_anime(user)),
            fetch("friends", api.friends_of(user)),
            fetch("following", api.following(user)),
            fetch("followers", api.followers(user)),
        )?;

        Ok(Self {
            api: api.clone(),
            viewer,
            profile,
            recent: most_recent(recent),
            friends,
            following,
            followers,
        })
    }

    #[must_use]
    pub fn user(&self) -> UserId {
        self.profile.user_id
    }

    #[must_use]
    pub fn is_self(&self) -> bool {
        self.user() == self.viewer.id
    }

    #[must_use]
    pub fn is_friend(&self) -> bool {
        self.friends.contains(self.viewer.id)
    }

    #[must_use]
    pub fn is_followed_by_viewer(&self) -> bool {
        self.followers.followers.iter().any(|f| f.id == self.viewer.id)
    }

    /// Room shared by the viewer and this user.
    #[must_use]
    pub fn chat_room(&self) -> RoomId {
        RoomId::between(self.viewer.id, self.user())
    }

    pub async fn send_friend_request(&self) -> Result<FriendRequest> {
        if self.is_self() {
            return Err(ClientError::Validation(
                "You cannot send a friend request to yourself".to_string(),
            ));
        }
        let result = self.api.send_friend_request(self.user()).await;
        report(&self.api, result, |_| "Friend request sent!".to_string())
    }

    pub async fn follow(&mut self) -> Result<()> {
        let result = self.api.follow(self.user()).await;
        report(&self.api, result, |_| "You are now following this user!".to_string())?;
        if !self.is_followed_by_viewer() {
            self.followers.followers.push(crate::models::UserRef {
                id: self.viewer.id,
                username: self.viewer.username.clone(),
            });
        }
        Ok(())
    }

    pub async fn unfollow(&mut self) -> Result<()> {
        let result = self.api.unfollow(self.user()).await;
        report(&self.api, result, |_| "You have unfollowed this user".to_string())?;
        let viewer = self.viewer.id;
        self.followers.followers.retain(|f| f.id != viewer);
        Ok(())
    }
}

/// Multipart profile update for the signed-in user.
pub async fn edit_profile(api: &ApiClient, update: &ProfileUpdate) -> Result<Profile> {
    if update.is_empty() {
        return Err(ClientError::Validation("Nothing to update".to_string()));
    }
    let me = signed_in(api)?;

    let result = api.update_profile(me.id, update).await;
    let profile = report(api, result, |_| "Profile updated successfully".to_string())?;

    if profile.username != me.username {
        api.session().restore(CurrentUser {
            id: me.id,
            username: profile.username.clone(),
        })?;
        info!(username = %profile.username, "Username changed");
    }
    Ok(profile)
}
