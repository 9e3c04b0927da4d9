use super::fetch;
use crate::clients::ApiClient;
use crate::error::Result;
use crate::models::{UserId, UserSummary};

/// Directory of every registered user.
#[derive(Debug)]
pub struct UsersView {
    pub users: Vec<UserSummary>,
}

impl UsersView {
    pub async fn load(api: &ApiClient) -> Result<Self> {
        let users = fetch("users", api.all_users()).await?;
        Ok(Self { users })
    }

    /// Everyone except `me`, case-insensitively filtered by name.
    #[must_use]
    pub fn matching(&self, me: Option<UserId>, needle: &str) -> Vec<&UserSummary> {
        let needle = needle.trim().to_lowercase();
        self.users
            .iter()
            .filter(|u| Some(u.user_id) != me)
            .filter(|u| needle.is_empty() || u.username.to_lowercase().contains(&needle))
            .collect()
    }
}
