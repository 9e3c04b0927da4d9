//! Account and profile endpoints.

use reqwest::multipart::{Form, Part};
use tracing::debug;

use super::api::ApiClient;
use crate::error::{ClientError, Result};
use crate::models::user::AccountInfo;
use crate::models::{Profile, ProfileUpdate, UserId, UserSummary};

impl ApiClient {
    pub async fn me(&self) -> Result<AccountInfo> {
        self.get("users/me/").await
    }

    pub async fn profile(&self, user: UserId) -> Result<Profile> {
        self.get(&format!("users/profile/{user}/")).await
    }

    pub async fn all_users(&self) -> Result<Vec<UserSummary>> {
        self.get("users/all/").await
    }

    /// Multipart update; only the fields that are set are sent.
    pub async fn update_profile(&self, user: UserId, update: &ProfileUpdate) -> Result<Profile> {
        let mut form = Form::new();

        if let Some(username) = &update.username {
            form = form.text("username", username.clone());
        }
        if let Some(bio) = &update.bio {
            form = form.text("bio", bio.clone());
        }
        if let Some(path) = &update.profile_image {
            let bytes = tokio::fs::read(path).await?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "profile_image".to_string());
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            debug!(file = %file_name, %mime, size = bytes.len(), "Attaching profile image");

            let part = Part::bytes(bytes)
                .file_name(file_name)
                .mime_str(mime.as_ref())
                .map_err(|e| ClientError::Validation(e.to_string()))?;
            form = form.part("profile_image", part);
        }

        self.put_multipart(&format!("users/profile/{user}/update/"), form)
            .await
    }
}
