//! The signed-in user's anime list and skip set.

use super::api::ApiClient;
use crate::error::{ClientError, Result};
use crate::models::{
    ListStatus, MalId, NewTempDeleted, NewUserAnime, StatusUpdate, TempDeletedAnime, UserAnime,
    UserId,
};
use crate::models::social::Ack;

impl ApiClient {
    pub async fn my_anime(&self) -> Result<Vec<UserAnime>> {
        self.get("users/anime/").await
    }

    pub async fn add_anime(&self, entry: &NewUserAnime) -> Result<UserAnime> {
        self.post("users/anime/", entry).await
    }

    /// Sets the disposition of the entry for `mal_id`; both flags are always sent.
    pub async fn update_anime_status(&self, mal_id: MalId, status: ListStatus) -> Result<()> {
        let _: Ack = self
            .put(
                &format!("users/anime/update/{mal_id}/"),
                &StatusUpdate::from(status),
            )
            .await?;
        Ok(())
    }

    /// Removes a list entry by its list id (not the MAL id).
    pub async fn delete_anime(&self, entry_id: u64) -> Result<()> {
        self.delete(&format!("users/anime/delete/{entry_id}/")).await
    }

    pub async fn recent_anime(&self, user: UserId) -> Result<Vec<UserAnime>> {
        self.get(&format!("users/anime/recent/{user}/")).await
    }

    pub async fn user_anime(&self, user: UserId) -> Result<Vec<UserAnime>> {
        self.get(&format!("users/anime/username/{user}/")).await
    }

    pub async fn temp_deleted(&self) -> Result<Vec<TempDeletedAnime>> {
        self.get("users/anime/temp-deleted/").await
    }

    pub async fn add_temp_deleted(&self, record: &NewTempDeleted) -> Result<TempDeletedAnime> {
        self.post("users/anime/temp-deleted/", record).await
    }

    pub async fn restore_temp_deleted(&self, record_id: u64) -> Result<()> {
        self.delete(&format!("users/anime/temp-deleted/{record_id}/"))
            .await
    }

    /// Clears the whole skip set. Returns `false` when there was nothing to clear.
    pub async fn clear_temp_deleted(&self, user: UserId) -> Result<bool> {
        match self
            .delete(&format!("users/anime/temp-deleted/delete-all/{user}/"))
            .await
        {
            Ok(()) => Ok(true),
            Err(ClientError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
