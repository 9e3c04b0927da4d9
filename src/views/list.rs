use tracing::info;

use super::{fetch, report, signed_in};
use crate::clients::ApiClient;
use crate::error::{ClientError, Result};
use crate::models::{
    Anime, ListStatus, MalId, NewUserAnime, Profile, TempDeletedAnime, UserAnime, UserId,
};

/// The signed-in user's list plus the skip history.
#[derive(Debug)]
pub struct ListView {
    api: ApiClient,
    user: UserId,
    entries: Vec<UserAnime>,
    skipped: Vec<TempDeletedAnime>,
    catalog: Vec<Anime>,
}

impl ListView {
    pub async fn load(api: &ApiClient) -> Result<Self> {
        let me = signed_in(api)?;

        let (entries, skipped, catalog) = tokio::try_join!(
            fetch("your anime list", api.my_anime()),
            fetch("skipped anime", api.temp_deleted()),
            fetch("anime catalog", api.all_anime()),
        )?;
        info!(entries = entries.len(), skipped = skipped.len(), "Anime list loaded");

        Ok(Self {
            api: api.clone(),
            user: me.id,
            entries,
            skipped,
            catalog,
        })
    }

    #[must_use]
    pub fn entries(&self) -> &[UserAnime] {
        &self.entries
    }

    #[must_use]
    pub fn with_status(&self, status: ListStatus) -> Vec<&UserAnime> {
        self.entries.iter().filter(|e| e.status() == status).collect()
    }

    #[must_use]
    pub fn watched(&self) -> Vec<&UserAnime> {
        self.with_status(ListStatus::Watched)
    }

    #[must_use]
    pub fn plan_to_watch(&self) -> Vec<&UserAnime> {
        self.with_status(ListStatus::PlanToWatch)
    }

    #[must_use]
    pub fn skipped(&self) -> &[TempDeletedAnime] {
        &self.skipped
    }

    #[must_use]
    pub fn catalog(&self) -> &[Anime] {
        &self.catalog
    }

    #[must_use]
    pub fn find(&self, mal_id: MalId) -> Option<&UserAnime> {
        self.entries.iter().find(|e| e.mal_id == Some(mal_id))
    }

    /// Catalog titles not yet on the list.
    #[must_use]
    pub fn addable(&self) -> Vec<&Anime> {
        self.catalog
            .iter()
            .filter(|a| a.mal_id.is_some_and(|id| self.find(id).is_none()))
            .collect()
    }

    pub async fn add(&mut self, mal_id: MalId, status: ListStatus) -> Result<&UserAnime> {
        let result = self.try_add(mal_id, status).await;
        let entry = report(&self.api, result, |_| format!("Added to {status}!"))?;
        self.entries.push(entry);
        self.entries
            .last()
            .ok_or_else(|| ClientError::NotFound(mal_id.to_string()))
    }

    async fn try_add(&self, mal_id: MalId, status: ListStatus) -> Result<UserAnime> {
        if self.find(mal_id).is_some() {
            return Err(ClientError::Conflict("Anime already in your list".to_string()));
        }
        let anime = self
            .catalog
            .iter()
            .find(|a| a.mal_id == Some(mal_id))
            .ok_or_else(|| ClientError::NotFound(format!("No catalog anime with MAL id {mal_id}")))?;
        self.api.add_anime(&NewUserAnime::from_anime(anime, status)).await
    }

    /// Moves the entry for `mal_id` to `status`. Local state only changes
    /// once the server accepted the update.
    pub async fn set_status(&mut self, mal_id: MalId, status: ListStatus) -> Result<()> {
        if self.find(mal_id).is_none() {
            return Err(ClientError::NotFound(format!("MAL id {mal_id} is not in your list")));
        }

        let result = self.api.update_anime_status(mal_id, status).await;
        report(&self.api, result, |_| "Status updated successfully!".to_string())?;

        if let Some(entry) = self.entries.iter_mut().find(|e| e.mal_id == Some(mal_id)) {
            entry.set_status(status);
        }
        Ok(())
    }

    pub async fn toggle_status(&mut self, mal_id: MalId) -> Result<ListStatus> {
        let status = self
            .find(mal_id)
            .map(|e| e.status().toggled())
            .ok_or_else(|| ClientError::NotFound(format!("MAL id {mal_id} is not in your list")))?;
        self.set_status(mal_id, status).await?;
        Ok(status)
    }

    /// Removes an entry by its list id.
    pub async fn remove(&mut self, entry_id: u64) -> Result<()> {
        let result = self.api.delete_anime(entry_id).await;
        report(&self.api, result, |_| "Anime deleted successfully!".to_string())?;
        self.entries.retain(|e| e.id != entry_id);
        Ok(())
    }

    /// Takes one title out of the skip history so it can be recommended again.
    pub async fn restore(&mut self, record_id: u64) -> Result<()> {
        let result = self.api.restore_temp_deleted(record_id).await;
        report(&self.api, result, |_| "Deleted anime removed from history".to_string())?;
        self.skipped.retain(|r| r.id != record_id);
        Ok(())
    }

    /// Empties the skip history. `false` when it was already empty.
    pub async fn clear_skipped(&mut self) -> Result<bool> {
        let result = self.api.clear_temp_deleted(self.user).await;
        let cleared = report(&self.api, result, |cleared| {
            if *cleared {
                "History cleared successfully".to_string()
            } else {
                "History was already empty".to_string()
            }
        })?;
        self.skipped.clear();
        Ok(cleared)
    }
}

/// Another user's list, read-only.
#[derive(Debug)]
pub struct PublicListView {
    pub profile: Profile,
    pub entries: Vec<UserAnime>,
}

impl PublicListView {
    pub async fn load(api: &ApiClient, user: UserId) -> Result<Self> {
        let (profile, entries) = tokio::try_join!(
            fetch("profile", api.profile(user)),
            fetch("anime list", api.user_anime(user)),
        )?;
        Ok(Self { profile, entries })
    }

    #[must_use]
    pub fn with_status(&self, status: ListStatus) -> Vec<&UserAnime> {
        self.entries.iter().filter(|e| e.status() == status).collect()
    }
}
