use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use super::{fetch, report, signed_in};
use crate::clients::ApiClient;
use crate::error::{ClientError, Result};
use crate::feed::{FeedFilter, QUOTE_COUNT, RecommendationFeed, random_quotes};
use crate::models::{
    Anime, ListStatus, NewTempDeleted, NewUserAnime, Profile, Quote, TempDeletedAnime, UserAnime,
};

/// The swipe screen: one random candidate at a time.
#[derive(Debug)]
pub struct DiscoveryView {
    api: ApiClient,
    feed: RecommendationFeed,
    profile: Profile,
    quotes: Vec<Quote>,
}

impl DiscoveryView {
    pub async fn load(api: &ApiClient, filter: FeedFilter) -> Result<Self> {
        Self::load_with_rng(api, filter, StdRng::from_os_rng()).await
    }

    pub async fn load_with_rng(api: &ApiClient, filter: FeedFilter, mut rng: StdRng) -> Result<Self> {
        let me = signed_in(api)?;

        let (catalog, list, profile, skipped, quotes) = tokio::try_join!(
            fetch("anime catalog", api.all_anime()),
            fetch("your anime list", api.my_anime()),
            fetch("your profile", api.profile(me.id)),
            fetch("skipped anime", api.temp_deleted()),
            fetch("quotes", api.quotes()),
        )?;

        let quotes = random_quotes(&quotes, QUOTE_COUNT, &mut rng);
        let feed = RecommendationFeed::with_rng(
            catalog,
            list.iter().filter_map(|entry| entry.mal_id),
            skipped.iter().filter_map(|record| record.mal_id),
            filter,
            rng,
        );
        info!(candidates = feed.candidate_count(), "Discovery loaded");

        Ok(Self {
            api: api.clone(),
            feed,
            profile,
            quotes,
        })
    }

    #[must_use]
    pub fn current(&self) -> Option<&Anime> {
        self.feed.current()
    }

    #[must_use]
    pub fn feed(&self) -> &RecommendationFeed {
        &self.feed
    }

    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    #[must_use]
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn set_filter(&mut self, filter: FeedFilter) -> Option<&Anime> {
        self.feed.set_filter(filter)
    }

    pub fn next(&mut self) -> Option<&Anime> {
        self.feed.draw()
    }

    /// Adds the current candidate to the list with the given disposition.
    pub async fn like(&mut self, status: ListStatus) -> Result<UserAnime> {
        let anime = self.current_candidate()?;
        let result = self.add(&anime, status).await;
        let entry = report(&self.api, result, |_| format!("Added to {status}!"))?;

        if let Some(mal_id) = anime.mal_id {
            self.feed.record_listed(mal_id);
        }
        Ok(entry)
    }

    async fn add(&self, anime: &Anime, status: ListStatus) -> Result<UserAnime> {
        if anime.mal_id.is_some_and(|id| self.feed.is_listed(id)) {
            return Err(ClientError::Conflict(
                "Anime already exists in your list.".to_string(),
            ));
        }
        self.api
            .add_anime(&NewUserAnime::from_anime(anime, status))
            .await
    }

    /// Records the current candidate as seen-and-rejected.
    pub async fn skip(&mut self) -> Result<TempDeletedAnime> {
        let anime = self.current_candidate()?;
        let result = self.api.add_temp_deleted(&NewTempDeleted::from(&anime)).await;
        let record = report(&self.api, result, |_| "Anime skipped".to_string())?;

        if let Some(mal_id) = anime.mal_id {
            self.feed.record_skip(mal_id);
        }
        Ok(record)
    }

    fn current_candidate(&self) -> Result<Anime> {
        self.feed
            .current()
            .cloned()
            .ok_or_else(|| ClientError::NotFound("No more anime match your filters".to_string()))
    }
}
