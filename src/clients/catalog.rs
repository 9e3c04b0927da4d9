//! Read-only catalog endpoints.

use super::api::ApiClient;
use crate::error::Result;
use crate::models::{Anime, Genre, Quote, SearchSort};

impl ApiClient {
    pub async fn all_anime(&self) -> Result<Vec<Anime>> {
        self.get("anime/all/").await
    }

    pub async fn genres(&self) -> Result<Vec<Genre>> {
        self.get("anime/genres/").await
    }

    pub async fn quotes(&self) -> Result<Vec<Quote>> {
        self.get("anime/quotes/").await
    }

    pub async fn search_anime(
        &self,
        query: &str,
        sort: SearchSort,
        genre: Option<&str>,
    ) -> Result<Vec<Anime>> {
        let mut params = vec![("q", query), ("sort", sort.as_str())];
        if let Some(genre) = genre.filter(|g| !g.is_empty()) {
            params.push(("genre", genre));
        }
        self.get_query("anime/search", &params).await
    }
}
