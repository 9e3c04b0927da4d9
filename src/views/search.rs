use super::fetch;
use crate::clients::ApiClient;
use crate::error::Result;
use crate::models::{Anime, Genre, SearchSort};

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub text: String,
    pub sort: SearchSort,
    pub genre: Option<String>,
}

/// Catalog search with the genre picker.
#[derive(Debug)]
pub struct SearchView {
    api: ApiClient,
    genres: Vec<Genre>,
    results: Vec<Anime>,
}

impl SearchView {
    pub async fn load(api: &ApiClient) -> Result<Self> {
        let genres = fetch("genres", api.genres()).await?;
        Ok(Self {
            api: api.clone(),
            genres,
            results: Vec::new(),
        })
    }

    #[must_use]
    pub fn genres(&self) -> &[Genre] {
        &self.genres
    }

    #[must_use]
    pub fn results(&self) -> &[Anime] {
        &self.results
    }

    /// Runs a query. On failure the previous results stay in place.
    pub async fn search(&mut self, query: &SearchQuery) -> Result<&[Anime]> {
        let results = self
            .api
            .search_anime(query.text.trim(), query.sort, query.genre.as_deref())
            .await?;
        self.results = results;
        Ok(&self.results)
    }
}
