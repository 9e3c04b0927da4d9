use crate::config::FeedConfig;
use crate::models::Anime;

/// Score floor plus an optional genre whitelist.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedFilter {
    pub min_score: f32,
    /// Empty means every genre passes.
    pub genres: Vec<String>,
}

impl Default for FeedFilter {
    fn default() -> Self {
        Self {
            min_score: 3.0,
            genres: Vec::new(),
        }
    }
}

impl From<&FeedConfig> for FeedFilter {
    fn from(config: &FeedConfig) -> Self {
        Self {
            min_score: config.min_score,
            genres: config.genres.clone(),
        }
    }
}

impl FeedFilter {
    #[must_use]
    pub fn new(min_score: f32, genres: Vec<String>) -> Self {
        Self { min_score, genres }
    }

    /// Score at or above the floor (unscored counts as 0), and at least one
    /// selected genre when any are selected.
    #[must_use]
    pub fn matches(&self, anime: &Anime) -> bool {
        let score = anime.score.unwrap_or(0.0);
        if score < self.min_score {
            return false;
        }
        self.genres.is_empty() || self.genres.iter().any(|g| anime.has_genre(g))
    }
}
