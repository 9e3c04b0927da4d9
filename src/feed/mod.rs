//! Random recommendations drawn from the catalog.
//!
//! The candidate set is the filtered catalog minus everything the user has
//! listed or skipped, keyed by MAL id. A fresh candidate is drawn after every
//! mutation.

mod filter;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use std::collections::HashSet;
use tracing::debug;

pub use filter::FeedFilter;

use crate::models::{Anime, MalId, Quote};

pub const QUOTE_COUNT: usize = 4;

#[derive(Debug)]
pub struct RecommendationFeed {
    catalog: Vec<Anime>,
    filter: FeedFilter,
    listed: HashSet<MalId>,
    skipped: HashSet<MalId>,
    current: Option<usize>,
    rng: StdRng,
}

impl RecommendationFeed {
    pub fn new(
        catalog: Vec<Anime>,
        listed: impl IntoIterator<Item = MalId>,
        skipped: impl IntoIterator<Item = MalId>,
        filter: FeedFilter,
    ) -> Self {
        Self::with_rng(catalog, listed, skipped, filter, StdRng::from_os_rng())
    }

    pub fn with_rng(
        catalog: Vec<Anime>,
        listed: impl IntoIterator<Item = MalId>,
        skipped: impl IntoIterator<Item = MalId>,
        filter: FeedFilter,
        rng: StdRng,
    ) -> Self {
        let mut feed = Self {
            catalog,
            filter,
            listed: listed.into_iter().collect(),
            skipped: skipped.into_iter().collect(),
            current: None,
            rng,
        };
        feed.draw();
        feed
    }

    fn is_candidate(&self, anime: &Anime) -> bool {
        // Titles without a MAL id cannot be listed or skipped, so never offer them.
        let Some(mal_id) = anime.mal_id else {
            return false;
        };
        self.filter.matches(anime) && !self.listed.contains(&mal_id) && !self.skipped.contains(&mal_id)
    }

    fn candidate_indices(&self) -> Vec<usize> {
        self.catalog
            .iter()
            .enumerate()
            .filter(|(_, anime)| self.is_candidate(anime))
            .map(|(i, _)| i)
            .collect()
    }

    #[must_use]
    pub fn candidates(&self) -> Vec<&Anime> {
        self.catalog.iter().filter(|a| self.is_candidate(a)).collect()
    }

    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.catalog.iter().filter(|a| self.is_candidate(a)).count()
    }

    #[must_use]
    pub fn current(&self) -> Option<&Anime> {
        self.current.map(|i| &self.catalog[i])
    }

    /// Picks a new current candidate uniformly at random.
    pub fn draw(&mut self) -> Option<&Anime> {
        let indices = self.candidate_indices();
        self.current = indices.choose(&mut self.rng).copied();
        debug!(candidates = indices.len(), current = ?self.current, "Feed redrawn");
        self.current()
    }

    #[must_use]
    pub fn catalog(&self) -> &[Anime] {
        &self.catalog
    }

    #[must_use]
    pub fn filter(&self) -> &FeedFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: FeedFilter) -> Option<&Anime> {
        self.filter = filter;
        self.draw()
    }

    #[must_use]
    pub fn is_listed(&self, mal_id: MalId) -> bool {
        self.listed.contains(&mal_id)
    }

    #[must_use]
    pub fn is_skipped(&self, mal_id: MalId) -> bool {
        self.skipped.contains(&mal_id)
    }

    pub fn record_listed(&mut self, mal_id: MalId) -> Option<&Anime> {
        self.listed.insert(mal_id);
        self.draw()
    }

    pub fn record_skip(&mut self, mal_id: MalId) -> Option<&Anime> {
        self.skipped.insert(mal_id);
        self.draw()
    }

    /// Makes a title eligible again after its list entry or skip was removed.
    pub fn release(&mut self, mal_id: MalId) {
        self.listed.remove(&mal_id);
        self.skipped.remove(&mal_id);
        if self.current.is_none() {
            self.draw();
        }
    }
}

/// Up to `count` distinct quotes in random order.
pub fn random_quotes<R: rand::Rng + ?Sized>(quotes: &[Quote], count: usize, rng: &mut R) -> Vec<Quote> {
    quotes.choose_multiple(rng, count).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(n: i64) -> Vec<Anime> {
        (1..=n)
            .map(|i| Anime {
                id: i as u64,
                title: format!("Anime {i}"),
                mal_id: Some(MalId(i * 100)),
                genres: Vec::new(),
                score: Some(i as f32),
                episodes: Some(12),
                year: Some(2020),
                image_url: None,
                synopsis: None,
                trailer_url: None,
            })
            .collect()
    }

    fn feed(listed: Vec<MalId>, filter: FeedFilter) -> RecommendationFeed {
        RecommendationFeed::with_rng(catalog(5), listed, Vec::new(), filter, StdRng::seed_from_u64(42))
    }

    #[test]
    fn test_skip_shrinks_candidates_and_never_returns() {
        let mut feed = feed(Vec::new(), FeedFilter::new(0.0, Vec::new()));
        assert_eq!(feed.candidate_count(), 5);

        let skipped = feed.current().and_then(|a| a.mal_id).unwrap();
        feed.record_skip(skipped);
        assert_eq!(feed.candidate_count(), 4);

        for _ in 0..50 {
            let drawn = feed.draw().and_then(|a| a.mal_id).unwrap();
            assert_ne!(drawn, skipped);
        }
    }

    #[test]
    fn test_candidates_exclude_list_and_filter() {
        let feed = feed(vec![MalId(500)], FeedFilter::new(3.0, Vec::new()));
        let ids: Vec<MalId> = feed.candidates().iter().filter_map(|a| a.mal_id).collect();
        assert_eq!(ids, vec![MalId(300), MalId(400)]);
        assert!(feed.is_listed(MalId(500)));
    }

    #[test]
    fn test_exhausted_feed_has_no_current() {
        let mut feed = feed(Vec::new(), FeedFilter::new(0.0, Vec::new()));
        for i in 1..=5 {
            feed.record_listed(MalId(i * 100));
        }
        assert!(feed.current().is_none());
        assert!(feed.draw().is_none());

        feed.release(MalId(300));
        assert_eq!(feed.current().and_then(|a| a.mal_id), Some(MalId(300)));
    }

    #[test]
    fn test_filter_change_redraws_within_new_set() {
        let mut feed = feed(Vec::new(), FeedFilter::new(0.0, Vec::new()));
        let current = feed.set_filter(FeedFilter::new(5.0, Vec::new())).unwrap();
        assert_eq!(current.mal_id, Some(MalId(500)));
    }

    #[test]
    fn test_catalog_entries_without_mal_id_are_skipped() {
        let mut items = catalog(2);
        items[0].mal_id = None;
        let feed = RecommendationFeed::with_rng(
            items,
            Vec::new(),
            Vec::new(),
            FeedFilter::new(0.0, Vec::new()),
            StdRng::seed_from_u64(1),
        );
        assert_eq!(feed.candidate_count(), 1);
    }

    #[test]
    fn test_random_quotes_are_distinct_and_capped() {
        let quotes: Vec<Quote> = (0..10)
            .map(|i| Quote {
                id: i,
                anime: "Gintama".to_string(),
                character: "Gintoki".to_string(),
                quote: format!("line {i}"),
            })
            .collect();
        let mut rng = StdRng::seed_from_u64(3);

        let picked = random_quotes(&quotes, QUOTE_COUNT, &mut rng);
        assert_eq!(picked.len(), 4);
        let ids: HashSet<u64> = picked.iter().map(|q| q.id).collect();
        assert_eq!(ids.len(), 4);

        assert_eq!(random_quotes(&quotes[..2], QUOTE_COUNT, &mut rng).len(), 2);
    }
}
