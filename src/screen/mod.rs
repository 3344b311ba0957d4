// src/screen/mod.rs
//! Matching engine: term normalizer, fuzzy lookups and result aggregation.

pub mod aggregate;
pub mod normalize;
pub mod stopwords;

pub use aggregate::{check_keywords, match_watchlist, match_watchlist_with, KeywordMatches};
pub use normalize::{dedup_terms, normalize, normalize_with_threshold, QueryTerm, DEFAULT_MIN_SCORE};
pub use stopwords::StopWords;

use crate::error::ScreenError;
use crate::extract::ExtractionItem;
use crate::watchlist::{MatchResultSet, WatchlistStore};

/// Store, stop-words and threshold bundled once at startup and shared by
/// every invocation.
#[derive(Debug, Clone)]
pub struct Screener<S> {
    store: S,
    stopwords: StopWords,
    min_score: f32,
}

impl<S: WatchlistStore> Screener<S> {
    pub fn new(store: S, stopwords: StopWords) -> Self {
        Self {
            store,
            stopwords,
            min_score: DEFAULT_MIN_SCORE,
        }
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn stopwords(&self) -> &StopWords {
        &self.stopwords
    }

    pub fn min_score(&self) -> f32 {
        self.min_score
    }

    pub async fn screen(
        &self,
        entities: &[ExtractionItem],
        key_phrases: &[ExtractionItem],
    ) -> Result<MatchResultSet, ScreenError> {
        match_watchlist_with(
            entities,
            key_phrases,
            &self.stopwords,
            &self.store,
            self.min_score,
        )
        .await
    }

    pub async fn check(&self, keywords: &[String]) -> Result<Vec<KeywordMatches>, ScreenError> {
        check_keywords(keywords, &self.store).await
    }
}
