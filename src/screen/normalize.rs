// src/screen/normalize.rs
//! Term normalizer: extraction items -> lower-cased query words.

use std::collections::HashSet;

use super::stopwords::StopWords;
use crate::extract::ExtractionItem;

/// Items scoring below this are never searched.
pub const DEFAULT_MIN_SCORE: f32 = 0.9;

/// A normalized, lower-cased word submitted to the store.
pub type QueryTerm = String;

/// [`normalize_with_threshold`] at [`DEFAULT_MIN_SCORE`].
pub fn normalize(items: &[ExtractionItem], stopwords: &StopWords) -> Vec<QueryTerm> {
    normalize_with_threshold(items, stopwords, DEFAULT_MIN_SCORE)
}

/// Keep items with `score >= min_score`, split their text on whitespace,
/// lower-case each word and drop stop-words. First-seen order; duplicates are
/// kept (dedup happens once entities and key phrases are combined).
pub fn normalize_with_threshold(
    items: &[ExtractionItem],
    stopwords: &StopWords,
    min_score: f32,
) -> Vec<QueryTerm> {
    items
        .iter()
        .filter(|it| it.score >= min_score)
        .flat_map(|it| it.text.split_whitespace())
        .map(str::to_lowercase)
        .filter(|w| !w.is_empty() && !stopwords.contains(w))
        .collect()
}

/// Drop repeated terms, keeping the first occurrence of each.
pub fn dedup_terms<I>(terms: I) -> Vec<QueryTerm>
where
    I: IntoIterator<Item = QueryTerm>,
{
    let mut seen: HashSet<QueryTerm> = HashSet::new();
    terms
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
