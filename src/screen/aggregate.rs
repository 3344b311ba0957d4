// src/screen/aggregate.rs
//! Match aggregator: normalized terms -> one fuzzy lookup per distinct term
//! -> flat result set.
//!
//! Queries run strictly one after another. The first failing term aborts the
//! whole call and no partial result is returned.

use metrics::counter;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::normalize::{dedup_terms, normalize_with_threshold, QueryTerm, DEFAULT_MIN_SCORE};
use super::stopwords::StopWords;
use crate::error::ScreenError;
use crate::extract::ExtractionItem;
use crate::telemetry::ensure_metrics_described;
use crate::watchlist::{build_query, MatchHit, MatchResultSet, WatchlistStore};

/// Hits for one ad-hoc keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordMatches {
    pub keyword: String,
    pub hits: Vec<MatchHit>,
}

/// Match entities and key phrases against the watchlist at the default
/// confidence threshold.
pub async fn match_watchlist<S>(
    entities: &[ExtractionItem],
    key_phrases: &[ExtractionItem],
    stopwords: &StopWords,
    store: &S,
) -> Result<MatchResultSet, ScreenError>
where
    S: WatchlistStore + ?Sized,
{
    match_watchlist_with(entities, key_phrases, stopwords, store, DEFAULT_MIN_SCORE).await
}

/// As [`match_watchlist`] with an explicit threshold in `[0, 1]`.
pub async fn match_watchlist_with<S>(
    entities: &[ExtractionItem],
    key_phrases: &[ExtractionItem],
    stopwords: &StopWords,
    store: &S,
    min_score: f32,
) -> Result<MatchResultSet, ScreenError>
where
    S: WatchlistStore + ?Sized,
{
    if !(0.0..=1.0).contains(&min_score) {
        return Err(ScreenError::ConfigurationMissing(format!(
            "score threshold {min_score} outside [0,1]"
        )));
    }

    debug!(target: "screen", "processing entities");
    let mut terms = normalize_with_threshold(entities, stopwords, min_score);
    debug!(target: "screen", "processing key phrases");
    terms.extend(normalize_with_threshold(key_phrases, stopwords, min_score));
    let terms = dedup_terms(terms);
    info!(target: "screen", terms = terms.len(), "collected query terms");

    let results = query_terms(&terms, store).await?;
    info!(target: "screen", matched = results.len(), "watchlist matching done");
    Ok(results)
}

/// One lookup per term, hits appended in term order then row order.
pub async fn query_terms<S>(terms: &[QueryTerm], store: &S) -> Result<MatchResultSet, ScreenError>
where
    S: WatchlistStore + ?Sized,
{
    ensure_metrics_described();
    counter!("screen_terms_total").increment(terms.len() as u64);

    let mut results = MatchResultSet::new();
    for term in terms {
        let hits = lookup(term, store).await?;
        if !hits.is_empty() {
            debug!(target: "screen", term = %term, hits = hits.len(), "term matched");
        }
        results.extend(hits);
    }

    counter!("screen_hits_total").increment(results.len() as u64);
    Ok(results)
}

/// Look up each keyword as given (no threshold, no splitting, no stop-words).
pub async fn check_keywords<S>(
    keywords: &[String],
    store: &S,
) -> Result<Vec<KeywordMatches>, ScreenError>
where
    S: WatchlistStore + ?Sized,
{
    ensure_metrics_described();
    let mut out = Vec::with_capacity(keywords.len());
    for kw in keywords {
        let hits = lookup(kw, store).await?;
        out.push(KeywordMatches {
            keyword: kw.clone(),
            hits,
        });
    }
    Ok(out)
}

async fn lookup<S>(term: &str, store: &S) -> Result<Vec<MatchHit>, ScreenError>
where
    S: WatchlistStore + ?Sized,
{
    let stmt = build_query(term);
    counter!("screen_queries_total").increment(1);
    let rows = match store.execute(&stmt).await {
        Ok(rows) => rows,
        Err(e) => {
            counter!("screen_store_errors_total").increment(1);
            warn!(target: "screen", store = store.name(), error = %e, "watchlist lookup failed");
            return Err(ScreenError::store(term, e));
        }
    };
    rows.iter()
        .map(|row| MatchHit::try_from(row.as_slice()))
        .collect()
}
