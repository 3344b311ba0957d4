// tests/keyword_check.rs
mod common;

use common::{sample_watchlist, RecordingStore};
use watchlist_screener::config::ScreenerConfig;
use watchlist_screener::error::ScreenError;
use watchlist_screener::screen::{check_keywords, Screener, StopWords};
use watchlist_screener::watchlist::MemoryWatchlist;

#[tokio::test]
async fn keywords_are_looked_up_as_given() {
    let store = RecordingStore::new(sample_watchlist());
    let keywords = vec!["Luke Skywalker".to_string(), "the".to_string()];

    let out = check_keywords(&keywords, &store).await.unwrap();

    // No splitting, no stop-word filtering, no lower-casing of the bound term.
    assert_eq!(store.queried(), vec!["Luke Skywalker", "the"]);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].keyword, "Luke Skywalker");
    let names: Vec<_> = out[0].hits.iter().map(|h| h.entity.as_str()).collect();
    assert_eq!(names, vec!["Luke Skywalker"]);
    assert!(out[1].hits.is_empty());
}

#[tokio::test]
async fn misses_are_reported_per_keyword() {
    let screener = Screener::new(sample_watchlist(), StopWords::english());
    let out = screener
        .check(&["DROID".to_string(), "zzzzzzzz".to_string()])
        .await
        .unwrap();
    assert_eq!(out[0].hits.len(), 1);
    assert!(out[1].hits.is_empty());
}

#[tokio::test]
async fn empty_store_without_table_fails() {
    let store = MemoryWatchlist::new();
    let err = check_keywords(&["droid".to_string()], &store)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "store_query_failed");
}

#[tokio::test]
async fn failure_stops_remaining_keywords() {
    let store = RecordingStore::failing_on(sample_watchlist(), "b");
    let kws: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let err = check_keywords(&kws, &store).await.unwrap_err();
    assert!(matches!(err, ScreenError::StoreQueryFailed { .. }));
    assert_eq!(store.queried(), vec!["a", "b"]);
}

#[tokio::test]
async fn check_does_not_depend_on_stopword_config() {
    let cfg = ScreenerConfig {
        stopwords_path: Some("/nonexistent/stopwords.json".into()),
        ..ScreenerConfig::default()
    };
    assert!(cfg.stopwords().is_err());

    let out = check_keywords(&["the".to_string(), "droid".to_string()], &sample_watchlist())
        .await
        .unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].hits[0].entity, "Droid");
}
