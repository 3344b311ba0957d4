// tests/matching_scenarios.rs
mod common;

use common::{item, sample_watchlist, RecordingStore};
use watchlist_screener::error::{ScreenError, StoreError};
use watchlist_screener::screen::{match_watchlist, match_watchlist_with, Screener, StopWords};

#[tokio::test]
async fn multi_word_entity_is_queried_word_by_word() {
    let store = RecordingStore::new(sample_watchlist());
    let entities = vec![item("Luke Skywalker", 0.99)];

    let hits = match_watchlist(&entities, &[], &StopWords::english(), &store)
        .await
        .unwrap();

    assert_eq!(store.queried(), vec!["luke", "skywalker"]);
    let names: Vec<_> = hits.iter().map(|h| h.entity.as_str()).collect();
    assert_eq!(names, vec!["Skywalker"]);
    assert_eq!(hits[0].entity_type, "person");
}

#[tokio::test]
async fn below_threshold_makes_no_store_calls() {
    let store = RecordingStore::new(sample_watchlist());
    let entities = vec![item("Skywalker", 0.89), item("Droid", 0.5)];
    let phrases = vec![item("Jedi Global Financial", 0.899)];

    let hits = match_watchlist(&entities, &phrases, &StopWords::english(), &store)
        .await
        .unwrap();

    assert!(hits.is_empty());
    assert!(store.queried().is_empty());
}

#[tokio::test]
async fn threshold_is_inclusive() {
    let store = RecordingStore::new(sample_watchlist());
    let hits = match_watchlist(&[item("Droid", 0.9)], &[], &StopWords::none(), &store)
        .await
        .unwrap();
    assert_eq!(store.queried(), vec!["droid"]);
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn misspelling_hits_within_edit_distance() {
    let store = RecordingStore::new(sample_watchlist());
    let hits = match_watchlist(&[item("Skywlker", 0.95)], &[], &StopWords::english(), &store)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entity, "Skywalker");

    // Different soundex code (D620 vs D630), one edit away.
    let hits = match_watchlist(&[item("droix", 0.95)], &[], &StopWords::english(), &store)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entity, "Droid");
}

#[tokio::test]
async fn duplicate_terms_are_queried_once() {
    let store = RecordingStore::new(sample_watchlist());
    let entities = vec![item("jedi", 0.95), item("Jedi", 0.97)];
    let phrases = vec![item("droid", 0.95)];

    match_watchlist(&entities, &phrases, &StopWords::english(), &store)
        .await
        .unwrap();

    assert_eq!(store.queried(), vec!["jedi", "droid"]);
}

#[tokio::test]
async fn stopwords_are_not_queried() {
    let store = RecordingStore::new(sample_watchlist());
    let phrases = vec![item("The Droid of the Rebels", 0.95)];

    match_watchlist(&[], &phrases, &StopWords::english(), &store)
        .await
        .unwrap();

    assert_eq!(store.queried(), vec!["droid", "rebels"]);
}

#[tokio::test]
async fn bound_term_is_passed_unmodified() {
    let store = RecordingStore::new(sample_watchlist());
    match_watchlist(&[item("O'Brien%_", 0.95)], &[], &StopWords::none(), &store)
        .await
        .unwrap();
    assert_eq!(store.queried(), vec!["o'brien%_"]);
}

#[tokio::test]
async fn repeated_calls_return_the_same_hits() {
    let store = RecordingStore::new(sample_watchlist());
    let entities = vec![item("Luke Skywalker", 0.99), item("Droid", 0.93)];

    let first = match_watchlist(&entities, &[], &StopWords::english(), &store)
        .await
        .unwrap();
    let second = match_watchlist(&entities, &[], &StopWords::english(), &store)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn store_failure_aborts_the_whole_call() {
    let store = RecordingStore::failing_on(sample_watchlist(), "skywalker");
    let entities = vec![item("Luke Skywalker", 0.99), item("Droid", 0.99)];

    let err = match_watchlist(&entities, &[], &StopWords::english(), &store)
        .await
        .unwrap_err();

    match err {
        ScreenError::StoreQueryFailed { context, source } => {
            assert_eq!(context, "skywalker");
            assert!(matches!(source, StoreError::Unavailable(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // "droid" comes after the failing term and is never issued.
    assert_eq!(store.queried(), vec!["luke", "skywalker"]);
}

#[tokio::test]
async fn invalid_threshold_is_rejected_before_querying() {
    let store = RecordingStore::new(sample_watchlist());
    let err = match_watchlist_with(&[item("Droid", 1.0)], &[], &StopWords::none(), &store, 1.2)
        .await
        .unwrap_err();
    assert!(matches!(err, ScreenError::ConfigurationMissing(_)));
    assert!(store.queried().is_empty());
}

#[tokio::test]
async fn screener_applies_its_threshold() {
    let screener = Screener::new(RecordingStore::new(sample_watchlist()), StopWords::english())
        .with_min_score(0.5);
    let hits = screener.screen(&[item("Droid", 0.6)], &[]).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(screener.store().queried(), vec!["droid"]);
}
