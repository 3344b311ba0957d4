// tests/refresh_watchlist.rs
mod common;

use std::fs;

use common::sample_entries;
use watchlist_screener::screen::{match_watchlist, StopWords};
use watchlist_screener::watchlist::refresh::{refresh, WatchlistEntry, WatchlistSource};
use watchlist_screener::watchlist::MemoryWatchlist;
use watchlist_screener::ExtractionItem;

#[tokio::test]
async fn inline_refresh_creates_table_and_counts() {
    let store = MemoryWatchlist::new();
    let outcome = refresh(WatchlistSource::Inline(sample_entries()), &store)
        .await
        .unwrap();

    assert_eq!(outcome.count, 4);
    assert_eq!(outcome.source, "inline");
    assert!(outcome.refreshed_at.starts_with("WL_"));
    assert_eq!(store.records().len(), 4);

    // Lookups work once the extension is enabled by the refresh.
    let hits = match_watchlist(
        &[ExtractionItem::new("Skywalker", 0.99)],
        &[],
        &StopWords::english(),
        &store,
    )
    .await
    .unwrap();
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn refresh_replaces_previous_rows() {
    let store = MemoryWatchlist::new();
    refresh(WatchlistSource::Inline(sample_entries()), &store)
        .await
        .unwrap();
    let outcome = refresh(
        WatchlistSource::Inline(vec![WatchlistEntry::new("Droid", "product")]),
        &store,
    )
    .await
    .unwrap();
    assert_eq!(outcome.count, 1);
    assert_eq!(store.records()[0].entity, "Droid");
}

#[tokio::test]
async fn csv_file_source() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("watchlist.csv");
    fs::write(
        &p,
        "entity,entity_type\nLuke Skywalker,person\n\"Jedi Global Financial\",organization\n ,person\n",
    )
    .unwrap();

    let store = MemoryWatchlist::new();
    let outcome = refresh(WatchlistSource::File(p.clone()), &store)
        .await
        .unwrap();
    assert_eq!(outcome.count, 2);
    assert_eq!(outcome.source, p.display().to_string());
}

#[tokio::test]
async fn toml_file_source() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("watchlist.toml");
    fs::write(
        &p,
        r#"
[[watchlist]]
entity = "Droid"
entity_type = "product"

[[watchlist]]
entity = "Skywalker"
entity_type = "person"
"#,
    )
    .unwrap();
    let store = MemoryWatchlist::new();
    assert_eq!(refresh(WatchlistSource::File(p), &store).await.unwrap().count, 2);
}

#[tokio::test]
async fn duplicate_key_fails_and_keeps_old_table() {
    let store = MemoryWatchlist::seeded(vec![WatchlistEntry::new("Droid", "product")]);
    let dupes = vec![
        WatchlistEntry::new("Skywalker", "person"),
        WatchlistEntry::new("Skywalker", "person"),
    ];

    let err = refresh(WatchlistSource::Inline(dupes), &store)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("constraint"));

    let rows = store.records();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].entity, "Droid");
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let store = MemoryWatchlist::new();
    let res = refresh(
        WatchlistSource::File("/nonexistent/watchlist.csv".into()),
        &store,
    )
    .await;
    assert!(res.is_err());
    assert!(store.records().is_empty());
}
