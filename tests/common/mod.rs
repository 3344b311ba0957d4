// tests/common/mod.rs
// Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use watchlist_screener::error::StoreError;
use watchlist_screener::extract::ExtractionItem;
use watchlist_screener::watchlist::query::KEYWORD_PARAM;
use watchlist_screener::watchlist::refresh::WatchlistEntry;
use watchlist_screener::watchlist::{MemoryWatchlist, Row, Statement, WatchlistStore};

pub fn sample_entries() -> Vec<WatchlistEntry> {
    vec![
        WatchlistEntry::new("Skywalker", "person"),
        WatchlistEntry::new("Luke Skywalker", "person"),
        WatchlistEntry::new("Jedi Global Financial", "organization"),
        WatchlistEntry::new("Droid", "product"),
    ]
}

pub fn sample_watchlist() -> MemoryWatchlist {
    MemoryWatchlist::seeded(sample_entries())
}

pub fn item(text: &str, score: f32) -> ExtractionItem {
    ExtractionItem::new(text, score)
}

/// Wraps a memory store and records every bound lookup term, in order.
/// Lookups for `fail_on` are rejected.
pub struct RecordingStore {
    inner: MemoryWatchlist,
    pub terms: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingStore {
    pub fn new(inner: MemoryWatchlist) -> Self {
        Self {
            inner,
            terms: Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    pub fn failing_on(inner: MemoryWatchlist, term: &str) -> Self {
        Self {
            fail_on: Some(term.to_string()),
            ..Self::new(inner)
        }
    }

    pub fn queried(&self) -> Vec<String> {
        self.terms.lock().unwrap().clone()
    }
}

#[async_trait]
impl WatchlistStore for RecordingStore {
    async fn execute(&self, stmt: &Statement) -> Result<Vec<Row>, StoreError> {
        if let Some(term) = stmt.text_param(KEYWORD_PARAM) {
            self.terms.lock().unwrap().push(term.to_string());
            if self.fail_on.as_deref() == Some(term) {
                return Err(StoreError::Unavailable(format!("injected failure for {term}")));
            }
        }
        self.inner.execute(stmt).await
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
