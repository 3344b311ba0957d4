// src/lib.rs
// Public library surface for the CLI and integration tests.

pub mod config;
pub mod error;
pub mod extract;
pub mod newsfeed;
pub mod notify;
pub mod screen;
pub mod telemetry;
pub mod watchlist;

// ---- Re-exports for stable public API ----
pub use crate::config::ScreenerConfig;
pub use crate::error::{ScreenError, StoreError};
pub use crate::extract::{ExtractionItem, ExtractionOracle, FixedOracle, HttpOracle};
pub use crate::newsfeed::{evaluate_batch, evaluate_message, BatchSummary, EvalContext, NewsfeedMessage, QueueRecord};
pub use crate::notify::{MatchNotification, Notifier, NotifierMux};
pub use crate::screen::{check_keywords, match_watchlist, Screener, StopWords};
pub use crate::watchlist::{MatchHit, MatchResultSet, MemoryWatchlist, PgWatchlistStore, WatchlistStore};
