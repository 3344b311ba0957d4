// src/error.rs
//! Failure kinds surfaced by the matching engine and the watchlist gateway.
//!
//! The engine never recovers locally: every failure is returned to the caller,
//! which decides how to report it (log line, CLI exit code, skipped record).

use thiserror::Error;

/// Errors raised by a [`crate::watchlist::WatchlistStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store does not know how to run this statement.
    #[error("unsupported statement: {0}")]
    Unsupported(String),

    /// Uniqueness or other integrity rule violated.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// Store reachable in principle but not usable right now (missing table,
    /// lock poisoned, injected failure in tests).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the screening core.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// Oracle output lacks an expected field or carries an invalid value.
    #[error("extraction output malformed: {0}")]
    ExtractionMalformed(String),

    /// A gateway call failed. `context` names the term or step that issued it.
    #[error("watchlist query failed ({context}): {source}")]
    StoreQueryFailed {
        context: String,
        #[source]
        source: StoreError,
    },

    /// A precondition (stop-words, threshold, connection settings) is missing
    /// or invalid. Raised before any store call is made.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    /// The store returned a row that is not `{entity, entity_type, created_at}`.
    #[error("unexpected watchlist row: {0}")]
    UnexpectedRow(String),
}

impl ScreenError {
    pub fn store(context: impl Into<String>, source: StoreError) -> Self {
        Self::StoreQueryFailed {
            context: context.into(),
            source,
        }
    }

    /// Short stable label, used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ExtractionMalformed(_) => "extraction_malformed",
            Self::StoreQueryFailed { .. } => "store_query_failed",
            Self::ConfigurationMissing(_) => "configuration_missing",
            Self::UnexpectedRow(_) => "unexpected_row",
        }
    }
}
