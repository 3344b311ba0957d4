// src/watchlist/mod.rs
//! Watchlist store gateway: statement/row types, the async store trait and
//! the record shapes the matching engine reads.
//!
//! Statements carry named parameters (`:input_keyword`). Values are never
//! spliced into SQL text; each backend binds them its own way.

pub mod fuzzy;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod refresh;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{ScreenError, StoreError};

pub use memory::MemoryWatchlist;
pub use postgres::PgWatchlistStore;
pub use query::build_query;

/// A single typed column value, as exchanged with the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Text(String),
    Int(i64),
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

pub type Row = Vec<SqlValue>;

/// SQL text plus named parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: BTreeMap<String, SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn bind(mut self, name: &str, value: SqlValue) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    pub fn param(&self, name: &str) -> Option<&SqlValue> {
        self.params.get(name)
    }

    pub fn text_param(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(SqlValue::as_text)
    }
}

/// One row of the watchlist table, keyed by `(entity, entity_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistRecord {
    pub entity: String,
    pub entity_type: String,
    pub created_at: NaiveDateTime,
}

/// A watchlist record found for one query term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchHit {
    pub entity: String,
    pub entity_type: String,
    pub created_at: NaiveDateTime,
}

/// Hits in term order, then in the order the store returned rows.
pub type MatchResultSet = Vec<MatchHit>;

impl From<WatchlistRecord> for MatchHit {
    fn from(r: WatchlistRecord) -> Self {
        Self {
            entity: r.entity,
            entity_type: r.entity_type,
            created_at: r.created_at,
        }
    }
}

impl From<&WatchlistRecord> for Row {
    fn from(r: &WatchlistRecord) -> Self {
        vec![
            SqlValue::Text(r.entity.clone()),
            SqlValue::Text(r.entity_type.clone()),
            SqlValue::Timestamp(r.created_at),
        ]
    }
}

impl TryFrom<&[SqlValue]> for MatchHit {
    type Error = ScreenError;

    fn try_from(row: &[SqlValue]) -> Result<Self, Self::Error> {
        match row {
            [SqlValue::Text(entity), SqlValue::Text(entity_type), SqlValue::Timestamp(ts), ..] => {
                Ok(Self {
                    entity: entity.clone(),
                    entity_type: entity_type.clone(),
                    created_at: *ts,
                })
            }
            other => Err(ScreenError::UnexpectedRow(format!("{other:?}"))),
        }
    }
}

/// Gateway to the relational store holding the watchlist table.
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Run one statement and return its rows (empty for non-queries).
    async fn execute(&self, stmt: &Statement) -> Result<Vec<Row>, StoreError>;

    /// Run statements as one unit. The default runs them one after another
    /// and stops at the first failure; backends with transactions override it.
    async fn execute_batch(&self, stmts: &[Statement]) -> Result<(), StoreError> {
        for stmt in stmts {
            self.execute(stmt).await?;
        }
        Ok(())
    }

    /// Backend name for diagnostics.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<T: WatchlistStore + ?Sized> WatchlistStore for Arc<T> {
    async fn execute(&self, stmt: &Statement) -> Result<Vec<Row>, StoreError> {
        (**self).execute(stmt).await
    }

    async fn execute_batch(&self, stmts: &[Statement]) -> Result<(), StoreError> {
        (**self).execute_batch(stmts).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
