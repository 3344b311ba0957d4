// src/watchlist/memory.rs
//! In-process watchlist table.
//!
//! Understands exactly the statements produced by [`super::query`] and
//! evaluates the fuzzy lookup with [`super::fuzzy`]. Anything else is
//! rejected, the same way a database rejects SQL it cannot run.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use super::fuzzy::fuzzy_match;
use super::query::{
    COUNT_SQL, CREATE_EXTENSION_SQL, CREATE_TABLE_SQL, FUZZY_LOOKUP_SQL, INSERT_SQL,
    KEYWORD_PARAM, TRUNCATE_SQL,
};
use super::refresh::WatchlistEntry;
use super::{Row, SqlValue, Statement, WatchlistRecord, WatchlistStore};
use crate::error::StoreError;

#[derive(Debug, Clone, Default)]
struct TableState {
    /// `None` until the table is created.
    rows: Option<Vec<WatchlistRecord>>,
    fuzzy_enabled: bool,
}

#[derive(Debug, Default)]
pub struct MemoryWatchlist {
    state: RwLock<TableState>,
}

impl MemoryWatchlist {
    /// Empty store: no table, no extension. Run a refresh before querying.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with the table and extension in place, loaded with `entries`.
    /// Duplicate keys are skipped.
    pub fn seeded<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = WatchlistEntry>,
    {
        let now = Utc::now().naive_utc();
        let mut rows: Vec<WatchlistRecord> = Vec::new();
        for e in entries {
            if rows
                .iter()
                .any(|r| r.entity == e.entity && r.entity_type == e.entity_type)
            {
                continue;
            }
            rows.push(WatchlistRecord {
                entity: e.entity,
                entity_type: e.entity_type,
                created_at: now,
            });
        }
        Self {
            state: RwLock::new(TableState {
                rows: Some(rows),
                fuzzy_enabled: true,
            }),
        }
    }

    /// Snapshot of the current table contents (empty if no table).
    pub fn records(&self) -> Vec<WatchlistRecord> {
        self.state
            .read()
            .map(|s| s.rows.clone().unwrap_or_default())
            .unwrap_or_default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("watchlist lock poisoned".into())
}

fn table_mut(state: &mut TableState) -> Result<&mut Vec<WatchlistRecord>, StoreError> {
    state
        .rows
        .as_mut()
        .ok_or_else(|| StoreError::Unavailable("relation \"watchlist\" does not exist".into()))
}

fn required_text<'a>(stmt: &'a Statement, name: &str) -> Result<&'a str, StoreError> {
    stmt.text_param(name)
        .ok_or_else(|| StoreError::Unsupported(format!("missing text parameter :{name}")))
}

fn lookup(state: &TableState, stmt: &Statement) -> Result<Vec<Row>, StoreError> {
    if !state.fuzzy_enabled {
        return Err(StoreError::Unavailable(
            "function soundex(text) does not exist".into(),
        ));
    }
    let rows = state
        .rows
        .as_ref()
        .ok_or_else(|| StoreError::Unavailable("relation \"watchlist\" does not exist".into()))?;
    let term = required_text(stmt, KEYWORD_PARAM)?;

    // UNION: each record at most once, in table order.
    Ok(rows
        .iter()
        .filter(|r| fuzzy_match(&r.entity, term))
        .map(Row::from)
        .collect())
}

/// Apply one mutating or reading statement to `state`.
fn apply(state: &mut TableState, stmt: &Statement) -> Result<Vec<Row>, StoreError> {
    match stmt.sql.as_str() {
        FUZZY_LOOKUP_SQL => lookup(state, stmt),
        CREATE_TABLE_SQL => {
            state.rows.get_or_insert_with(Vec::new);
            Ok(Vec::new())
        }
        CREATE_EXTENSION_SQL => {
            state.fuzzy_enabled = true;
            Ok(Vec::new())
        }
        TRUNCATE_SQL => {
            table_mut(state)?.clear();
            Ok(Vec::new())
        }
        INSERT_SQL => {
            let entity = required_text(stmt, "entity")?.to_string();
            let entity_type = required_text(stmt, "entity_type")?.to_string();
            let rows = table_mut(state)?;
            if rows
                .iter()
                .any(|r| r.entity == entity && r.entity_type == entity_type)
            {
                return Err(StoreError::Constraint(format!(
                    "duplicate key (entity, entity_type)=({entity}, {entity_type})"
                )));
            }
            rows.push(WatchlistRecord {
                entity,
                entity_type,
                created_at: Utc::now().naive_utc(),
            });
            Ok(Vec::new())
        }
        COUNT_SQL => {
            let n = table_mut(state)?.len() as i64;
            Ok(vec![vec![SqlValue::Int(n)]])
        }
        other => Err(StoreError::Unsupported(other.to_string())),
    }
}

#[async_trait]
impl WatchlistStore for MemoryWatchlist {
    async fn execute(&self, stmt: &Statement) -> Result<Vec<Row>, StoreError> {
        if stmt.sql == FUZZY_LOOKUP_SQL || stmt.sql == COUNT_SQL {
            let guard = self.state.read().map_err(|_| poisoned())?;
            if stmt.sql == COUNT_SQL {
                let n = guard.rows.as_ref().map(Vec::len).ok_or_else(|| {
                    StoreError::Unavailable("relation \"watchlist\" does not exist".into())
                })?;
                return Ok(vec![vec![SqlValue::Int(n as i64)]]);
            }
            return lookup(&guard, stmt);
        }
        let mut guard = self.state.write().map_err(|_| poisoned())?;
        apply(&mut guard, stmt)
    }

    /// All-or-nothing: statements run against a copy that replaces the table
    /// only when every statement succeeded.
    async fn execute_batch(&self, stmts: &[Statement]) -> Result<(), StoreError> {
        let mut guard = self.state.write().map_err(|_| poisoned())?;
        let mut scratch = guard.clone();
        for stmt in stmts {
            apply(&mut scratch, stmt)?;
        }
        *guard = scratch;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
