// src/watchlist/postgres.rs
//! PostgreSQL gateway over a `sqlx` pool.
//!
//! Statements use named parameters (`:entity`); they are rewritten to
//! positional `$n` placeholders before binding. A name used twice binds once.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as _, TypeInfo};
use tracing::debug;

use super::{Row, SqlValue, Statement, WatchlistStore};
use crate::error::StoreError;

/// Connection settings for [`PgWatchlistStore::connect`].
#[derive(Debug, Clone)]
pub struct PgSettings {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PgSettings {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

/// Created once at startup and shared; the pool does the connection reuse.
#[derive(Debug, Clone)]
pub struct PgWatchlistStore {
    pool: PgPool,
}

impl PgWatchlistStore {
    pub async fn connect(settings: &PgSettings) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(&settings.database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Rewrite `:name` placeholders to `$n`. Returns the new SQL and the
/// parameter names in positional order. Quoted literals, quoted identifiers
/// and `::` casts are left alone.
pub fn rewrite_named_params(sql: &str) -> (String, Vec<String>) {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut names: Vec<String> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                // copy through to the matching quote ('' / "" escapes included)
                out.push(c);
                i += 1;
                while i < chars.len() {
                    out.push(chars[i]);
                    if chars[i] == c {
                        if i + 1 < chars.len() && chars[i + 1] == c {
                            out.push(c);
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
            }
            ':' if i + 1 < chars.len() && chars[i + 1] == ':' => {
                out.push_str("::");
                i += 2;
            }
            ':' if i + 1 < chars.len()
                && (chars[i + 1].is_ascii_alphabetic() || chars[i + 1] == '_') =>
            {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_')
                {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                let pos = match names.iter().position(|n| *n == name) {
                    Some(p) => p,
                    None => {
                        names.push(name);
                        names.len() - 1
                    }
                };
                out.push('$');
                out.push_str(&(pos + 1).to_string());
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    (out, names)
}

fn bind_value<'q>(
    q: Query<'q, Postgres, PgArguments>,
    value: &SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Null => q.bind(Option::<String>::None),
        SqlValue::Text(s) => q.bind(s.clone()),
        SqlValue::Int(i) => q.bind(*i),
        SqlValue::Timestamp(ts) => q.bind(*ts),
    }
}

fn prepare<'q>(
    sql: &'q str,
    names: &[String],
    stmt: &Statement,
) -> Result<Query<'q, Postgres, PgArguments>, StoreError> {
    let mut q = sqlx::query(sql);
    for name in names {
        let value = stmt
            .param(name)
            .ok_or_else(|| StoreError::Unsupported(format!("unbound parameter :{name}")))?;
        q = bind_value(q, value);
    }
    Ok(q)
}

fn decode_row(row: &PgRow) -> Result<Row, StoreError> {
    let mut out = Vec::with_capacity(row.len());
    for (i, col) in row.columns().iter().enumerate() {
        let value = match col.type_info().name() {
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
                row.try_get::<Option<String>, _>(i)?.map(SqlValue::Text)
            }
            "INT8" => row.try_get::<Option<i64>, _>(i)?.map(SqlValue::Int),
            "INT4" => row
                .try_get::<Option<i32>, _>(i)?
                .map(|v| SqlValue::Int(v.into())),
            "INT2" => row
                .try_get::<Option<i16>, _>(i)?
                .map(|v| SqlValue::Int(v.into())),
            "TIMESTAMP" => row
                .try_get::<Option<NaiveDateTime>, _>(i)?
                .map(SqlValue::Timestamp),
            "TIMESTAMPTZ" => row
                .try_get::<Option<DateTime<Utc>>, _>(i)?
                .map(|v| SqlValue::Timestamp(v.naive_utc())),
            other => {
                return Err(StoreError::Unsupported(format!(
                    "column {} has unsupported type {other}",
                    col.name()
                )))
            }
        };
        out.push(value.unwrap_or(SqlValue::Null));
    }
    Ok(out)
}

#[async_trait]
impl WatchlistStore for PgWatchlistStore {
    async fn execute(&self, stmt: &Statement) -> Result<Vec<Row>, StoreError> {
        let (sql, names) = rewrite_named_params(&stmt.sql);
        debug!(target: "db", params = names.len(), "execute statement");
        let rows = prepare(&sql, &names, stmt)?.fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute_batch(&self, stmts: &[Statement]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for stmt in stmts {
            let (sql, names) = rewrite_named_params(&stmt.sql);
            prepare(&sql, &names, stmt)?.execute(&mut *tx).await?;
        }
        tx.commit().await?;
        debug!(target: "db", statements = stmts.len(), "batch committed");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watchlist::query::{FUZZY_LOOKUP_SQL, INSERT_SQL};

    #[test]
    fn repeated_name_binds_once() {
        let (sql, names) = rewrite_named_params(FUZZY_LOOKUP_SQL);
        assert_eq!(names, vec!["input_keyword".to_string()]);
        assert_eq!(sql.matches("$1").count(), 2);
        assert!(!sql.contains(":input_keyword"));
    }

    #[test]
    fn literals_and_casts_are_untouched() {
        let (sql, names) = rewrite_named_params(INSERT_SQL);
        assert_eq!(names, vec!["entity".to_string(), "entity_type".to_string()]);
        assert!(sql.contains("VALUES ($1, $2, timezone('UTC', now()))"));

        let (sql, names) =
            rewrite_named_params("SELECT ':not_a_param', x::text FROM t WHERE y = :y");
        assert_eq!(names, vec!["y".to_string()]);
        assert_eq!(sql, "SELECT ':not_a_param', x::text FROM t WHERE y = $1");
    }

    #[test]
    fn escaped_quotes_stay_inside_literal() {
        let (sql, names) = rewrite_named_params("SELECT 'it''s :x' WHERE a = :a");
        assert_eq!(names, vec!["a".to_string()]);
        assert_eq!(sql, "SELECT 'it''s :x' WHERE a = $1");
    }
}
