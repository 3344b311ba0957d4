// src/watchlist/query.rs
//! Statement builders for the watchlist table.
//!
//! The fuzzy lookup is the UNION of two independent strategies:
//! phonetic equality (`soundex`) and a bounded edit distance
//! (`levenshtein_less_equal`, at most [`MAX_EDIT_DISTANCE`]). Both compare
//! lower-cased values inside SQL; the bound term itself is passed through
//! untouched. Both functions come from PostgreSQL's `fuzzystrmatch`.

use super::{SqlValue, Statement};
use crate::watchlist::refresh::WatchlistEntry;

/// Name of the bound parameter carrying the query term.
pub const KEYWORD_PARAM: &str = "input_keyword";

/// Edit-distance bound of the Levenshtein branch.
pub const MAX_EDIT_DISTANCE: usize = 2;

pub const FUZZY_LOOKUP_SQL: &str = "SELECT entity, entity_type, created_at FROM watchlist \
     WHERE soundex(lower(entity)) = soundex(lower(:input_keyword)) \
     UNION \
     SELECT entity, entity_type, created_at FROM watchlist \
     WHERE levenshtein_less_equal(lower(entity), lower(:input_keyword), 2) <= 2";

pub const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS watchlist (\
     entity varchar(255), \
     entity_type varchar(255), \
     created_at timestamp, \
     PRIMARY KEY (entity, entity_type))";

pub const CREATE_EXTENSION_SQL: &str = "CREATE EXTENSION IF NOT EXISTS fuzzystrmatch";

pub const TRUNCATE_SQL: &str = "TRUNCATE TABLE watchlist";

pub const INSERT_SQL: &str = "INSERT INTO watchlist (entity, entity_type, created_at) \
     VALUES (:entity, :entity_type, timezone('UTC', now()))";

pub const COUNT_SQL: &str = "SELECT count(*) FROM watchlist";

/// Fuzzy lookup for one term. Pure construction; the term is bound, never
/// interpolated.
pub fn build_query(term: &str) -> Statement {
    Statement::new(FUZZY_LOOKUP_SQL).bind(KEYWORD_PARAM, SqlValue::text(term))
}

pub fn insert_entry(entry: &WatchlistEntry) -> Statement {
    Statement::new(INSERT_SQL)
        .bind("entity", SqlValue::text(entry.entity.as_str()))
        .bind("entity_type", SqlValue::text(entry.entity_type.as_str()))
}

/// Statements that rebuild the table from scratch: DDL, extension, truncate.
pub fn recreate_statements() -> Vec<Statement> {
    vec![
        Statement::new(CREATE_TABLE_SQL),
        Statement::new(CREATE_EXTENSION_SQL),
        Statement::new(TRUNCATE_SQL),
    ]
}

pub fn count_query() -> Statement {
    Statement::new(COUNT_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_is_bound_unmodified() {
        let st = build_query("Skywlker");
        assert_eq!(st.text_param(KEYWORD_PARAM), Some("Skywlker"));
        assert_eq!(st.params.len(), 1);
    }

    #[test]
    fn term_never_appears_in_sql_text() {
        let hostile = "x'); DROP TABLE watchlist; --";
        let st = build_query(hostile);
        assert!(!st.sql.contains(hostile));
        assert_eq!(st.sql, FUZZY_LOOKUP_SQL);
        assert_eq!(st.text_param(KEYWORD_PARAM), Some(hostile));
    }

    #[test]
    fn lookup_is_union_of_both_strategies() {
        let sql = build_query("jedi").sql;
        assert!(sql.contains("soundex(lower(entity)) = soundex(lower(:input_keyword))"));
        assert!(sql.contains("levenshtein_less_equal(lower(entity), lower(:input_keyword), 2) <= 2"));
        assert_eq!(sql.matches("UNION").count(), 1);
    }

    #[test]
    fn insert_binds_both_key_columns() {
        let st = insert_entry(&WatchlistEntry::new("Droid", "product"));
        assert_eq!(st.text_param("entity"), Some("Droid"));
        assert_eq!(st.text_param("entity_type"), Some("product"));
    }
}
