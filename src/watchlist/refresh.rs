// src/watchlist/refresh.rs
//! Bulk reload of the watchlist table.
//!
//! Input comes inline or from a local file (JSON array, TOML `[[watchlist]]`
//! tables, or a two-column CSV with a header row). The table is recreated,
//! the fuzzy-match extension enabled, the old rows truncated and the new ones
//! inserted, all as one batch. The final row count is read back.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::query::{count_query, insert_entry, recreate_statements};
use super::WatchlistStore;
use crate::error::ScreenError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub entity: String,
    pub entity_type: String,
}

impl WatchlistEntry {
    pub fn new(entity: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            entity_type: entity_type.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum WatchlistSource {
    Inline(Vec<WatchlistEntry>),
    File(PathBuf),
}

impl WatchlistSource {
    fn label(&self) -> String {
        match self {
            Self::Inline(_) => "inline".to_string(),
            Self::File(p) => p.display().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    pub source: String,
    /// `WL_<utc timestamp>` label of this reload.
    pub refreshed_at: String,
    pub count: i64,
}

/// Load entries from a file, picking the format from the extension
/// (falls back to sniffing the content).
pub fn load_watchlist_file(path: &Path) -> Result<Vec<WatchlistEntry>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading watchlist from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_watchlist(&content, ext.as_str())
}

fn parse_watchlist(s: &str, hint_ext: &str) -> Result<Vec<WatchlistEntry>> {
    let parsed = match hint_ext {
        "json" => parse_json(s),
        "toml" => parse_toml(s),
        "csv" => parse_csv(s),
        _ => parse_json(s)
            .or_else(|_| parse_toml(s))
            .or_else(|_| parse_csv(s)),
    }?;
    Ok(clean_entries(parsed))
}

fn parse_json(s: &str) -> Result<Vec<WatchlistEntry>> {
    Ok(serde_json::from_str(s)?)
}

fn parse_toml(s: &str) -> Result<Vec<WatchlistEntry>> {
    #[derive(Deserialize)]
    struct TomlWl {
        watchlist: Vec<WatchlistEntry>,
    }
    let v: TomlWl = toml::from_str(s)?;
    Ok(v.watchlist)
}

/// First record is a header and is skipped. Cells may be double-quoted;
/// quoted cells may contain commas, `""` escapes and line breaks.
fn parse_csv(s: &str) -> Result<Vec<WatchlistEntry>> {
    let mut out = Vec::new();
    for (recno, cells) in csv_records(s).into_iter().enumerate().skip(1) {
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        if cells.len() < 2 {
            return Err(anyhow!("csv record {}: expected 2 columns", recno + 1));
        }
        out.push(WatchlistEntry::new(cells[0].clone(), cells[1].clone()));
    }
    Ok(out)
}

fn csv_records(s: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut cells = Vec::new();
    let mut cur = String::new();
    let mut quoted = false;
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                cur.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => cells.push(std::mem::take(&mut cur)),
            '\r' if !quoted && chars.peek() == Some(&'\n') => {}
            '\n' if !quoted => {
                cells.push(std::mem::take(&mut cur));
                records.push(std::mem::take(&mut cells));
            }
            _ => cur.push(c),
        }
    }
    if !cur.is_empty() || !cells.is_empty() {
        cells.push(cur);
        records.push(cells);
    }
    records
}

fn clean_entries(items: Vec<WatchlistEntry>) -> Vec<WatchlistEntry> {
    items
        .into_iter()
        .filter_map(|e| {
            let entity = e.entity.trim();
            let entity_type = e.entity_type.trim();
            if entity.is_empty() || entity_type.is_empty() {
                warn!(target: "watchlist", "skipping watchlist entry with empty field");
                return None;
            }
            Some(WatchlistEntry::new(entity, entity_type))
        })
        .collect()
}

/// Rebuild the watchlist table from `source` and report the resulting count.
pub async fn refresh<S>(source: WatchlistSource, store: &S) -> Result<RefreshOutcome>
where
    S: WatchlistStore + ?Sized,
{
    let label = format!("WL_{}", Utc::now().format("%Y-%m-%dT%H:%M:%S"));
    let source_label = source.label();
    info!(target: "watchlist", refresh = %label, source = %source_label, "refreshing watchlist");

    let entries = match source {
        WatchlistSource::Inline(v) => clean_entries(v),
        WatchlistSource::File(p) => load_watchlist_file(&p)?,
    };

    let mut batch = recreate_statements();
    batch.extend(entries.iter().map(insert_entry));
    store
        .execute_batch(&batch)
        .await
        .map_err(|e| ScreenError::store("refresh", e))?;

    let rows = store
        .execute(&count_query())
        .await
        .map_err(|e| ScreenError::store("count", e))?;
    let count = rows
        .first()
        .and_then(|r| r.first())
        .and_then(|v| v.as_int())
        .ok_or_else(|| ScreenError::UnexpectedRow("count(*) returned no integer".into()))?;

    info!(target: "watchlist", refresh = %label, count, "watchlist refreshed");
    Ok(RefreshOutcome {
        source: source_label,
        refreshed_at: label,
        count,
    })
}
