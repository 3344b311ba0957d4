// src/newsfeed.rs
//! Newsfeed evaluation: extraction, watchlist matching and notification for
//! queued articles.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use metrics::{counter, histogram};
use serde::{Deserialize, Deserializer, Serialize};

use crate::extract::{limited_text, ExtractionItem, ExtractionOracle, SentimentReport, TEXT_LIMIT_BYTES};
use crate::notify::{MatchNotification, Notifier};
use crate::screen::Screener;
use crate::telemetry::ensure_metrics_described;
use crate::watchlist::{MatchResultSet, WatchlistStore};

/// Accepts `true`/`false` as booleans or as the strings `"true"`/`"false"`.
fn flag<'de, D>(de: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }
    Ok(match Raw::deserialize(de)? {
        Raw::Bool(b) => b,
        Raw::Text(s) => s.trim().eq_ignore_ascii_case("true"),
    })
}

fn yes() -> bool {
    true
}

/// Which extractions to request for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    #[serde(default = "yes", deserialize_with = "flag")]
    pub extract_entities: bool,
    #[serde(default, deserialize_with = "flag")]
    pub extract_keyphrase: bool,
    #[serde(default = "yes", deserialize_with = "flag")]
    pub extract_sentiment: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            extract_entities: true,
            extract_keyphrase: false,
            extract_sentiment: true,
        }
    }
}

/// Body of a queued newsfeed message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsfeedMessage {
    pub url: String,
    pub content: String,
    #[serde(default)]
    pub options: ExtractOptions,
    /// Object key the article was stored under, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
}

/// Queue envelope: an id and a JSON-encoded `NewsfeedMessage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueRecord {
    #[serde(rename = "messageId")]
    pub message_id: String,
    pub body: String,
}

impl QueueRecord {
    pub fn message(&self) -> Result<NewsfeedMessage> {
        serde_json::from_str(&self.body)
            .with_context(|| format!("decoding body of message {}", self.message_id))
    }
}

/// Parse a batch: either a `{"Records": [...]}` envelope or a bare array of
/// queue records.
pub fn parse_records(raw: &str) -> Result<Vec<QueueRecord>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Batch {
        Envelope {
            #[serde(rename = "Records")]
            records: Vec<QueueRecord>,
        },
        Bare(Vec<QueueRecord>),
    }
    let batch: Batch = serde_json::from_str(raw).context("parsing newsfeed records")?;
    Ok(match batch {
        Batch::Envelope { records } => records,
        Batch::Bare(v) => v,
    })
}

pub fn load_records(path: &Path) -> Result<Vec<QueueRecord>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_records(&raw)
}

/// Collaborators for one evaluation run.
pub struct EvalContext<'a, S> {
    pub oracle: &'a dyn ExtractionOracle,
    pub screener: &'a Screener<S>,
    pub notifier: &'a dyn Notifier,
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub url: String,
    pub entities: Vec<ExtractionItem>,
    pub key_phrases: Vec<ExtractionItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentReport>,
    pub results: MatchResultSet,
    pub notified: bool,
}

impl Evaluation {
    pub fn matched(&self) -> bool {
        !self.results.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub matched: usize,
    pub failed: usize,
}

/// Run the enabled extractions, match against the watchlist and publish a
/// notification when anything matched. A failed publish is logged and leaves
/// `notified` false; the evaluation itself still succeeds.
pub async fn evaluate_message<S>(msg: &NewsfeedMessage, ctx: &EvalContext<'_, S>) -> Result<Evaluation>
where
    S: WatchlistStore,
{
    ensure_metrics_described();
    let text = limited_text(&msg.content, TEXT_LIMIT_BYTES);
    let opts = msg.options;

    let entities = if opts.extract_entities {
        tracing::debug!(target: "newsfeed", oracle = ctx.oracle.name(), "extracting entities");
        ctx.oracle
            .detect_entities(text)
            .await
            .context("entity extraction")?
    } else {
        Vec::new()
    };
    let key_phrases = if opts.extract_keyphrase {
        tracing::debug!(target: "newsfeed", oracle = ctx.oracle.name(), "extracting key phrases");
        ctx.oracle
            .detect_key_phrases(text)
            .await
            .context("key phrase extraction")?
    } else {
        Vec::new()
    };
    let sentiment = if opts.extract_sentiment {
        Some(
            ctx.oracle
                .detect_sentiment(text)
                .await
                .context("sentiment extraction")?,
        )
    } else {
        None
    };

    let results = ctx
        .screener
        .screen(&entities, &key_phrases)
        .await
        .context("watchlist match")?;

    let mut notified = false;
    if !results.is_empty() {
        counter!("newsfeed_matches_total").increment(1);
        tracing::info!(target: "newsfeed", url = %msg.url, hits = results.len(), "match found");
        let ev = MatchNotification {
            results: results.clone(),
            url: msg.url.clone(),
            sentiment: sentiment.clone(),
        };
        match ctx.notifier.send(&ev).await {
            Ok(()) => notified = true,
            Err(e) => {
                tracing::error!(target: "newsfeed", url = %msg.url, error = ?e, "publishing match failed");
            }
        }
    }

    Ok(Evaluation {
        url: msg.url.clone(),
        entities,
        key_phrases,
        sentiment,
        results,
        notified,
    })
}

/// Evaluate every record. A failing record is logged and counted; the rest
/// of the batch still runs.
pub async fn evaluate_batch<S>(records: &[QueueRecord], ctx: &EvalContext<'_, S>) -> BatchSummary
where
    S: WatchlistStore,
{
    ensure_metrics_described();
    let mut summary = BatchSummary::default();

    for rec in records {
        let t0 = Instant::now();
        counter!("newsfeed_messages_total").increment(1);
        summary.processed += 1;

        let outcome = match rec.message() {
            Ok(msg) => {
                tracing::info!(
                    target: "newsfeed",
                    message_id = %rec.message_id,
                    file = msg.file.as_deref().unwrap_or("-"),
                    "processing message"
                );
                evaluate_message(&msg, ctx).await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(eval) => {
                if eval.matched() {
                    summary.matched += 1;
                }
            }
            Err(e) => {
                summary.failed += 1;
                counter!("newsfeed_failures_total").increment(1);
                tracing::error!(target: "newsfeed", message_id = %rec.message_id, error = ?e, "message evaluation failed");
            }
        }
        histogram!("newsfeed_eval_ms").record(t0.elapsed().as_secs_f64() * 1000.0);
    }

    tracing::info!(
        target: "newsfeed",
        processed = summary.processed,
        matched = summary.matched,
        failed = summary.failed,
        "batch done"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_accept_strings_and_bools() {
        let o: ExtractOptions = serde_json::from_str(
            r#"{"extract_entities": "true", "extract_keyphrase": true, "extract_sentiment": "false"}"#,
        )
        .unwrap();
        assert!(o.extract_entities);
        assert!(o.extract_keyphrase);
        assert!(!o.extract_sentiment);
    }

    #[test]
    fn missing_options_use_defaults() {
        let m: NewsfeedMessage =
            serde_json::from_str(r#"{"url": "https://news.invalid/1", "content": "text"}"#).unwrap();
        assert_eq!(m.options, ExtractOptions::default());
        assert!(!m.options.extract_keyphrase);

        let partial: ExtractOptions = serde_json::from_str(r#"{"extract_keyphrase": "true"}"#).unwrap();
        assert!(partial.extract_entities && partial.extract_keyphrase && partial.extract_sentiment);
    }

    #[test]
    fn queue_record_body_is_decoded() {
        let rec: QueueRecord = serde_json::from_str(
            r#"{"messageId": "m-1", "body": "{\"url\":\"u\",\"content\":\"c\",\"file\":\"f.txt\"}"}"#,
        )
        .unwrap();
        let msg = rec.message().unwrap();
        assert_eq!(msg.file.as_deref(), Some("f.txt"));

        let bad = QueueRecord {
            message_id: "m-2".into(),
            body: "not json".into(),
        };
        assert!(bad.message().is_err());
    }

    #[test]
    fn records_with_or_without_envelope() {
        let one = r#"{"messageId": "a", "body": "{}"}"#;
        assert_eq!(parse_records(&format!(r#"{{"Records": [{one}]}}"#)).unwrap().len(), 1);
        assert_eq!(parse_records(&format!("[{one}, {one}]")).unwrap().len(), 2);
        assert!(parse_records("{}").is_err());
    }
}
