// src/extract/mod.rs
//! NLP extraction oracle: item/report types, parsing of oracle JSON and the
//! provider abstraction.
//!
//! The oracle itself is external. Its output shape is fixed:
//! `{"Entities": [{"Text", "Score", "Type"}]}`, `{"KeyPhrases": [{"Text", "Score"}]}`,
//! `{"Sentiment": "...", "SentimentScore": {...}}`.

pub mod http;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ScreenError;

pub use http::HttpOracle;

/// Oracle calls reject text of this many UTF-8 bytes or more.
pub const TEXT_LIMIT_BYTES: usize = 5000;

/// One entity or key-phrase candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionItem {
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Score")]
    pub score: f32,
    /// Entity category (PERSON, ORGANIZATION, ...). Absent for key phrases.
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ExtractionItem {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            score,
            kind: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    #[serde(rename = "Positive")]
    pub positive: f32,
    #[serde(rename = "Negative")]
    pub negative: f32,
    #[serde(rename = "Neutral")]
    pub neutral: f32,
    #[serde(rename = "Mixed")]
    pub mixed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    /// POSITIVE | NEGATIVE | NEUTRAL | MIXED
    #[serde(rename = "Sentiment")]
    pub sentiment: String,
    #[serde(rename = "SentimentScore", default)]
    pub scores: SentimentScores,
}

fn parse_items(v: &Value, field: &str) -> Result<Vec<ExtractionItem>, ScreenError> {
    let raw = v
        .get(field)
        .ok_or_else(|| ScreenError::ExtractionMalformed(format!("missing field `{field}`")))?;
    let items: Vec<ExtractionItem> = serde_json::from_value(raw.clone())
        .map_err(|e| ScreenError::ExtractionMalformed(format!("`{field}`: {e}")))?;

    if let Some(bad) = items
        .iter()
        .find(|it| !it.score.is_finite() || !(0.0..=1.0).contains(&it.score))
    {
        return Err(ScreenError::ExtractionMalformed(format!(
            "`{field}`: score {} out of [0,1]",
            bad.score
        )));
    }
    Ok(items)
}

/// Parse an entity detection response.
pub fn parse_entities(v: &Value) -> Result<Vec<ExtractionItem>, ScreenError> {
    parse_items(v, "Entities")
}

/// Parse a key-phrase detection response.
pub fn parse_key_phrases(v: &Value) -> Result<Vec<ExtractionItem>, ScreenError> {
    parse_items(v, "KeyPhrases")
}

pub fn parse_sentiment(v: &Value) -> Result<SentimentReport, ScreenError> {
    if v.get("Sentiment").is_none() {
        return Err(ScreenError::ExtractionMalformed(
            "missing field `Sentiment`".into(),
        ));
    }
    serde_json::from_value(v.clone())
        .map_err(|e| ScreenError::ExtractionMalformed(format!("sentiment: {e}")))
}

/// Longest prefix of `input` shorter than `size` bytes, cut on a char
/// boundary. Input already shorter than `size` is returned whole.
pub fn limited_text(input: &str, size: usize) -> &str {
    if input.len() < size {
        return input;
    }
    let mut end = 0;
    for (idx, ch) in input.char_indices() {
        let next = idx + ch.len_utf8();
        if next >= size {
            break;
        }
        end = next;
    }
    &input[..end]
}

/// Entity / key-phrase / sentiment provider.
#[async_trait]
pub trait ExtractionOracle: Send + Sync {
    async fn detect_entities(&self, text: &str) -> Result<Vec<ExtractionItem>>;
    async fn detect_key_phrases(&self, text: &str) -> Result<Vec<ExtractionItem>>;
    async fn detect_sentiment(&self, text: &str) -> Result<SentimentReport>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Returns the same canned reports for every text. Used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct FixedOracle {
    pub entities: Vec<ExtractionItem>,
    pub key_phrases: Vec<ExtractionItem>,
    pub sentiment: Option<SentimentReport>,
}

impl FixedOracle {
    pub fn with_entities(entities: Vec<ExtractionItem>) -> Self {
        Self {
            entities,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ExtractionOracle for FixedOracle {
    async fn detect_entities(&self, _text: &str) -> Result<Vec<ExtractionItem>> {
        Ok(self.entities.clone())
    }

    async fn detect_key_phrases(&self, _text: &str) -> Result<Vec<ExtractionItem>> {
        Ok(self.key_phrases.clone())
    }

    async fn detect_sentiment(&self, _text: &str) -> Result<SentimentReport> {
        Ok(self.sentiment.clone().unwrap_or_else(|| SentimentReport {
            sentiment: "NEUTRAL".to_string(),
            scores: SentimentScores {
                neutral: 1.0,
                ..SentimentScores::default()
            },
        }))
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}
