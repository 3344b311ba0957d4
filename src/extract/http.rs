// src/extract/http.rs
//! Oracle reached over HTTP. Each detection is a JSON POST of
//! `{"Text", "LanguageCode"}` to `{endpoint}/entities`, `/key-phrases` or
//! `/sentiment`; responses use the oracle's own field names.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::{
    limited_text, parse_entities, parse_key_phrases, parse_sentiment, ExtractionItem,
    ExtractionOracle, SentimentReport, TEXT_LIMIT_BYTES,
};

#[derive(Serialize)]
struct DetectReq<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
    #[serde(rename = "LanguageCode")]
    language_code: &'a str,
}

#[derive(Clone)]
pub struct HttpOracle {
    http: Client,
    endpoint: String,
    language: String,
}

impl HttpOracle {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("watchlist-screener/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .context("building oracle http client")?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            language: "en".to_string(),
        })
    }

    pub fn with_language(mut self, code: impl Into<String>) -> Self {
        self.language = code.into();
        self
    }

    async fn detect(&self, path: &str, text: &str) -> Result<Value> {
        let url = format!("{}/{}", self.endpoint, path);
        let req = DetectReq {
            text: limited_text(text, TEXT_LIMIT_BYTES),
            language_code: &self.language,
        };
        let body = self
            .http
            .post(&url)
            .json(&req)
            .send()
            .await
            .with_context(|| format!("oracle POST {path}"))?
            .error_for_status()
            .with_context(|| format!("oracle {path} non-2xx"))?
            .json::<Value>()
            .await
            .with_context(|| format!("oracle {path} response body"))?;
        Ok(body)
    }
}

#[async_trait]
impl ExtractionOracle for HttpOracle {
    async fn detect_entities(&self, text: &str) -> Result<Vec<ExtractionItem>> {
        let v = self.detect("entities", text).await?;
        Ok(parse_entities(&v)?)
    }

    async fn detect_key_phrases(&self, text: &str) -> Result<Vec<ExtractionItem>> {
        let v = self.detect("key-phrases", text).await?;
        Ok(parse_key_phrases(&v)?)
    }

    async fn detect_sentiment(&self, text: &str) -> Result<SentimentReport> {
        let v = self.detect("sentiment", text).await?;
        Ok(parse_sentiment(&v)?)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
