// src/notify/mod.rs
//! Notification gateway: match events and the channels that deliver them.

pub mod email;
pub mod slack;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use metrics::counter;
use serde::Serialize;

use crate::config::NotifyConfig;
use crate::extract::SentimentReport;
use crate::watchlist::MatchResultSet;

pub use email::EmailSender;
pub use slack::SlackNotifier;

pub const MATCH_SUBJECT: &str = "Watchlist Matched!";

/// Published when an article produced at least one watchlist hit.
#[derive(Debug, Clone, Serialize)]
pub struct MatchNotification {
    pub results: MatchResultSet,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentReport>,
}

impl MatchNotification {
    /// Distinct matched entities in first-seen order, for short summaries.
    pub fn entities(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for hit in &self.results {
            if !out.contains(&hit.entity.as_str()) {
                out.push(hit.entity.as_str());
            }
        }
        out
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, ev: &MatchNotification) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Writes the event to the log. Always succeeds.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, ev: &MatchNotification) -> Result<()> {
        tracing::info!(
            target: "notify",
            url = %ev.url,
            hits = ev.results.len(),
            entities = ?ev.entities(),
            sentiment = ev.sentiment.as_ref().map(|s| s.sentiment.as_str()).unwrap_or("-"),
            "{MATCH_SUBJECT}"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Fans an event out to every configured channel. A failing channel is logged
/// and counted; the send fails only if every channel failed.
#[derive(Default)]
pub struct NotifierMux {
    channels: Vec<Box<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, channel: Box<dyn Notifier>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn from_config(cfg: &NotifyConfig) -> Result<Self> {
        let mut mux = Self::new();
        if cfg.log {
            mux = mux.with(Box::new(LogNotifier));
        }
        if let Some(url) = &cfg.slack_webhook_url {
            mux = mux.with(Box::new(SlackNotifier::new(url.clone())));
        }
        if let Some(email) = &cfg.email {
            mux = mux.with(Box::new(EmailSender::from_config(email)?));
        }
        Ok(mux)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub async fn notify(&self, ev: &MatchNotification) -> Result<()> {
        if self.channels.is_empty() {
            tracing::debug!(target: "notify", "no notification channels configured");
            return Ok(());
        }
        let mut failed = 0usize;
        for ch in &self.channels {
            if let Err(e) = ch.send(ev).await {
                failed += 1;
                counter!("notify_failures_total", "channel" => ch.name()).increment(1);
                tracing::warn!(target: "notify", channel = ch.name(), error = ?e, "notification failed");
            }
        }
        if failed == self.channels.len() {
            return Err(anyhow!("all {failed} notification channels failed"));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for NotifierMux {
    async fn send(&self, ev: &MatchNotification) -> Result<()> {
        self.notify(ev).await
    }

    fn name(&self) -> &'static str {
        "mux"
    }
}
