use anyhow::{Context, Result};
use reqwest::Client;

use super::{MatchNotification, Notifier, MATCH_SUBJECT};

pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
}

impl SlackNotifier {
    pub fn new(url: String) -> Self {
        Self {
            webhook_url: url,
            client: Client::new(),
        }
    }
}

/// Plain-text message body: subject, source URL, matched entities, sentiment.
pub(crate) fn render_text(ev: &MatchNotification) -> String {
    let entities = ev.entities().join(", ");
    let sentiment = ev
        .sentiment
        .as_ref()
        .map(|s| s.sentiment.as_str())
        .unwrap_or("n/a");
    format!(
        "*{MATCH_SUBJECT}* {} hit(s): {}\nSource: {}\nSentiment: {}",
        ev.results.len(),
        entities,
        ev.url,
        sentiment
    )
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, ev: &MatchNotification) -> Result<()> {
        let body = serde_json::json!({ "text": render_text(ev) });

        self.client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .context("slack post")?
            .error_for_status()
            .context("slack non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}
