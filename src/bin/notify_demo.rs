//! Sends one sample watchlist match through the configured channels
//! (log only when Slack and SMTP are not configured).

use chrono::Utc;
use watchlist_screener::config::ScreenerConfig;
use watchlist_screener::extract::{SentimentReport, SentimentScores};
use watchlist_screener::telemetry::init_tracing;
use watchlist_screener::{MatchHit, MatchNotification, NotifierMux};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let cfg = ScreenerConfig::load_default()?;
    let mux = NotifierMux::from_config(&cfg.notify)?;

    let ev = MatchNotification {
        results: vec![MatchHit {
            entity: "Skywalker".into(),
            entity_type: "person".into(),
            created_at: Utc::now().naive_utc(),
        }],
        url: "https://news.example.com/demo".into(),
        sentiment: Some(SentimentReport {
            sentiment: "NEGATIVE".into(),
            scores: SentimentScores {
                negative: 0.91,
                neutral: 0.07,
                positive: 0.01,
                mixed: 0.01,
            },
        }),
    };
    mux.notify(&ev).await?;

    println!("notify-demo done ({} channels)", mux.len());
    Ok(())
}
