// src/telemetry.rs
//! Tracing subscriber setup and metric registration.

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_FORMAT: &str = "SCREENER_LOG_FORMAT";
const DEFAULT_FILTER: &str = "watchlist_screener=info,screen=info,watchlist=info,newsfeed=info,notify=info,warn";

/// Install the global subscriber. `RUST_LOG` wins over the default filter;
/// `SCREENER_LOG_FORMAT=json` switches to JSON lines. Calling twice is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact().with_target(true)).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// One-time metrics registration (so series show up in the exposition).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(describe_all);
}

fn describe_all() {
    describe_counter!("screen_terms_total", "Distinct query terms submitted.");
    describe_counter!("screen_queries_total", "Fuzzy lookups issued to the store.");
    describe_counter!("screen_hits_total", "Match hits returned by lookups.");
    describe_counter!("screen_store_errors_total", "Failed watchlist lookups.");
    describe_counter!("newsfeed_messages_total", "Newsfeed messages evaluated.");
    describe_counter!("newsfeed_failures_total", "Newsfeed messages that failed.");
    describe_counter!("newsfeed_matches_total", "Messages with a watchlist match.");
    describe_counter!("notify_failures_total", "Failed notification channel sends.");
    describe_histogram!("newsfeed_eval_ms", "Per-message evaluation time in milliseconds.");
}

/// Prometheus recorder; `render()` yields the text exposition.
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    pub fn install() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        describe_all();
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }
}
