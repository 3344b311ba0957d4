//! Watchlist screener CLI.
//! Evaluates newsfeed batches, runs ad-hoc keyword checks and reloads the
//! watchlist table.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use watchlist_screener::config::ScreenerConfig;
use watchlist_screener::extract::{ExtractionOracle, FixedOracle, HttpOracle};
use watchlist_screener::newsfeed::{evaluate_batch, load_records, EvalContext};
use watchlist_screener::notify::NotifierMux;
use watchlist_screener::screen::{check_keywords, Screener};
use watchlist_screener::telemetry::{init_tracing, Metrics};
use watchlist_screener::watchlist::postgres::PgSettings;
use watchlist_screener::watchlist::refresh::{refresh, WatchlistSource};
use watchlist_screener::watchlist::PgWatchlistStore;

const ENV_METRICS_DUMP: &str = "SCREENER_METRICS_DUMP";

#[derive(Parser)]
#[clap(name = "watchlist-screener", about = "Screen newsfeed articles against a watchlist")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a batch of queued newsfeed records
    Screen {
        /// JSON file with `{"Records": [...]}` or a bare array of records
        #[clap(required = true)]
        records: PathBuf,
    },

    /// Look up keywords in the watchlist as given
    Check {
        /// Keywords to look up
        #[clap(required = true, num_args = 1..)]
        keywords: Vec<String>,
    },

    /// Recreate the watchlist table from a file
    Refresh {
        /// Watchlist file (CSV, JSON or TOML); defaults to the configured path
        #[clap(short, long)]
        file: Option<PathBuf>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serialize output")?);
    Ok(())
}

fn build_oracle(cfg: &ScreenerConfig) -> Result<Box<dyn ExtractionOracle>> {
    match &cfg.oracle_url {
        Some(url) => Ok(Box::new(HttpOracle::new(url.clone())?)),
        None => {
            warn!("no extraction oracle configured; using an empty fixed oracle");
            Ok(Box::new(FixedOracle::default()))
        }
    }
}

async fn connect(cfg: &ScreenerConfig) -> Result<PgWatchlistStore> {
    let mut settings = PgSettings::new(cfg.database_url()?);
    settings.max_connections = cfg.max_connections;
    PgWatchlistStore::connect(&settings)
        .await
        .context("connecting to watchlist database")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();
    let metrics = Metrics::install()?;

    let cli = Cli::parse();
    let cfg = ScreenerConfig::load_default()?;
    let store = connect(&cfg).await?;

    match cli.command {
        Commands::Screen { records } => {
            let batch = load_records(&records)?;
            let screener = Screener::new(store, cfg.stopwords()?).with_min_score(cfg.min_score()?);
            let oracle = build_oracle(&cfg)?;
            let notifier = NotifierMux::from_config(&cfg.notify)?;
            let ctx = EvalContext {
                oracle: oracle.as_ref(),
                screener: &screener,
                notifier: &notifier,
            };
            let summary = evaluate_batch(&batch, &ctx).await;
            info!("Processed {} records.", summary.processed);
            print_json(&summary)?;
        }
        Commands::Check { keywords } => {
            let matches = check_keywords(&keywords, &store).await?;
            print_json(&matches)?;
        }
        Commands::Refresh { file } => {
            let path = match file {
                Some(p) => p,
                None => cfg.watchlist_path()?.to_path_buf(),
            };
            let outcome = refresh(WatchlistSource::File(path), &store).await?;
            print_json(&outcome)?;
        }
    }

    if std::env::var(ENV_METRICS_DUMP).is_ok_and(|v| v == "1") {
        info!(target: "metrics", "\n{}", metrics.render());
    }
    Ok(())
}
