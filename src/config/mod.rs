// src/config/mod.rs
//! Runtime configuration.
//!
//! Resolution order:
//! 1) `$SCREENER_CONFIG_PATH` (must exist when set)
//! 2) `config/screener.toml`
//! 3) built-in defaults
//!
//! Environment variables then override individual fields. A value of `"ENV"`
//! for `database_url` means "read `DATABASE_URL`".

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ScreenError;
use crate::screen::{StopWords, DEFAULT_MIN_SCORE};

pub const ENV_CONFIG_PATH: &str = "SCREENER_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/screener.toml";

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_MIN_SCORE: &str = "SCREENER_MIN_SCORE";
pub const ENV_STOPWORDS_PATH: &str = "SCREENER_STOPWORDS_PATH";
pub const ENV_ORACLE_URL: &str = "SCREENER_ORACLE_URL";
pub const ENV_WATCHLIST_PATH: &str = "SCREENER_WATCHLIST_PATH";

fn default_min_score() -> f32 {
    DEFAULT_MIN_SCORE
}
fn default_max_connections() -> u32 {
    5
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub slack_webhook_url: Option<String>,
    #[serde(default)]
    pub email: Option<EmailConfig>,
    /// Always log matches, even when other channels are configured.
    #[serde(default = "default_true")]
    pub log: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: None,
            email: None,
            log: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Extraction items scoring below this are not searched.
    #[serde(default = "default_min_score")]
    pub min_score: f32,
    /// Stop-word file; the embedded English list is used when absent.
    #[serde(default)]
    pub stopwords_path: Option<PathBuf>,
    #[serde(default)]
    pub oracle_url: Option<String>,
    /// Watchlist file used by `refresh` when no file is given.
    #[serde(default)]
    pub watchlist_path: Option<PathBuf>,
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: default_max_connections(),
            min_score: default_min_score(),
            stopwords_path: None,
            oracle_url: None,
            watchlist_path: None,
            notify: NotifyConfig::default(),
        }
    }
}

impl ScreenerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: ScreenerConfig =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        Ok(cfg)
    }

    /// File (env path, then default path, then defaults) plus env overrides.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// Apply environment overrides in place.
    pub fn apply_env(&mut self) -> Result<()> {
        let is_env_marker = self
            .database_url
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("env"));
        if let Ok(url) = env::var(ENV_DATABASE_URL) {
            self.database_url = Some(url);
        } else if is_env_marker {
            return Err(anyhow!("Missing {ENV_DATABASE_URL} env var"));
        }

        if let Ok(raw) = env::var(ENV_MIN_SCORE) {
            self.min_score = raw
                .trim()
                .parse::<f32>()
                .map_err(|_| anyhow!("{ENV_MIN_SCORE} is not a number: {raw}"))?;
        }
        if let Ok(p) = env::var(ENV_STOPWORDS_PATH) {
            self.stopwords_path = Some(PathBuf::from(p));
        }
        if let Ok(url) = env::var(ENV_ORACLE_URL) {
            self.oracle_url = Some(url);
        }
        if let Ok(p) = env::var(ENV_WATCHLIST_PATH) {
            self.watchlist_path = Some(PathBuf::from(p));
        }
        if let Ok(url) = env::var("SLACK_WEBHOOK_URL") {
            self.notify.slack_webhook_url = Some(url);
        }
        if let Some(email) = email_from_env() {
            self.notify.email = Some(email);
        }
        Ok(())
    }

    /// Threshold, validated to lie in `[0, 1]`.
    pub fn min_score(&self) -> Result<f32, ScreenError> {
        if self.min_score.is_finite() && (0.0..=1.0).contains(&self.min_score) {
            Ok(self.min_score)
        } else {
            Err(ScreenError::ConfigurationMissing(format!(
                "min_score {} outside [0,1]",
                self.min_score
            )))
        }
    }

    pub fn database_url(&self) -> Result<&str, ScreenError> {
        self.database_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ScreenError::ConfigurationMissing(ENV_DATABASE_URL.to_string()))
    }

    pub fn watchlist_path(&self) -> Result<&Path, ScreenError> {
        self.watchlist_path
            .as_deref()
            .ok_or_else(|| ScreenError::ConfigurationMissing(ENV_WATCHLIST_PATH.to_string()))
    }

    /// Configured stop-word list, or the embedded English list.
    pub fn stopwords(&self) -> Result<StopWords, ScreenError> {
        match &self.stopwords_path {
            Some(p) => StopWords::load(p),
            None => Ok(StopWords::english()),
        }
    }
}

/// SMTP settings from `SMTP_HOST`, `SMTP_USER`, `SMTP_PASS`,
/// `NOTIFY_EMAIL_FROM`, `NOTIFY_EMAIL_TO`. All five must be present.
fn email_from_env() -> Option<EmailConfig> {
    Some(EmailConfig {
        smtp_host: env::var("SMTP_HOST").ok()?,
        smtp_user: env::var("SMTP_USER").ok()?,
        smtp_pass: env::var("SMTP_PASS").ok()?,
        from: env::var("NOTIFY_EMAIL_FROM").ok()?,
        to: env::var("NOTIFY_EMAIL_TO").ok()?,
    })
}
