// src/screen/stopwords.rs
//! Stop-word set used by the term normalizer.
//!
//! Words are stored lower-cased and looked up case-insensitively. The default
//! set is a curated English list embedded at build time; a replacement can be
//! loaded from a JSON array or a TOML `words = [...]` file.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;

use crate::error::ScreenError;

static DEFAULT_WORDS: Lazy<Vec<String>> = Lazy::new(|| {
    let raw = include_str!("../../config/stopwords.json");
    serde_json::from_str::<Vec<String>>(raw).expect("valid embedded stop-word list")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// Empty set: nothing is filtered.
    pub fn none() -> Self {
        Self::default()
    }

    /// The embedded curated English list.
    pub fn english() -> Self {
        Self::from_words(DEFAULT_WORDS.iter())
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Load from `path`. A missing or unreadable file is a configuration error.
    pub fn load(path: &Path) -> Result<Self, ScreenError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScreenError::ConfigurationMissing(format!(
                "stop-word list {}: {e}",
                path.display()
            ))
        })?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        parse_stopwords(&content, &ext).map(Self::from_words)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn parse_stopwords(s: &str, hint_ext: &str) -> Result<Vec<String>, ScreenError> {
    #[derive(serde::Deserialize)]
    struct TomlWords {
        words: Vec<String>,
    }

    let try_toml = hint_ext == "toml" || s.contains("words");
    if try_toml {
        if let Ok(v) = toml::from_str::<TomlWords>(s) {
            return Ok(v.words);
        }
    }
    if let Ok(v) = serde_json::from_str::<Vec<String>>(s) {
        return Ok(v);
    }
    Err(ScreenError::ConfigurationMissing(
        "unsupported stop-word list format".into(),
    ))
}
