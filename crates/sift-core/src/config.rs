//! Persisted config (notes root, search settings) in the app data directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app_data;

const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the user's notes directory (chosen by them).
    pub notes_root: Option<String>,
    #[serde(default)]
    pub search: SearchSettings,
}

/// Knobs for tokenization, highlighting and excerpts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Match `é` when searching for `e` (and the other way round).
    pub ignore_diacritics: bool,
    /// Also ignore Arabic harakat. Only used with `ignore_diacritics`.
    pub ignore_arabic_diacritics: bool,
    /// Keep line breaks in excerpts (as `<br>`) instead of flattening them.
    pub render_line_return_in_excerpts: bool,
    /// Chars of context before a match.
    pub excerpt_before: usize,
    /// Chars of context after a match.
    pub excerpt_after: usize,
    /// Index markdown link targets as standalone tokens.
    pub tokenize_urls: bool,
    /// Deduplicate index tokens. Off keeps words found by several strategies
    /// repeated, which weighs them higher in the index.
    pub dedupe_index_tokens: bool,
    /// Enable the built-in Chinese segmenter.
    pub chinese_tokenizer: bool,
    /// Shared libraries exporting a tokenizer module, tried in order.
    pub tokenizer_plugins: Vec<PathBuf>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            ignore_diacritics: true,
            ignore_arabic_diacritics: false,
            render_line_return_in_excerpts: true,
            excerpt_before: 100,
            excerpt_after: 300,
            tokenize_urls: false,
            dedupe_index_tokens: false,
            chinese_tokenizer: false,
            tokenizer_plugins: Vec::new(),
        }
    }
}

/// Load config from the app data directory. Returns default config if missing or invalid.
pub fn load_config() -> Config {
    let Some(data_dir) = app_data::app_data_dir() else {
        return Config::default();
    };
    load_config_from(&data_dir.join(CONFIG_FILENAME))
}

fn load_config_from(path: &Path) -> Config {
    let Ok(s) = std::fs::read_to_string(path) else {
        return Config::default();
    };
    match toml::from_str(&s) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid config, using defaults");
            Config::default()
        }
    }
}

/// Save config to the app data directory.
pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    let data_dir = app_data::app_data_dir().ok_or(ConfigError::NoDataDir)?;
    save_config_to(&data_dir.join(CONFIG_FILENAME), config)
}

fn save_config_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let s = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;
    std::fs::write(path, s).map_err(ConfigError::Write)
}

/// Get the configured notes root path, if any.
pub fn get_notes_root() -> Option<PathBuf> {
    load_config()
        .notes_root
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Set and persist the notes root.
pub fn set_notes_root(path: &Path) -> Result<(), ConfigError> {
    let path = path.canonicalize().map_err(ConfigError::Canonicalize)?;
    if !path.is_dir() {
        return Err(ConfigError::NotADirectory(path));
    }
    let mut config = load_config();
    config.notes_root = Some(path.to_string_lossy().into_owned());
    save_config(&config)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine app data directory")]
    NoDataDir,
    #[error("failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("failed to write config: {0}")]
    Write(std::io::Error),
    #[error("failed to resolve path: {0}")]
    Canonicalize(std::io::Error),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}
