//! The ordered set of active language tokenizers.
//!
//! Built once from settings and replaced wholesale when settings change. It is
//! passed by reference into the tokenizer functions; there is no global list.

use std::path::PathBuf;

use crate::capability::{TokenizerCapability, ValidatedTokenizer};
use crate::chinese::ChineseTokenizer;
use crate::config::SearchSettings;
use crate::plugin;

#[derive(Debug, Default)]
pub struct TokenizerRegistry {
    tokenizers: Vec<ValidatedTokenizer>,
}

impl TokenizerRegistry {
    /// An empty registry: only the default splitting rules apply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from settings: the built-in segmenter (if enabled)
    /// first, then each configured module in order. Modules that fail to load
    /// are skipped.
    pub async fn from_settings(settings: &SearchSettings) -> Self {
        let mut registry = Self::new();
        registry.reinitialize(settings).await;
        registry
    }

    /// Replaces the whole set of tokenizers according to `settings`.
    pub async fn reinitialize(&mut self, settings: &SearchSettings) {
        let mut tokenizers = Vec::new();

        if settings.chinese_tokenizer {
            if let Some(t) = ValidatedTokenizer::initialize(Box::new(ChineseTokenizer::new())).await {
                tokenizers.push(t);
            }
        }
        tokenizers.extend(load_plugins(&settings.tokenizer_plugins).await);

        tracing::info!(
            count = tokenizers.len(),
            names = ?tokenizers.iter().map(|t| t.name()).collect::<Vec<_>>(),
            "tokenizer registry initialized"
        );
        self.tokenizers = tokenizers;
    }

    /// Initializes and appends a capability. Returns false if its init failed.
    pub async fn register(&mut self, capability: Box<dyn TokenizerCapability>) -> bool {
        match ValidatedTokenizer::initialize(capability).await {
            Some(t) => {
                self.tokenizers.push(t);
                true
            }
            None => false,
        }
    }

    pub fn tokenizers(&self) -> &[ValidatedTokenizer] {
        &self.tokenizers
    }

    pub fn len(&self) -> usize {
        self.tokenizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokenizers.is_empty()
    }

    /// Segmentation of `word` by the first tokenizer that claims it.
    pub fn tokenize_word(&self, word: &str) -> Option<Vec<String>> {
        self.tokenizers.iter().find_map(|t| t.try_tokenization(word))
    }
}

async fn load_plugins(paths: &[PathBuf]) -> Vec<ValidatedTokenizer> {
    let mut loaded = Vec::with_capacity(paths.len());
    for path in paths {
        if let Some(t) = plugin::load_from_path(path).await {
            loaded.push(t);
        }
    }
    loaded
}
