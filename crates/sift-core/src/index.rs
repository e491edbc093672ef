//! Index pipeline: scan → tokenize → store. Builds an in-memory token store.

use std::path::Path;

use crate::config::SearchSettings;
use crate::notes::{scan_notes, Note, ScanError};
use crate::registry::TokenizerRegistry;
use crate::store::TokenStore;
use crate::tokenize::{tokenize_for_indexing, IndexingOptions};

impl From<&SearchSettings> for IndexingOptions {
    fn from(settings: &SearchSettings) -> Self {
        Self {
            tokenize_urls: settings.tokenize_urls,
            dedupe: settings.dedupe_index_tokens,
        }
    }
}

/// Runs the full pipeline over every note under `root`.
pub fn build_index(
    root: &Path,
    registry: &TokenizerRegistry,
    settings: &SearchSettings,
) -> Result<TokenStore, IndexError> {
    let notes = scan_notes(root)?;
    Ok(index_notes(notes, registry, settings))
}

/// Tokenizes and stores already-loaded notes. A note whose tokenization fails
/// is stored with no tokens; the batch carries on.
pub fn index_notes(
    notes: Vec<Note>,
    registry: &TokenizerRegistry,
    settings: &SearchSettings,
) -> TokenStore {
    let options = IndexingOptions::from(settings);
    let mut store = TokenStore::new();
    for note in notes {
        let tokens = tokenize_for_indexing(&note.body, options, registry);
        if tokens.is_empty() {
            tracing::debug!(path = %note.path.display(), "note produced no tokens");
        }
        store.add(note, tokens);
    }
    tracing::info!(notes = store.len(), "index built");
    store
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),
}
