//! Full-text search text pipeline for a notes folder, independent of how it is
//! run (CLI or a host app).
//!
//! Indexing: text → [`tokenize_for_indexing`] → tokens for an index.
//! Querying: text → [`tokenize_for_search`] → [`QueryExpr`] → index hits →
//! [`get_matches`] → [`make_excerpt`].
//!
//! Language tokenizers are plugged in through a [`TokenizerRegistry`], which is
//! passed explicitly wherever tokenization happens.

pub mod app_data;
pub mod capability;
pub mod chinese;
pub mod config;
pub mod contract;
pub mod excerpt;
pub mod index;
pub mod matches;
pub mod notes;
pub mod plugin;
pub mod query;
pub mod registry;
pub mod search;
pub mod store;
pub mod text;
pub mod tokenize;
pub mod watcher;

pub use app_data::app_data_dir;
pub use capability::{CapabilityError, TokenizerCapability, ValidatedTokenizer};
pub use config::{get_notes_root, load_config, save_config, set_notes_root, Config, ConfigError, SearchSettings};
pub use excerpt::{make_excerpt, LogNotifier, Notifier, ResultExcerpt};
pub use index::{build_index, index_notes, IndexError};
pub use matches::{get_matches, strings_to_regex, SearchMatch};
pub use notes::{scan_notes, Note, ScanError};
pub use plugin::load_from_path;
pub use query::Query;
pub use registry::TokenizerRegistry;
pub use search::{search_notes, NoteHit};
pub use store::TokenStore;
pub use text::escape_html;
pub use tokenize::{tokenize_for_indexing, tokenize_for_search, AndGroup, IndexingOptions, QueryExpr};
pub use watcher::{watch_notes, WatchError};

/// Returns a short status string. Used to verify the backend is wired up.
pub fn status() -> &'static str {
    "sift-core ready"
}
