//! File watcher for the notes directory. Rebuilds the token store when notes change.

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use notify_debouncer_mini::notify;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};

use crate::config::SearchSettings;
use crate::index::{build_index, IndexError};
use crate::notes::is_note_path;
use crate::registry::TokenizerRegistry;
use crate::store::TokenStore;

const DEBOUNCE: Duration = Duration::from_millis(400);

/// Watches `root` and calls `on_reindex` with a fresh store whenever a note
/// changes (debounced). Blocks until the process is stopped. Returns Err on
/// setup failure.
pub fn watch_notes(
    root: &Path,
    registry: Arc<TokenizerRegistry>,
    settings: SearchSettings,
    on_reindex: impl Fn(Result<TokenStore, IndexError>) + Send + 'static,
) -> Result<(), WatchError> {
    if !root.is_dir() {
        return Err(WatchError::NotADirectory(root.to_path_buf()));
    }
    let root = root.canonicalize().map_err(WatchError::Canonicalize)?;
    let root_for_callback = root.clone();

    let mut debouncer = new_debouncer(DEBOUNCE, move |res: DebounceEventResult| match res {
        Ok(events) => {
            let changed: Vec<&PathBuf> = events
                .iter()
                .map(|e| &e.path)
                .filter(|p| is_note_path(p))
                .collect();
            if changed.is_empty() {
                return;
            }
            tracing::info!(changed = changed.len(), "notes changed, reindexing");
            on_reindex(build_index(&root_for_callback, &registry, &settings));
        }
        Err(e) => tracing::error!(error = %e, "watcher error"),
    })
    .map_err(|e| WatchError::Notify(e.to_string()))?;

    debouncer
        .watcher()
        .watch(&root, notify::RecursiveMode::Recursive)
        .map_err(|e| WatchError::Watch(e.to_string()))?;
    tracing::info!(root = %root.display(), "watching notes");

    let (_tx, rx) = mpsc::channel::<()>();
    rx.recv().ok();
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("failed to resolve path: {0}")]
    Canonicalize(std::io::Error),
    #[error("watcher init: {0}")]
    Notify(String),
    #[error("watch failed: {0}")]
    Watch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let res = watch_notes(
            &dir.path().join("absent"),
            Arc::new(TokenizerRegistry::new()),
            SearchSettings::default(),
            |_| {},
        );
        assert!(matches!(res, Err(WatchError::NotADirectory(_))));
    }
}
