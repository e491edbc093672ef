//! Where sift keeps its own data (config).
//!
//! Notes stay in the folder the user chooses; only app state lives here.

use std::path::PathBuf;

/// Overrides the data directory, e.g. for a throwaway profile.
pub const DATA_DIR_ENV: &str = "SIFT_DATA_DIR";

/// Returns the directory where sift stores its config.
/// `$SIFT_DATA_DIR` if set, otherwise the platform's local data dir
/// (on Linux `~/.local/share/sift/`).
/// Creates the directory if it doesn't exist; returns `None` if we can't determine the path.
pub fn app_data_dir() -> Option<PathBuf> {
    let dir = match std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => directories::ProjectDirs::from("app", "Sift", "sift")?
            .data_local_dir()
            .to_path_buf(),
    };
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(dir = %dir.display(), error = %e, "cannot create app data directory");
        return None;
    }
    Some(dir)
}
