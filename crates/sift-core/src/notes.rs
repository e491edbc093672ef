//! Discovering and reading markdown notes from a user-chosen directory.
//!
//! The notes root is chosen by the user; we only read and index it.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// A note on disk. Search offsets are char indices into `body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub path: PathBuf,
    /// Content without YAML frontmatter.
    pub body: String,
}

/// Whether `path` looks like a note we index.
pub fn is_note_path(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "md")
}

/// Reads a single note, dropping its frontmatter.
pub fn read_note(path: &Path) -> Result<Note, ScanError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ScanError::Read(path.to_path_buf(), e))?;
    Ok(Note {
        path: path.to_path_buf(),
        body: strip_frontmatter(&raw).to_string(),
    })
}

/// Scans `root` for `.md` files, skipping hidden entries. Does not follow symlinks.
///
/// A note that can't be read is logged and skipped so one bad file doesn't
/// hide the rest.
pub fn scan_notes(root: &Path) -> Result<Vec<Note>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let mut notes = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        let entry = entry.map_err(|e| ScanError::Walk(e.to_string()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_note_path(path) {
            continue;
        }
        match read_note(path) {
            Ok(note) => notes.push(note),
            Err(e) => tracing::warn!(error = %e, "skipping unreadable note"),
        }
    }
    tracing::debug!(root = %root.display(), count = notes.len(), "scanned notes");
    Ok(notes)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

/// Removes leading YAML frontmatter (between the first two `---` lines).
fn strip_frontmatter(content: &str) -> &str {
    let s = content.trim_start();
    let Some(after_open) = s.strip_prefix("---") else {
        return content;
    };
    match after_open.find("\n---") {
        Some(close) => {
            let rest = &after_open[close + 4..];
            // Drop the remainder of the closing fence line.
            let rest = rest.split_once('\n').map_or("", |(_, body)| body);
            rest.trim_start()
        }
        None => content,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("walk error: {0}")]
    Walk(String),
    #[error("read error for {0}: {1}")]
    Read(PathBuf, std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_frontmatter_plain() {
        assert_eq!(strip_frontmatter("Hello world."), "Hello world.");
    }

    #[test]
    fn strip_frontmatter_with_yaml() {
        let s = "---\ntitle: Foo\ndate: 2024-01-01\n---\n\nActual content here.";
        assert_eq!(strip_frontmatter(s), "Actual content here.");
    }

    #[test]
    fn unterminated_frontmatter_is_content() {
        let s = "---\ntitle: Foo\nno closing fence";
        assert_eq!(strip_frontmatter(s), s);
    }

    #[test]
    fn scan_finds_markdown_and_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::create_dir_all(root.join(".trash")).unwrap();
        std::fs::write(root.join("a.md"), "---\ntags: x\n---\nalpha").unwrap();
        std::fs::write(root.join("sub/b.md"), "beta").unwrap();
        std::fs::write(root.join("sub/c.txt"), "not a note").unwrap();
        std::fs::write(root.join(".trash/d.md"), "deleted").unwrap();

        let notes = scan_notes(root).unwrap();
        let bodies: Vec<&str> = notes.iter().map(|n| n.body.as_str()).collect();
        assert_eq!(bodies, vec!["alpha", "beta"]);
    }

    #[test]
    fn scan_rejects_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.md");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(scan_notes(&file), Err(ScanError::NotADirectory(_))));
    }
}
