//! In-memory token index for notes. Evaluates query expressions; no ranking.
//! No persistence; the store is discarded when the process exits.

use std::collections::HashSet;

use crate::notes::Note;
use crate::tokenize::QueryExpr;

/// A note with the tokens it was indexed under (lowercased).
#[derive(Debug, Clone)]
pub struct IndexedNote {
    pub note: Note,
    tokens: HashSet<String>,
    /// Tokens as produced, duplicates included.
    token_count: usize,
}

impl IndexedNote {
    pub fn token_count(&self) -> usize {
        self.token_count
    }

    fn contains_all(&self, tokens: &[String]) -> bool {
        tokens.iter().all(|t| self.tokens.contains(&t.to_lowercase()))
    }
}

#[derive(Debug, Default)]
pub struct TokenStore {
    items: Vec<IndexedNote>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add a note with the tokens produced for it.
    pub fn add(&mut self, note: Note, tokens: Vec<String>) {
        let token_count = tokens.len();
        let tokens = tokens.into_iter().map(|t| t.to_lowercase()).collect();
        self.items.push(IndexedNote {
            note,
            tokens,
            token_count,
        });
    }

    /// Notes for which at least one non-empty branch has all its tokens indexed.
    /// Results are in insertion order.
    pub fn search(&self, expr: &QueryExpr) -> Vec<&IndexedNote> {
        let branches: Vec<&[String]> = expr
            .branches
            .iter()
            .map(|b| b.tokens.as_slice())
            .filter(|tokens| !tokens.is_empty())
            .collect();
        if branches.is_empty() {
            return Vec::new();
        }
        self.items
            .iter()
            .filter(|item| branches.iter().any(|tokens| item.contains_all(tokens)))
            .collect()
    }

    pub fn notes(&self) -> impl Iterator<Item = &IndexedNote> {
        self.items.iter()
    }

    /// Number of indexed notes.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::tokenize::AndGroup;

    fn note(name: &str) -> Note {
        Note {
            path: PathBuf::from(name),
            body: String::new(),
        }
    }

    fn tokens(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn expr(branches: &[&[&str]]) -> QueryExpr {
        QueryExpr {
            branches: branches
                .iter()
                .map(|b| AndGroup { tokens: tokens(b) })
                .collect(),
        }
    }

    #[test]
    fn any_branch_all_tokens() {
        let mut store = TokenStore::new();
        store.add(note("a.md"), tokens(&["Rust", "borrow", "checker"]));
        store.add(note("b.md"), tokens(&["rust", "async"]));

        let hits = store.search(&expr(&[&["rust", "checker"], &["nothing"]]));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].note.path, PathBuf::from("a.md"));

        let hits = store.search(&expr(&[&["missing"], &["RUST"]]));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn empty_branches_match_nothing() {
        let mut store = TokenStore::new();
        store.add(note("a.md"), tokens(&["x"]));
        assert!(store.search(&expr(&[&[], &[]])).is_empty());
    }

    #[test]
    fn keeps_duplicate_count() {
        let mut store = TokenStore::new();
        store.add(note("a.md"), tokens(&["x", "x", "y"]));
        assert_eq!(store.notes().next().unwrap().token_count(), 3);
        assert_eq!(store.len(), 1);
    }
}
