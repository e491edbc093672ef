//! Query pipeline: parse → query expression → store lookup → matches → excerpts.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::SearchSettings;
use crate::excerpt::{make_excerpt, Notifier, ResultExcerpt};
use crate::matches::{get_matches, SearchMatch};
use crate::query::Query;
use crate::registry::TokenizerRegistry;
use crate::store::TokenStore;
use crate::tokenize::tokenize_for_search;

/// One note that matched, with what to highlight and show.
#[derive(Debug, Clone, Serialize)]
pub struct NoteHit {
    pub path: PathBuf,
    pub matches: Vec<SearchMatch>,
    pub excerpts: Vec<ResultExcerpt>,
}

/// Words to highlight for `query`: every term of its expression plus the exact terms.
pub fn highlight_words(query: &Query, registry: &TokenizerRegistry) -> Vec<String> {
    let mut words = tokenize_for_search(&query.text(), registry).terms();
    for term in query.exact_terms() {
        if !words.contains(&term) {
            words.push(term);
        }
    }
    words
}

/// Searches `store` and builds up to `max_excerpts` excerpts per hit, one per
/// match, in match order.
pub fn search_notes(
    store: &TokenStore,
    registry: &TokenizerRegistry,
    settings: &SearchSettings,
    text: &str,
    max_excerpts: usize,
    notifier: &dyn Notifier,
) -> Vec<NoteHit> {
    let query = Query::parse(text);
    let expr = tokenize_for_search(&query.text(), registry);
    let words = highlight_words(&query, registry);

    store
        .search(&expr)
        .into_iter()
        .filter(|item| {
            let body = item.note.body.to_lowercase();
            !query.excluded().iter().any(|x| body.contains(&x.to_lowercase()))
        })
        .map(|item| {
            let body = &item.note.body;
            let matches = get_matches(body, &words, Some(&query), settings);
            let excerpts = matches
                .iter()
                .take(max_excerpts)
                .map(|m| make_excerpt(body, Some(m.offset), settings, notifier))
                .collect();
            NoteHit {
                path: item.note.path.clone(),
                matches,
                excerpts,
            }
        })
        .collect()
}
