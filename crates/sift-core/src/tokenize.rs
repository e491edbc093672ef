//! Turning text into index tokens and queries into boolean expressions.
//!
//! Both sides share the same vocabulary ("tokens", "words", hyphen and
//! camelCase parts) so query terms line up with what was indexed.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;

use crate::registry::TokenizerRegistry;
use crate::text::{extract_md_links, split_camel_case, split_hyphens, split_tokens, split_words};

/// Options for [`tokenize_for_indexing`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexingOptions {
    pub tokenize_urls: bool,
    pub dedupe: bool,
}

/// All tokens must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AndGroup {
    pub tokens: Vec<String>,
}

/// Any branch may match. Always has at least one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryExpr {
    pub branches: Vec<AndGroup>,
}

impl QueryExpr {
    /// Distinct tokens across all branches, in first-seen order.
    pub fn terms(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.branches
            .iter()
            .flat_map(|b| b.tokens.iter())
            .filter(|t| seen.insert(t.as_str()))
            .cloned()
            .collect()
    }
}

/// Tokens for one document. On any internal failure the document contributes nothing.
pub fn tokenize_for_indexing(
    text: &str,
    options: IndexingOptions,
    registry: &TokenizerRegistry,
) -> Vec<String> {
    match catch_unwind(AssertUnwindSafe(|| index_tokens(text, options, registry))) {
        Ok(tokens) => tokens,
        Err(_) => {
            tracing::error!(len = text.len(), "error tokenizing text, skipping document");
            Vec::new()
        }
    }
}

fn index_tokens(text: &str, options: IndexingOptions, registry: &TokenizerRegistry) -> Vec<String> {
    let tokens = split_tokens(text).into_iter().flat_map(|token| {
        let hyphens = split_hyphens(&token);
        let humps = split_camel_case(&token);
        std::iter::once(token).chain(hyphens).chain(humps)
    });
    let words = tokenize_words(text, registry);
    let urls = if options.tokenize_urls {
        extract_md_links(text)
    } else {
        Vec::new()
    };

    let all = tokens.chain(words).chain(urls);
    if options.dedupe {
        let mut seen = HashSet::new();
        all.filter(|t| seen.insert(t.clone())).collect()
    } else {
        all.collect()
    }
}

/// Query expression for `text`: one branch per decomposition strategy.
pub fn tokenize_for_search(text: &str, registry: &TokenizerRegistry) -> QueryExpr {
    // URLs go first so their punctuation isn't split apart.
    let urls = extract_md_links(text);
    let mut rest = text.to_string();
    for url in &urls {
        rest = rest.replacen(url.as_str(), "", 1);
    }

    let tokens = split_tokens(&rest);
    let words = tokenize_words(&rest, registry);
    let hyphens: Vec<String> = tokens.iter().flat_map(|t| split_hyphens(t)).collect();
    let humps: Vec<String> = tokens.iter().flat_map(|t| split_camel_case(t)).collect();

    let branch = |mut group: Vec<String>| {
        group.extend(urls.iter().cloned());
        AndGroup { tokens: group }
    };

    QueryExpr {
        branches: vec![branch(tokens), branch(words), branch(hyphens), branch(humps)],
    }
}

/// Whitespace/bracket fragments, each replaced by a language tokenizer's
/// segmentation when one claims it.
fn tokenize_words(text: &str, registry: &TokenizerRegistry) -> Vec<String> {
    split_words(text)
        .into_iter()
        .flat_map(|word| registry.tokenize_word(&word).unwrap_or_else(|| vec![word]))
        .filter(|w| !w.trim().is_empty())
        .collect()
}
