//! Locating query words inside note text for highlighting.
//!
//! Runs inside a latency-sensitive host, so the scan stops after
//! [`MAX_MATCHES`] matches or [`TIME_BUDGET`], whichever comes first.

use std::time::{Duration, Instant};

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::config::SearchSettings;
use crate::query::Query;
use crate::text::{
    collapse_line_breaks, escape_html, remove_diacritics, slice_chars, strip_diacritics, StrippedText,
};

pub const MAX_MATCHES: usize = 100;
pub const TIME_BUDGET: Duration = Duration::from_millis(50);
/// Bytes searched per step of the scan, between two clock checks.
const SCAN_WINDOW: usize = 256;

/// A highlighted span: HTML-escaped text and its char offset in the original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    #[serde(rename = "match")]
    pub text: String,
    pub offset: usize,
}

/// One alternation over all words, longest first so a phrase beats the words
/// inside it. Whole-word hits are preferred over substrings at the same spot.
/// `None` when there is nothing to match.
pub fn strings_to_regex(words: &[String]) -> Option<Regex> {
    let mut words: Vec<&str> = words.iter().map(String::as_str).filter(|w| !w.is_empty()).collect();
    if words.is_empty() {
        return None;
    }
    words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    words.dedup();

    let alternation = words
        .iter()
        .map(|w| {
            let w = regex::escape(w);
            format!(r"\b{w}\b|{w}")
        })
        .collect::<Vec<_>>()
        .join("|");

    match RegexBuilder::new(&format!("(?:{alternation})"))
        .case_insensitive(true)
        .unicode(true)
        .size_limit(64 * (1 << 20))
        .build()
    {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(error = %e, "could not build match pattern");
            None
        }
    }
}

/// Prepares a span of original text for display, the same way excerpts are.
fn display_text(text: &str, settings: &SearchSettings) -> String {
    let mut text = text.trim().to_string();
    if settings.render_line_return_in_excerpts {
        text = collapse_line_breaks(&text).trim().to_string();
    }
    let text = escape_html(&text);
    if settings.render_line_return_in_excerpts {
        text.replace('\n', "<br>")
    } else {
        text
    }
}

/// Finds occurrences of `words` in `text`.
///
/// Offsets always index `text` itself, even when diacritics are ignored. With a
/// multi-term or exact `query`, the match sitting where the best phrase occurs
/// is moved to the front.
pub fn get_matches(
    text: &str,
    words: &[String],
    query: Option<&Query>,
    settings: &SearchSettings,
) -> Vec<SearchMatch> {
    let arabic = settings.ignore_arabic_diacritics;
    let normalize = |w: &str| {
        let w = escape_html(w);
        if settings.ignore_diacritics {
            remove_diacritics(&w, arabic)
        } else {
            w
        }
    };

    let words: Vec<String> = words.iter().map(|w| normalize(w)).collect();
    let Some(reg) = strings_to_regex(&words) else {
        return Vec::new();
    };
    // A case-insensitive match of a word spans at most 4 bytes per char of it.
    let longest = words.iter().map(|w| w.chars().count()).max().unwrap_or(0) * 4;

    // Stripping counts against the budget: it is proportional to the note.
    let deadline = Instant::now() + TIME_BUDGET;

    // The scanned copy may be shorter than `text`; `scanned.original_range`
    // maps its byte ranges back to char ranges of `text`.
    let scanned = if settings.ignore_diacritics {
        strip_diacritics(text, arabic)
    } else {
        StrippedText::unchanged(text)
    };

    let mut matches = scan(&reg, &scanned, text, longest, deadline, settings);

    if let Some(query) = query.filter(|q| q.wants_phrase_first()) {
        promote_best_phrase(text, &scanned, query, &mut matches, settings);
    }
    matches
}

/// Leftmost-first matches of `reg` over `scanned`, searched one bounded window
/// at a time so the clock is checked between steps. A single step never scans
/// more than [`SCAN_WINDOW`] plus `longest` bytes. The step that crosses the
/// deadline still keeps what it found.
fn scan(
    reg: &Regex,
    scanned: &StrippedText,
    text: &str,
    longest: usize,
    deadline: Instant,
    settings: &SearchSettings,
) -> Vec<SearchMatch> {
    let hay = scanned.text.as_str();
    let mut matches = Vec::new();
    let mut pos = 0;

    while pos < hay.len() && matches.len() < MAX_MATCHES {
        let window_end = char_boundary_after(hay, pos + SCAN_WINDOW);
        let end = char_boundary_after(hay, window_end + longest);
        // `find_at` still sees the text before `pos`, so `\b` holds at the seam.
        match reg.find_at(&hay[..end], pos) {
            Some(m) if m.start() < window_end || end == hay.len() => {
                pos = m.end().max(m.start() + 1);
                let (from, to) = scanned.original_range(m.start(), m.end());
                let original = slice_chars(text, from, to);
                if !original.trim().is_empty() {
                    matches.push(SearchMatch {
                        text: display_text(original, settings),
                        offset: from,
                    });
                }
            }
            // A hit past the window may be cut short by `end`; the next step finds it whole.
            _ => pos = window_end,
        }
        if Instant::now() >= deadline {
            tracing::debug!(found = matches.len(), "match scan cut off");
            break;
        }
    }
    matches
}

fn char_boundary_after(text: &str, byte: usize) -> usize {
    let mut byte = byte.min(text.len());
    while !text.is_char_boundary(byte) {
        byte += 1;
    }
    byte
}

fn promote_best_phrase(
    text: &str,
    scanned: &StrippedText,
    query: &Query,
    matches: &mut Vec<SearchMatch>,
    settings: &SearchSettings,
) {
    let best = query.best_string_for_excerpt();
    let best = if settings.ignore_diacritics {
        remove_diacritics(&best, settings.ignore_arabic_diacritics)
    } else {
        best
    };
    if best.trim().is_empty() {
        return;
    }
    let Ok(phrase) = RegexBuilder::new(&regex::escape(&best))
        .case_insensitive(true)
        .build()
    else {
        return;
    };
    let Some(found) = phrase.find(&scanned.text) else {
        return;
    };

    let (from, to) = scanned.original_range(found.start(), found.end());
    if let Some(index) = matches.iter().position(|m| m.offset == from) {
        matches.remove(index);
        matches.insert(
            0,
            SearchMatch {
                text: display_text(slice_chars(text, from, to), settings),
                offset: from,
            },
        );
    }
}
