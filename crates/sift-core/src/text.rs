//! Text primitives shared by indexing, querying and highlighting.
//!
//! Everything here is pure and synchronous. Offsets are char indices unless a
//! function says otherwise.

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Parser, Tag};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Whitespace and punctuation, except the hyphen (hyphenated words are split
/// separately so both the whole and the parts get indexed).
static SPACE_OR_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s\p{P}|^=<>`&&[^\-]]+").expect("separator class is valid"));

/// Looser boundary used for "words": whitespace and brackets only.
static BRACKETS_AND_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[|\[\](){}<>\s]+").expect("bracket class is valid"));

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r\n|\r|\n").expect("line break pattern is valid"));

/// Splits on whitespace and punctuation. Blank fragments are dropped.
pub fn split_tokens(text: &str) -> Vec<String> {
    SPACE_OR_PUNCTUATION
        .split(text)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits on whitespace and brackets, keeping inner punctuation (`foo.bar`, `a-b`).
pub fn split_words(text: &str) -> Vec<String> {
    BRACKETS_AND_SPACE
        .split(text)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `multi-word` → `["multi", "word"]`. Empty when there is no hyphen.
pub fn split_hyphens(text: &str) -> Vec<String> {
    if !text.contains('-') {
        return Vec::new();
    }
    text.split('-')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `fooBar` → `["foo", "Bar"]`. Empty when there is no lower→upper transition.
pub fn split_camel_case(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let has_hump = chars
        .windows(2)
        .any(|w| w[0].is_lowercase() && w[1].is_uppercase());
    if !has_hump {
        return Vec::new();
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        current.push(c);
        let next_is_upper = chars.get(i + 1).is_some_and(|n| n.is_uppercase());
        if c.is_lowercase() && next_is_upper {
            parts.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts.retain(|p| !p.trim().is_empty());
    parts
}

/// Target URLs of all markdown links (inline, reference, autolinks), in document order.
pub fn extract_md_links(text: &str) -> Vec<String> {
    Parser::new(text)
        .filter_map(|event| match event {
            Event::Start(Tag::Link { dest_url, .. }) if !dest_url.is_empty() => {
                Some(dest_url.into_string())
            }
            _ => None,
        })
        .collect()
}

/// Escapes the five HTML-significant characters. Not idempotent: escape exactly once.
pub fn escape_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    for c in html.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Collapses runs of line breaks (any of `\r\n`, `\r`, `\n`) into a single `\n`.
pub fn collapse_line_breaks(text: &str) -> String {
    LINE_BREAK
        .split(text)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text with diacritics removed, plus where each remaining char came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedText {
    pub text: String,
    /// `origins[i]` is the original char index of the i-th char of `text`.
    origins: Vec<usize>,
    /// Byte offset of each char of `text`, plus one trailing entry for `text.len()`.
    byte_starts: Vec<usize>,
    original_len: usize,
}

impl StrippedText {
    /// A map for text scanned as-is.
    pub fn unchanged(text: &str) -> Self {
        let mut byte_starts: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let origins = (0..byte_starts.len()).collect();
        let original_len = byte_starts.len();
        byte_starts.push(text.len());
        Self {
            text: text.to_string(),
            origins,
            byte_starts,
            original_len,
        }
    }

    /// Original char index of the char starting at `byte` in the stripped text.
    /// A byte at the very end maps to the original length.
    pub fn original_offset(&self, byte: usize) -> usize {
        match self.byte_starts.binary_search(&byte) {
            Ok(i) => self.origins.get(i).copied().unwrap_or(self.original_len),
            Err(i) => self
                .origins
                .get(i.saturating_sub(1))
                .copied()
                .unwrap_or(self.original_len),
        }
    }

    /// Maps a byte range of the stripped text to a char range of the original.
    /// Marks dropped after the last char of the range are covered by the end.
    pub fn original_range(&self, start: usize, end: usize) -> (usize, usize) {
        let from = self.original_offset(start);
        (from, self.original_offset(end).max(from))
    }
}

fn is_latin_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

fn is_arabic_mark(c: char) -> bool {
    matches!(c, '\u{064b}'..='\u{065f}' | '\u{0670}' | '\u{06d6}'..='\u{06ed}')
}

/// Removes combining diacritics, keeping a map back to the original char offsets.
pub fn strip_diacritics(text: &str, arabic: bool) -> StrippedText {
    let mut out = String::with_capacity(text.len());
    let mut origins = Vec::with_capacity(text.len());
    let mut byte_starts = Vec::with_capacity(text.len() + 1);
    let mut original_len = 0;

    for (index, c) in text.chars().enumerate() {
        original_len = index + 1;
        if arabic && is_arabic_mark(c) {
            continue;
        }
        for d in std::iter::once(c).nfd() {
            if is_latin_mark(d) || (arabic && is_arabic_mark(d)) {
                continue;
            }
            byte_starts.push(out.len());
            origins.push(index);
            out.push(d);
        }
    }
    byte_starts.push(out.len());

    StrippedText {
        text: out,
        origins,
        byte_starts,
        original_len,
    }
}

/// Removes diacritics from a string whose offsets don't matter (query words).
pub fn remove_diacritics(text: &str, arabic: bool) -> String {
    strip_diacritics(text, arabic).text
}

/// Converts a byte offset into a char offset.
pub fn char_offset(text: &str, byte: usize) -> usize {
    text.get(..byte)
        .map(|prefix| prefix.chars().count())
        .unwrap_or_else(|| text.chars().count())
}

/// Slices by char indices. Out-of-range bounds are clamped.
pub fn slice_chars(text: &str, from: usize, to: usize) -> &str {
    let mut indices = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()));
    let start = indices.nth(from).unwrap_or(text.len());
    let end = if to <= from {
        start
    } else {
        indices.nth(to - from - 1).unwrap_or(text.len())
    };
    &text[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_split_on_punctuation_but_not_hyphens() {
        assert_eq!(
            split_tokens("Hello, multi-word world! foo_bar"),
            vec!["Hello", "multi-word", "world", "foo", "bar"]
        );
    }

    #[test]
    fn words_keep_inner_punctuation() {
        assert_eq!(
            split_words("see (foo.bar) and [[link]]"),
            vec!["see", "foo.bar", "and", "link"]
        );
    }

    #[test]
    fn hyphen_split() {
        assert_eq!(split_hyphens("multi-word"), vec!["multi", "word"]);
        assert!(split_hyphens("plain").is_empty());
    }

    #[test]
    fn camel_case_split() {
        assert_eq!(split_camel_case("fooBar"), vec!["foo", "Bar"]);
        assert_eq!(split_camel_case("parseHTMLString"), vec!["parse", "HTMLString"]);
        assert!(split_camel_case("lower").is_empty());
        assert!(split_camel_case("UPPER").is_empty());
    }

    #[test]
    fn escape_html_once() {
        assert_eq!(escape_html("<a>&\"'"), "&lt;a&gt;&amp;&quot;&#039;");
        assert_eq!(escape_html(&escape_html("&")), "&amp;amp;");
    }

    #[test]
    fn md_links_are_extracted() {
        let text = "see [docs](https://example.com/a-b) and <https://rust-lang.org>";
        assert_eq!(
            extract_md_links(text),
            vec!["https://example.com/a-b", "https://rust-lang.org"]
        );
        assert!(extract_md_links("no links here").is_empty());
    }

    #[test]
    fn collapse_multiple_line_breaks() {
        assert_eq!(collapse_line_breaks("a\r\n\r\nb\rc\n\n\nd"), "a\nb\nc\nd");
    }

    #[test]
    fn strip_keeps_original_offsets() {
        let s = strip_diacritics("café au lait", false);
        assert_eq!(s.text, "cafe au lait");
        let byte = s.text.find("au").unwrap();
        assert_eq!(s.original_offset(byte), 5);
        assert_eq!(s.original_range(0, 4), (0, 4));
    }

    #[test]
    fn strip_decomposed_input_shrinks_but_maps_back() {
        // "e" followed by a combining acute accent: two chars in, one char out.
        let s = strip_diacritics("re\u{301}sume\u{301} ok", false);
        assert_eq!(s.text, "resume ok");
        let byte = s.text.find("ok").unwrap();
        assert_eq!(s.original_offset(byte), 9);
        assert_eq!(s.original_range(0, 6), (0, 8));
    }

    #[test]
    fn strip_arabic_marks_only_when_enabled() {
        let text = "\u{0643}\u{064e}\u{062a}\u{064e}\u{0628}\u{064e}";
        assert_eq!(strip_diacritics(text, true).text, "\u{0643}\u{062a}\u{0628}");
        assert_eq!(strip_diacritics(text, false).text, text);
    }

    #[test]
    fn char_helpers() {
        let text = "日本語 text";
        assert_eq!(char_offset(text, "日本語".len()), 3);
        assert_eq!(slice_chars(text, 1, 3), "本語");
        assert_eq!(slice_chars(text, 4, 100), "text");
        assert_eq!(slice_chars(text, 50, 60), "");
    }
}
