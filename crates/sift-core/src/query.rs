//! Parsing what the user typed into the search box.
//!
//! `"exact phrase"` is kept as one segment, `-word` excludes a word, everything
//! else is split on whitespace.

use std::collections::HashSet;

/// One piece of the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub value: String,
    /// Was written between double quotes.
    pub exact: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    segments: Vec<Segment>,
    excluded: Vec<String>,
}

impl Query {
    pub fn parse(text: &str) -> Self {
        let mut query = Query::default();
        let mut chars = text.chars().peekable();

        while let Some(&c) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
                continue;
            }

            if c == '"' {
                chars.next();
                let phrase: String = chars.by_ref().take_while(|&c| c != '"').collect();
                let phrase = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
                if !phrase.is_empty() {
                    query.segments.push(Segment {
                        value: phrase,
                        exact: true,
                    });
                }
                continue;
            }

            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                word.push(c);
                chars.next();
            }
            match word.strip_prefix('-') {
                Some(excluded) if !excluded.is_empty() => query.excluded.push(excluded.to_string()),
                _ => query.segments.push(Segment {
                    value: word,
                    exact: false,
                }),
            }
        }
        query
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The searchable text: segments joined by a space, exclusions dropped.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.value.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Quoted terms and multi-word segments, deduplicated.
    pub fn exact_terms(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.segments
            .iter()
            .filter(|s| s.exact || s.value.split(' ').count() > 1)
            .map(|s| s.value.clone())
            .filter(|v| seen.insert(v.clone()))
            .collect()
    }

    /// The string most worth showing first: the longest quoted term, or the
    /// whole query as typed.
    pub fn best_string_for_excerpt(&self) -> String {
        self.segments
            .iter()
            .filter(|s| s.exact)
            .map(|s| s.value.as_str())
            .fold(None, |best: Option<&str>, v| match best {
                Some(b) if b.chars().count() >= v.chars().count() => Some(b),
                _ => Some(v),
            })
            .map(str::to_string)
            .unwrap_or_else(|| self.text())
    }

    /// Whether phrase promotion applies: several segments, or any exact term.
    pub fn wants_phrase_first(&self) -> bool {
        self.segments.len() > 1 || !self.exact_terms().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_words() {
        let q = Query::parse("machine  learning");
        assert_eq!(q.text(), "machine learning");
        assert!(q.exact_terms().is_empty());
        assert_eq!(q.best_string_for_excerpt(), "machine learning");
        assert!(q.wants_phrase_first());
    }

    #[test]
    fn quoted_and_excluded() {
        let q = Query::parse("rust \"borrow  checker\" -python \"ownership\"");
        assert_eq!(q.text(), "rust borrow checker ownership");
        assert_eq!(q.excluded(), ["python".to_string()]);
        assert_eq!(q.exact_terms(), vec!["borrow checker", "ownership"]);
        assert_eq!(q.best_string_for_excerpt(), "borrow checker");
    }

    #[test]
    fn single_word_does_not_promote() {
        let q = Query::parse("  rust ");
        assert_eq!(q.segments().len(), 1);
        assert!(!q.wants_phrase_first());
    }

    #[test]
    fn unterminated_quote_takes_the_rest() {
        let q = Query::parse("\"open ended");
        assert_eq!(q.exact_terms(), vec!["open ended"]);
    }

    #[test]
    fn lone_dash_is_a_word() {
        let q = Query::parse("a - b");
        assert_eq!(q.text(), "a - b");
        assert!(q.excluded().is_empty());
        assert!(Query::parse("").is_empty());
    }
}
