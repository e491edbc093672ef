//! Bounded, HTML-safe previews around a match.

use serde::Serialize;
use thiserror::Error;

use crate::config::SearchSettings;
use crate::text::{collapse_line_breaks, escape_html, slice_chars};

const ELLIPSIS: char = '…';

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultExcerpt {
    pub excerpt: String,
    pub offset: usize,
}

#[derive(Debug, Error)]
pub enum ExcerptError {
    #[error("offset {offset} is past the end of the content ({len} chars)")]
    OffsetOutOfRange { offset: usize, len: usize },
}

/// Shows a short, non-fatal message to the user.
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Sends notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Builds the excerpt for `offset` (a char index into `content`).
///
/// Without an offset the excerpt is the start of the content. Never fails: on
/// error the excerpt is empty with offset 0, and `notifier` is told.
pub fn make_excerpt(
    content: &str,
    offset: Option<usize>,
    settings: &SearchSettings,
    notifier: &dyn Notifier,
) -> ResultExcerpt {
    match build_excerpt(content, offset, settings) {
        Ok(excerpt) => ResultExcerpt {
            excerpt,
            offset: offset.unwrap_or(0),
        },
        Err(e) => {
            tracing::error!(error = %e, "error while creating excerpt");
            notifier.notify("Error while creating excerpt, see the log for details");
            ResultExcerpt {
                excerpt: String::new(),
                offset: 0,
            }
        }
    }
}

fn build_excerpt(
    content: &str,
    offset: Option<usize>,
    settings: &SearchSettings,
) -> Result<String, ExcerptError> {
    let len = content.chars().count();
    let (from, to) = match offset {
        Some(pos) if pos > len => return Err(ExcerptError::OffsetOutOfRange { offset: pos, len }),
        Some(pos) => (
            pos.saturating_sub(settings.excerpt_before),
            len.min(pos + settings.excerpt_after),
        ),
        None => (0, len.min(settings.excerpt_after)),
    };

    let mut window = slice_chars(content, from, to);
    let mut start = from;

    // Cut back to the start of the match's line, using the raw line breaks.
    if settings.render_line_return_in_excerpts {
        if let Some(pos) = offset {
            let head = slice_chars(window, 0, pos - from);
            // A break at the very start of the window is left for the trim.
            if let Some(newline) = head.rfind('\n').filter(|&i| i > 0) {
                start += head[..=newline].chars().count();
                window = &window[newline + 1..];
            }
        }
    }

    let mut excerpt = String::with_capacity(window.len() + 8);
    if start > 0 {
        excerpt.push(ELLIPSIS);
    }
    excerpt.push_str(window.trim());
    if to < len {
        excerpt.push(ELLIPSIS);
    }

    if !settings.render_line_return_in_excerpts {
        return Ok(escape_html(&excerpt));
    }
    Ok(escape_html(&collapse_line_breaks(&excerpt)).replace('\n', "<br>"))
}
