//! Inline span tokenizer.
//!
//! All four inline constructs are matched by one alternation, so the search is
//! a single leftmost-first scan: the earliest construct in the line wins and,
//! when two constructs start at the same offset, the alternation order decides
//! (bold, code, link, italic). Matches never overlap.

use super::{Span, SpanStyle};
use once_cell::sync::Lazy;
use regex::Regex;

static INLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\*\*(?P<bold>.+?)\*\*",
        r"|`(?P<code>[^`]+?)`",
        r"|\[(?P<link_text>[^\]]*?)\]\((?P<link_url>[^)]+?)\)",
        r"|\*(?P<italic>.+?)\*",
    ))
    .expect("inline pattern is valid")
});

/// Split one line of text into styled spans.
///
/// Unmatched text becomes [`SpanStyle::Plain`] spans. A line without any
/// markup comes back as exactly one plain span holding the whole line, so the
/// result is never empty.
pub fn tokenize(line: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut pos = 0;

    for caps in INLINE.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > pos {
            spans.push(Span::plain(&line[pos..whole.start()]));
        }

        let span = if let Some(m) = caps.name("bold") {
            Span::styled(m.as_str(), SpanStyle::Bold)
        } else if let Some(m) = caps.name("code") {
            Span::styled(m.as_str(), SpanStyle::Code)
        } else if let (Some(text), Some(url)) = (caps.name("link_text"), caps.name("link_url")) {
            Span::link(text.as_str(), url.as_str())
        } else if let Some(m) = caps.name("italic") {
            Span::styled(m.as_str(), SpanStyle::Italic)
        } else {
            Span::plain(whole.as_str())
        };
        spans.push(span);
        pos = whole.end();
    }

    if pos < line.len() {
        spans.push(Span::plain(&line[pos..]));
    }
    if spans.is_empty() {
        spans.push(Span::plain(line));
    }
    spans
}
