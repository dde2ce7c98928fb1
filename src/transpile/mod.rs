//! Markdown-to-block transpiler.
//!
//! Turns the markdown digest produced by the reporting stage into an ordered
//! list of typed [`Block`]s whose text is split into styled [`Span`]s. The
//! result is independent of any remote API; [`crate::notion::page`] maps it
//! onto the Notion request shape.
//!
//! # Stages
//!
//! - [`blocks::scan`]: line-oriented block scanner (headings, lists, quotes,
//!   callouts, fences, dividers, to-dos, paragraphs)
//! - [`inline::tokenize`]: inline tokenizer for bold, italic, inline code and links
//!
//! Both stages are total: malformed markdown degrades to paragraphs and plain
//! spans, never to an error.
//!
//! # Example
//!
//! ```ignore
//! let blocks = transpile::scan("# Title\n\n- **bold** item");
//! assert_eq!(blocks.len(), 2);
//! ```

use serde::Serialize;

pub mod blocks;
pub mod inline;

pub use blocks::scan;
pub use inline::tokenize;

/// Language recorded on a code block whose fence carries no language token.
pub const PLAIN_TEXT_LANGUAGE: &str = "plain text";

/// Icon attached to every callout block.
pub const CALLOUT_ICON: &str = "💡";

/// Style of a single text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanStyle {
    Plain,
    Bold,
    Italic,
    Code,
}

/// One run of text with a single style.
///
/// A span produced from `[display](target)` carries the target in `link` and
/// is always [`SpanStyle::Plain`]; styles never nest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub content: String,
    pub style: SpanStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Span {
    pub fn plain(content: impl Into<String>) -> Self {
        Self::styled(content, SpanStyle::Plain)
    }

    pub fn styled(content: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            content: content.into(),
            style,
            link: None,
        }
    }

    pub fn link(content: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            style: SpanStyle::Plain,
            link: Some(target.into()),
        }
    }
}

/// One structural unit of a transpiled document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Heading1 { spans: Vec<Span> },
    Heading2 { spans: Vec<Span> },
    Heading3 { spans: Vec<Span> },
    BulletedItem { spans: Vec<Span> },
    NumberedItem { spans: Vec<Span> },
    Quote { spans: Vec<Span> },
    Callout { spans: Vec<Span>, icon: String },
    Divider,
    /// Fenced code; `content` is the literal text between the fences.
    Code { language: String, content: String },
    Todo { spans: Vec<Span>, checked: bool },
    Paragraph { spans: Vec<Span> },
}

impl Block {
    /// The inline spans of this block, if it has any.
    ///
    /// Dividers have none; code blocks expose their literal content as a
    /// single plain span elsewhere, not here.
    pub fn spans(&self) -> Option<&[Span]> {
        match self {
            Block::Heading1 { spans }
            | Block::Heading2 { spans }
            | Block::Heading3 { spans }
            | Block::BulletedItem { spans }
            | Block::NumberedItem { spans }
            | Block::Quote { spans }
            | Block::Callout { spans, .. }
            | Block::Todo { spans, .. }
            | Block::Paragraph { spans } => Some(spans),
            Block::Divider | Block::Code { .. } => None,
        }
    }

    /// Visible text of the block with every markup marker stripped.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Code { content, .. } => content.clone(),
            _ => self
                .spans()
                .map(|spans| spans.iter().map(|s| s.content.as_str()).collect())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_joins_spans() {
        let block = Block::Paragraph {
            spans: vec![
                Span::styled("a", SpanStyle::Bold),
                Span::plain(" and "),
                Span::link("site", "http://x"),
            ],
        };
        assert_eq!(block.plain_text(), "a and site");
    }

    #[test]
    fn test_divider_has_no_spans() {
        assert!(Block::Divider.spans().is_none());
        assert_eq!(Block::Divider.plain_text(), "");
    }

    #[test]
    fn test_block_serializes_with_kind_tag() {
        let json = serde_json::to_value(Block::Todo {
            spans: vec![Span::plain("done")],
            checked: true,
        })
        .unwrap();
        assert_eq!(json["kind"], "todo");
        assert_eq!(json["checked"], true);
        assert_eq!(json["spans"][0]["style"], "plain");
        assert!(json["spans"][0].get("link").is_none());
    }
}
