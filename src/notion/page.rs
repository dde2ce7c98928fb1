//! Document builder: typed blocks to Notion page-creation JSON.
//!
//! | Block | Notion type | Payload |
//! |-------|-------------|---------|
//! | `Heading1..3` | `heading_1..3` | `rich_text` |
//! | `BulletedItem` | `bulleted_list_item` | `rich_text` |
//! | `NumberedItem` | `numbered_list_item` | `rich_text` |
//! | `Quote` | `quote` | `rich_text` |
//! | `Callout` | `callout` | `rich_text`, emoji `icon` |
//! | `Divider` | `divider` | `{}` |
//! | `Code` | `code` | literal `rich_text`, `language` |
//! | `Todo` | `to_do` | `rich_text`, `checked` |
//! | `Paragraph` | `paragraph` | `rich_text` |

use crate::transpile::{Block, Span, SpanStyle};
use serde_json::{Value, json};

/// Most children the API accepts in one request.
pub const MAX_CHILDREN_PER_REQUEST: usize = 100;

/// Most characters the API accepts in one rich-text run.
pub const MAX_TEXT_LENGTH: usize = 2000;

/// A page-creation body plus the children that did not fit in it.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// `{parent, properties, children}` with at most
    /// [`MAX_CHILDREN_PER_REQUEST`] children.
    pub body: Value,
    /// Children to append after the page exists, in order.
    pub overflow: Vec<Value>,
}

/// Split `content` into pieces of at most [`MAX_TEXT_LENGTH`] characters.
fn split_text(content: &str) -> Vec<String> {
    if content.chars().count() <= MAX_TEXT_LENGTH {
        return vec![content.to_string()];
    }
    content
        .chars()
        .collect::<Vec<_>>()
        .chunks(MAX_TEXT_LENGTH)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn text_run(content: &str, span: &Span) -> Value {
    let mut text = json!({ "content": content });
    if let Some(url) = &span.link {
        text["link"] = json!({ "url": url });
    }
    json!({
        "type": "text",
        "text": text,
        "annotations": {
            "bold": span.style == SpanStyle::Bold,
            "italic": span.style == SpanStyle::Italic,
            "code": span.style == SpanStyle::Code,
        },
    })
}

/// Map spans to rich-text runs. Spans longer than the API limit become
/// several runs with the same styling.
pub fn rich_text(spans: &[Span]) -> Vec<Value> {
    spans
        .iter()
        .flat_map(|span| {
            split_text(&span.content)
                .into_iter()
                .map(move |piece| text_run(&piece, span))
        })
        .collect()
}

fn typed(kind: &str, payload: Value) -> Value {
    json!({ "object": "block", "type": kind, kind: payload })
}

/// Map one block to its Notion block object.
pub fn block_object(block: &Block) -> Value {
    match block {
        Block::Heading1 { spans } => typed("heading_1", json!({ "rich_text": rich_text(spans) })),
        Block::Heading2 { spans } => typed("heading_2", json!({ "rich_text": rich_text(spans) })),
        Block::Heading3 { spans } => typed("heading_3", json!({ "rich_text": rich_text(spans) })),
        Block::BulletedItem { spans } => {
            typed("bulleted_list_item", json!({ "rich_text": rich_text(spans) }))
        }
        Block::NumberedItem { spans } => {
            typed("numbered_list_item", json!({ "rich_text": rich_text(spans) }))
        }
        Block::Quote { spans } => typed("quote", json!({ "rich_text": rich_text(spans) })),
        Block::Callout { spans, icon } => typed(
            "callout",
            json!({
                "rich_text": rich_text(spans),
                "icon": { "type": "emoji", "emoji": icon },
            }),
        ),
        Block::Divider => typed("divider", json!({})),
        Block::Code { language, content } => typed(
            "code",
            json!({
                "rich_text": rich_text(&[Span::plain(content.as_str())]),
                "language": language,
            }),
        ),
        Block::Todo { spans, checked } => typed(
            "to_do",
            json!({ "rich_text": rich_text(spans), "checked": checked }),
        ),
        Block::Paragraph { spans } => typed("paragraph", json!({ "rich_text": rich_text(spans) })),
    }
}

/// Assemble the page-creation request for `blocks` under the parent page.
pub fn build_page_request(parent_page_id: &str, title: &str, blocks: &[Block]) -> PageRequest {
    let mut children: Vec<Value> = blocks.iter().map(block_object).collect();
    let overflow = if children.len() > MAX_CHILDREN_PER_REQUEST {
        children.split_off(MAX_CHILDREN_PER_REQUEST)
    } else {
        Vec::new()
    };

    let body = json!({
        "parent": { "page_id": parent_page_id },
        "properties": {
            "title": [{ "type": "text", "text": { "content": title } }],
        },
        "children": children,
    });
    PageRequest { body, overflow }
}
