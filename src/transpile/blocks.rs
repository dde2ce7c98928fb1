//! Line-oriented block scanner.
//!
//! Each non-blank line becomes exactly one block, except inside a code fence
//! where every line up to the closing fence is collected verbatim into a
//! single [`Block::Code`]. Recognition order per trimmed line:
//!
//! | Order | Construct | Marker |
//! |-------|-----------|--------|
//! | 1 | code fence | ```` ``` ```` + optional language |
//! | 2 | headings | `# `, `## `, `### ` |
//! | 3 | to-do | `- [ ] `, `- [x] `, `- [X] ` |
//! | 4 | bullet | `- `, `* ` |
//! | 5 | numbered | single digit (ASCII or full-width), `.`, space |
//! | 6 | quote | `> ` |
//! | 7 | callout | `>` followed by a non-space |
//! | 8 | divider | exactly `---` or `***` |
//! | 9 | paragraph | anything else |

use super::{Block, CALLOUT_ICON, PLAIN_TEXT_LANGUAGE, tokenize};

const FENCE: &str = "```";

/// Scan a markdown document into blocks, in source order.
///
/// Blank lines never produce blocks. An unterminated code fence swallows the
/// rest of the document into one code block.
pub fn scan(document: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut lines = document.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(info) = trimmed.strip_prefix(FENCE) {
            let language = match info.trim() {
                "" => PLAIN_TEXT_LANGUAGE.to_string(),
                lang => lang.to_string(),
            };
            let body: Vec<&str> = lines
                .by_ref()
                .take_while(|l| !l.trim().starts_with(FENCE))
                .collect();
            blocks.push(Block::Code {
                language,
                content: body.join("\n"),
            });
            continue;
        }

        blocks.push(scan_line(trimmed));
    }

    blocks
}

/// Classify one trimmed, non-blank line that is not a code fence.
fn scan_line(line: &str) -> Block {
    if let Some(rest) = line.strip_prefix("# ") {
        return Block::Heading1 { spans: tokenize(rest) };
    }
    if let Some(rest) = line.strip_prefix("## ") {
        return Block::Heading2 { spans: tokenize(rest) };
    }
    if let Some(rest) = line.strip_prefix("### ") {
        return Block::Heading3 { spans: tokenize(rest) };
    }
    if let Some((checked, rest)) = todo_item(line) {
        return Block::Todo {
            spans: tokenize(rest),
            checked,
        };
    }
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return Block::BulletedItem { spans: tokenize(rest) };
    }
    if let Some(rest) = numbered_item(line) {
        return Block::NumberedItem { spans: tokenize(rest) };
    }
    if let Some(rest) = line.strip_prefix("> ") {
        return Block::Quote { spans: tokenize(rest) };
    }
    if let Some(rest) = line.strip_prefix('>').filter(|r| !r.is_empty()) {
        // "> " was handled above, so `rest` starts with a non-space here.
        return Block::Callout {
            spans: tokenize(rest.trim()),
            icon: CALLOUT_ICON.to_string(),
        };
    }
    if line == "---" || line == "***" {
        return Block::Divider;
    }
    Block::Paragraph { spans: tokenize(line) }
}

fn todo_item(line: &str) -> Option<(bool, &str)> {
    if let Some(rest) = line.strip_prefix("- [ ] ") {
        return Some((false, rest));
    }
    line.strip_prefix("- [x] ")
        .or_else(|| line.strip_prefix("- [X] "))
        .map(|rest| (true, rest))
}

/// `1. item` style markers; only a single leading digit is recognised.
fn numbered_item(line: &str) -> Option<&str> {
    let mut chars = line.chars();
    chars.next().filter(|c| c.is_ascii_digit() || ('０'..='９').contains(c))?;
    chars.as_str().strip_prefix(". ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpile::{Span, SpanStyle};

    fn text(s: &str) -> Vec<Span> {
        vec![Span::plain(s)]
    }

    #[test]
    fn test_headings() {
        assert_eq!(
            scan("# One\n## Two\n### Three\n#### Four"),
            vec![
                Block::Heading1 { spans: text("One") },
                Block::Heading2 { spans: text("Two") },
                Block::Heading3 { spans: text("Three") },
                Block::Paragraph { spans: text("#### Four") },
            ]
        );
    }

    #[test]
    fn test_code_fence_capture() {
        assert_eq!(
            scan("```python\nx = 1\n```"),
            vec![Block::Code {
                language: "python".to_string(),
                content: "x = 1".to_string(),
            }]
        );
    }

    #[test]
    fn test_code_fence_keeps_lines_verbatim() {
        let doc = "```\n  indented\n\n# not a heading\n```\nafter";
        assert_eq!(
            scan(doc),
            vec![
                Block::Code {
                    language: PLAIN_TEXT_LANGUAGE.to_string(),
                    content: "  indented\n\n# not a heading".to_string(),
                },
                Block::Paragraph { spans: text("after") },
            ]
        );
    }

    #[test]
    fn test_unterminated_fence_swallows_rest() {
        assert_eq!(
            scan("intro\n```rust\nfn main() {}\n- still code"),
            vec![
                Block::Paragraph { spans: text("intro") },
                Block::Code {
                    language: "rust".to_string(),
                    content: "fn main() {}\n- still code".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_todo_case_handling() {
        assert_eq!(
            scan("- [x] done\n- [X] done\n- [ ] pending"),
            vec![
                Block::Todo { spans: text("done"), checked: true },
                Block::Todo { spans: text("done"), checked: true },
                Block::Todo { spans: text("pending"), checked: false },
            ]
        );
    }

    #[test]
    fn test_bullets_and_numbered_items() {
        assert_eq!(
            scan("- dash\n* star\n1. first\n10. tenth"),
            vec![
                Block::BulletedItem { spans: text("dash") },
                Block::BulletedItem { spans: text("star") },
                Block::NumberedItem { spans: text("first") },
                Block::Paragraph { spans: text("10. tenth") },
            ]
        );
    }

    #[test]
    fn test_full_width_numbered_items() {
        assert_eq!(
            scan("１. 項目\n９. last\n１．句点\n①. circled"),
            vec![
                Block::NumberedItem { spans: text("項目") },
                Block::NumberedItem { spans: text("last") },
                Block::Paragraph { spans: text("１．句点") },
                Block::Paragraph { spans: text("①. circled") },
            ]
        );
    }

    #[test]
    fn test_callout_vs_quote() {
        assert_eq!(
            scan("> note\n>!urgent\n>"),
            vec![
                Block::Quote { spans: text("note") },
                Block::Callout {
                    spans: text("!urgent"),
                    icon: CALLOUT_ICON.to_string(),
                },
                Block::Paragraph { spans: text(">") },
            ]
        );
    }

    #[test]
    fn test_dividers_ignore_surrounding_whitespace() {
        assert_eq!(scan("  ---  "), vec![Block::Divider]);
        assert_eq!(scan("\t***"), vec![Block::Divider]);
        assert_eq!(scan("----"), vec![Block::Paragraph { spans: text("----") }]);
    }

    #[test]
    fn test_blank_line_neutrality() {
        let dense = "# Title\n- item\n> quote\n---\ntext";
        let sparse = "\n\n# Title\n\n   \n- item\n\n> quote\n\t\n---\n\ntext\n\n";
        assert_eq!(scan(dense), scan(sparse));
        assert_eq!(scan(dense).len(), 5);
    }

    #[test]
    fn test_inline_markup_inside_blocks() {
        assert_eq!(
            scan("### [Title](https://example.com/a)\n**Zenn** | 2025-05-06 09:00"),
            vec![
                Block::Heading3 {
                    spans: vec![Span::link("Title", "https://example.com/a")],
                },
                Block::Paragraph {
                    spans: vec![
                        Span::styled("Zenn", SpanStyle::Bold),
                        Span::plain(" | 2025-05-06 09:00"),
                    ],
                },
            ]
        );
    }

    #[test]
    fn test_block_order_follows_source() {
        let doc = "1. one\n# two\n- three\n> four\n```\nfive\n```\nsix";
        let texts: Vec<String> = scan(doc).iter().map(Block::plain_text).collect();
        assert_eq!(texts, vec!["one", "two", "three", "four", "five", "six"]);
    }

    #[test]
    fn test_empty_document() {
        assert!(scan("").is_empty());
        assert!(scan("\n \n\t\n").is_empty());
    }
}
