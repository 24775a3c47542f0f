//! Portable Text conversion
//!
//! - Markdown subset to Portable Text, used when an editor accepts an
//!   AI-generated article body
//! - Portable Text to plain text, fed to the AI endpoints
//! - Portable Text to HTML, used by the article page
//!
//! # Example
//!
//! ```
//! use almas::services::portable_text::{extract_plain_text, markdown_to_blocks};
//!
//! let blocks = markdown_to_blocks("## Respirar\n\nInhala **profundo**.");
//! assert_eq!(blocks.len(), 2);
//! assert_eq!(extract_plain_text(&blocks), "Respirar\nInhala profundo.");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Block, MarkDef, PortableTextBlock, Span};
use crate::services::images::ImageUrlBuilder;

/// Inline image size inside article bodies
pub const INLINE_IMAGE_WIDTH: u32 = 960;
pub const INLINE_IMAGE_HEIGHT: u32 = 540;

static INLINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*|\*(.+?)\*").unwrap());
static NUMBERED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+\.\s+(.+)$").unwrap());

/// Fresh 8-character key for blocks, spans and mark definitions
pub fn random_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[derive(Debug, PartialEq, Eq)]
enum InlineToken<'a> {
    Text(&'a str),
    Bold(&'a str),
    Italic(&'a str),
}

/// Split a line into plain, `**bold**` and `*italic*` runs
fn tokenize_inline(text: &str) -> Vec<InlineToken<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in INLINE_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            tokens.push(InlineToken::Text(&text[last..whole.start()]));
        }
        if let Some(bold) = caps.get(1) {
            tokens.push(InlineToken::Bold(bold.as_str()));
        } else if let Some(italic) = caps.get(2) {
            tokens.push(InlineToken::Italic(italic.as_str()));
        }
        last = whole.end();
    }

    if last < text.len() {
        tokens.push(InlineToken::Text(&text[last..]));
    }
    tokens
}

fn build_block(text: &str, style: &str, list_item: Option<&str>, next_key: &mut dyn FnMut() -> String) -> Block {
    let mut children = Vec::new();
    let mut mark_defs = Vec::new();

    for token in tokenize_inline(text) {
        match token {
            InlineToken::Text(value) => children.push(Span {
                key: next_key(),
                text: value.to_string(),
                ..Span::default()
            }),
            InlineToken::Bold(value) | InlineToken::Italic(value) => {
                let kind = if matches!(token, InlineToken::Bold(_)) { "strong" } else { "em" };
                let mark_key = next_key();
                mark_defs.push(MarkDef {
                    key: mark_key.clone(),
                    kind: kind.to_string(),
                    ..MarkDef::default()
                });
                children.push(Span {
                    key: next_key(),
                    text: value.to_string(),
                    marks: vec![mark_key],
                    ..Span::default()
                });
            }
        }
    }

    if children.is_empty() {
        children.push(Span {
            key: next_key(),
            ..Span::default()
        });
    }

    Block {
        key: next_key(),
        style: style.to_string(),
        list_item: list_item.map(str::to_string),
        level: list_item.map(|_| 1),
        mark_defs,
        children,
        ..Block::default()
    }
}

/// Parse markdown-like text into Portable Text blocks
///
/// One block per non-blank line: `## ` h2, `### ` h3, `> ` blockquote,
/// `- ` or `• ` bullet item, `1. ` numbered item, anything else a paragraph.
/// Never fails; unrecognised syntax is kept as paragraph text.
pub fn markdown_to_blocks(markdown: &str) -> Vec<PortableTextBlock> {
    markdown_to_blocks_with_keys(markdown, &mut random_key)
}

/// [`markdown_to_blocks`] with a caller-supplied key generator
pub fn markdown_to_blocks_with_keys(
    markdown: &str,
    next_key: &mut dyn FnMut() -> String,
) -> Vec<PortableTextBlock> {
    let mut blocks = Vec::new();

    for raw_line in markdown.split('\n') {
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let block = if trimmed.starts_with("## ") && !trimmed.starts_with("### ") {
            build_block(trimmed[3..].trim(), "h2", None, next_key)
        } else if let Some(rest) = trimmed.strip_prefix("### ") {
            build_block(rest.trim(), "h3", None, next_key)
        } else if let Some(rest) = trimmed.strip_prefix("> ") {
            build_block(rest.trim(), "blockquote", None, next_key)
        } else if let Some(rest) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("• ")) {
            build_block(rest.trim(), "normal", Some("bullet"), next_key)
        } else if let Some(caps) = NUMBERED_RE.captures(trimmed) {
            let item = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            build_block(item.trim(), "normal", Some("number"), next_key)
        } else {
            build_block(trimmed, "normal", None, next_key)
        };

        blocks.push(PortableTextBlock::Block(block));
    }

    blocks
}

/// Plain text of the text blocks, one line per block
pub fn extract_plain_text(blocks: &[PortableTextBlock]) -> String {
    blocks
        .iter()
        .filter_map(PortableTextBlock::as_block)
        .map(Block::plain_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escape text for HTML element content and attribute values
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Renders Portable Text as semantic HTML
#[derive(Debug, Clone)]
pub struct PortableTextRenderer {
    images: ImageUrlBuilder,
}

impl PortableTextRenderer {
    pub fn new(images: ImageUrlBuilder) -> Self {
        Self { images }
    }

    /// Render a body; consecutive list items are grouped into lists
    pub fn render(&self, blocks: &[PortableTextBlock]) -> String {
        let mut html = String::new();
        // Open lists: (list kind, level)
        let mut open_lists: Vec<(String, u32)> = Vec::new();

        for block in blocks {
            match block {
                PortableTextBlock::Block(b) if b.list_item.is_some() => {
                    let kind = b.list_item.clone().unwrap_or_default();
                    let level = b.level.unwrap_or(1).max(1);

                    while let Some((top_kind, top_level)) = open_lists.last() {
                        if *top_level > level || (*top_level == level && *top_kind != kind) {
                            let (closed_kind, _) = open_lists.pop().unwrap_or_default();
                            html.push_str("</li>");
                            html.push_str(list_close_tag(&closed_kind));
                        } else {
                            break;
                        }
                    }

                    match open_lists.last() {
                        Some((_, top_level)) if *top_level == level => html.push_str("</li>"),
                        _ => {
                            html.push_str(list_open_tag(&kind));
                            open_lists.push((kind, level));
                        }
                    }

                    html.push_str("<li>");
                    html.push_str(&self.render_children(b));
                }
                other => {
                    close_all(&mut open_lists, &mut html);
                    html.push_str(&self.render_block(other));
                }
            }
        }

        close_all(&mut open_lists, &mut html);
        html
    }

    fn render_block(&self, block: &PortableTextBlock) -> String {
        match block {
            PortableTextBlock::Block(b) => {
                let tag = match b.style.as_str() {
                    "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" => b.style.as_str(),
                    _ => "p",
                };
                format!("<{tag}>{}</{tag}>", self.render_children(b))
            }
            PortableTextBlock::Other(value) if block.block_type() == "image" => {
                let asset_ref = value
                    .get("asset")
                    .and_then(|a| a.get("_ref"))
                    .and_then(|r| r.as_str())
                    .unwrap_or("");
                let url = self
                    .images
                    .url_for_ref(asset_ref, INLINE_IMAGE_WIDTH, INLINE_IMAGE_HEIGHT);
                if url.is_empty() {
                    return String::new();
                }

                let alt = value.get("alt").and_then(|a| a.as_str()).unwrap_or("");
                let mut html = format!(
                    r#"<figure><img src="{}" alt="{}" width="{}" height="{}" loading="lazy">"#,
                    html_escape(&url),
                    html_escape(alt),
                    INLINE_IMAGE_WIDTH,
                    INLINE_IMAGE_HEIGHT
                );
                if !alt.is_empty() {
                    html.push_str(&format!("<figcaption>{}</figcaption>", html_escape(alt)));
                }
                html.push_str("</figure>");
                html
            }
            PortableTextBlock::Other(_) => String::new(),
        }
    }

    fn render_children(&self, block: &Block) -> String {
        block
            .children
            .iter()
            .map(|span| render_span(block, span))
            .collect()
    }
}

fn render_span(block: &Block, span: &Span) -> String {
    let mut html = html_escape(&span.text).replace('\n', "<br/>");

    // First mark is outermost
    for mark in span.marks.iter().rev() {
        let (open, close) = match block.mark_def(mark) {
            Some(def) => annotation_tags(def),
            None => decorator_tags(mark),
        };
        html = format!("{}{}{}", open, html, close);
    }
    html
}

fn decorator_tags(decorator: &str) -> (String, String) {
    let (open, close) = match decorator {
        "strong" => ("<strong>", "</strong>"),
        "em" => ("<em>", "</em>"),
        "code" => ("<code>", "</code>"),
        "underline" => (r#"<span style="text-decoration:underline">"#, "</span>"),
        "strike-through" => ("<del>", "</del>"),
        _ => ("", ""),
    };
    (open.to_string(), close.to_string())
}

fn annotation_tags(def: &MarkDef) -> (String, String) {
    match def.kind.as_str() {
        "link" => {
            let href = def.href.as_deref().unwrap_or("");
            let external = if href.starts_with("http") {
                r#" target="_blank" rel="noopener noreferrer""#
            } else {
                ""
            };
            (format!(r#"<a href="{}"{}>"#, html_escape(href), external), "</a>".to_string())
        }
        "internalLink" => {
            let href = def
                .slug_str()
                .map(|s| format!("/{}", s))
                .unwrap_or_else(|| "#".to_string());
            (format!(r#"<a href="{}">"#, html_escape(&href)), "</a>".to_string())
        }
        other => decorator_tags(other),
    }
}

fn list_open_tag(kind: &str) -> &'static str {
    if kind == "number" {
        "<ol>"
    } else {
        "<ul>"
    }
}

fn list_close_tag(kind: &str) -> &'static str {
    if kind == "number" {
        "</ol>"
    } else {
        "</ul>"
    }
}

fn close_all(open_lists: &mut Vec<(String, u32)>, html: &mut String) {
    while let Some((kind, _)) = open_lists.pop() {
        html.push_str("</li>");
        html.push_str(list_close_tag(&kind));
    }
}
