//! Portable Text model
//!
//! Portable Text is the CMS's JSON rich-text format: an array of blocks, each
//! holding spans of text plus the mark definitions (links, emphasis) the spans
//! refer to by key. Only text blocks are modelled precisely; other block types
//! (images, embeds) are kept as raw JSON.

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// A single entry of a Portable Text array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortableTextBlock {
    /// A text block (`_type == "block"`)
    Block(Block),
    /// Any other typed object, such as an inline image
    Other(serde_json::Value),
}

impl PortableTextBlock {
    /// The `_type` of the block
    pub fn block_type(&self) -> &str {
        match self {
            PortableTextBlock::Block(_) => "block",
            PortableTextBlock::Other(value) => value.get("_type").and_then(|t| t.as_str()).unwrap_or(""),
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            PortableTextBlock::Block(block) => Some(block),
            PortableTextBlock::Other(_) => None,
        }
    }
}

impl From<Block> for PortableTextBlock {
    fn from(block: Block) -> Self {
        PortableTextBlock::Block(block)
    }
}

/// Discriminator that only accepts `"block"`, so untagged decoding sends
/// every other object type to [`PortableTextBlock::Other`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    #[default]
    #[serde(rename = "block")]
    Block,
}

/// Text block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(rename = "_type")]
    pub kind: BlockKind,
    #[serde(rename = "_key", default, deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(default = "default_style", deserialize_with = "style_or_normal")]
    pub style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mark_defs: Vec<MarkDef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<Span>,
}

fn default_style() -> String {
    "normal".to_string()
}

fn style_or_normal<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_style))
}

impl Block {
    /// Concatenated text of all spans
    pub fn plain_text(&self) -> String {
        self.children.iter().map(|c| c.text.as_str()).collect()
    }

    /// Look up the mark definition a span mark refers to
    pub fn mark_def(&self, key: &str) -> Option<&MarkDef> {
        self.mark_defs.iter().find(|d| d.key == key)
    }
}

/// Inline text run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    #[serde(rename = "_type", default = "default_span_type", deserialize_with = "span_type")]
    pub kind: String,
    #[serde(rename = "_key", default, deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub marks: Vec<String>,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            kind: default_span_type(),
            key: String::new(),
            text: String::new(),
            marks: Vec::new(),
        }
    }
}

fn default_span_type() -> String {
    "span".to_string()
}

fn span_type<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_span_type))
}

/// Mark definition: an annotation (link) or a keyed decorator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "_key", default, deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(rename = "_type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Internal link target; stored either as a plain string or a slug object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<serde_json::Value>,
}

impl MarkDef {
    /// Internal link slug as text, whichever shape it was stored in
    pub fn slug_str(&self) -> Option<&str> {
        match self.slug.as_ref()? {
            serde_json::Value::String(s) => Some(s.as_str()),
            serde_json::Value::Object(map) => map.get("current").and_then(|c| c.as_str()),
            _ => None,
        }
        .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_block_types_are_other() {
        let image: PortableTextBlock =
            serde_json::from_value(json!({ "_type": "image", "asset": { "_ref": "image-a-1x1-png" } })).unwrap();
        assert_eq!(image.block_type(), "image");
        assert!(image.as_block().is_none());
    }

    #[test]
    fn test_block_defaults() {
        let block: PortableTextBlock = serde_json::from_value(json!({
            "_type": "block",
            "style": null,
            "children": [{ "text": "Hola" }, { "_type": "span", "text": " mundo", "marks": ["strong"] }]
        }))
        .unwrap();

        let block = block.as_block().unwrap();
        assert_eq!(block.style, "normal");
        assert_eq!(block.plain_text(), "Hola mundo");
        assert_eq!(block.children[0].kind, "span");
        assert!(block.list_item.is_none());
    }

    #[test]
    fn test_serialize_omits_absent_list_fields() {
        let block = Block {
            key: "k1".to_string(),
            style: "h2".to_string(),
            children: vec![Span {
                key: "s1".to_string(),
                text: "Título".to_string(),
                ..Span::default()
            }],
            ..Block::default()
        };

        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["_type"], "block");
        assert_eq!(value["markDefs"], json!([]));
        assert!(value.get("listItem").is_none());
        assert!(value.get("level").is_none());
        assert_eq!(value["children"][0]["_type"], "span");
    }

    #[test]
    fn test_mark_def_slug_shapes() {
        let plain: MarkDef = serde_json::from_value(json!({ "_key": "m", "_type": "internalLink", "slug": "yoga" })).unwrap();
        let object: MarkDef =
            serde_json::from_value(json!({ "_key": "m", "_type": "internalLink", "slug": { "current": "yoga" } })).unwrap();
        let missing: MarkDef = serde_json::from_value(json!({ "_key": "m", "_type": "internalLink" })).unwrap();

        assert_eq!(plain.slug_str(), Some("yoga"));
        assert_eq!(object.slug_str(), Some("yoga"));
        assert_eq!(missing.slug_str(), None);
    }
}
