// src/model/content.rs
//! Typed page content: the blocks a page row carries in its `block` column.
//!
//! Every block knows its own identifier and its structural parent, parses
//! from the block JSON Notion returns, and produces the JSON fragment
//! Notion accepts when the block is appended or patched.

use crate::error::AppError;
use crate::types::{plain_text_of, RichTextItem};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Macro to reduce boilerplate in ContentBlock methods
macro_rules! match_all_blocks {
    ($self:expr, $pattern:pat => $result:expr) => {
        match $self {
            ContentBlock::Divider($pattern) => $result,
            ContentBlock::Mention($pattern) => $result,
            ContentBlock::LinkPreview($pattern) => $result,
            ContentBlock::Column($pattern) => $result,
            ContentBlock::ColumnList($pattern) => $result,
            ContentBlock::RichText($pattern) => $result,
        }
    };
}

/// Fields shared by every content block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlockCommon {
    /// Block identifier; empty for blocks not yet created remotely.
    pub id: String,
    /// Identifier of the page or block this block lives under.
    pub parent_id: String,
}

impl BlockCommon {
    pub fn new(id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
        }
    }

    /// Reads `id` and the parent reference (`parent.<parent.type>`) of a raw block.
    fn from_json(raw: &Value) -> Result<Self, AppError> {
        let id = raw["id"]
            .as_str()
            .ok_or_else(|| AppError::MalformedResponse("block without 'id'".to_string()))?;
        let parent = &raw["parent"];
        let parent_id = parent["type"]
            .as_str()
            .and_then(|kind| parent[kind].as_str())
            .unwrap_or_default();
        Ok(Self::new(id, parent_id))
    }
}

/// Horizontal rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividerBlock {
    pub common: BlockCommon,
}

/// A bulleted item whose only content is a link-preview mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionBlock {
    pub common: BlockCommon,
    pub url: String,
}

/// A full-width unfurled link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPreviewBlock {
    pub common: BlockCommon,
    pub url: String,
}

/// One column inside a column list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnBlock {
    pub common: BlockCommon,
}

/// Group of side-by-side columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnListBlock {
    pub common: BlockCommon,
}

/// Block kinds whose body is a rich-text run list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextBlockKind {
    Paragraph,
    #[serde(rename = "heading_1")]
    Heading1,
    #[serde(rename = "heading_2")]
    Heading2,
    #[serde(rename = "heading_3")]
    Heading3,
    BulletedListItem,
    NumberedListItem,
    Toggle,
    Quote,
    ToDo,
    Callout,
}

impl TextBlockKind {
    pub fn from_wire(kind: &str) -> Option<Self> {
        Some(match kind {
            "paragraph" => Self::Paragraph,
            "heading_1" => Self::Heading1,
            "heading_2" => Self::Heading2,
            "heading_3" => Self::Heading3,
            "bulleted_list_item" => Self::BulletedListItem,
            "numbered_list_item" => Self::NumberedListItem,
            "toggle" => Self::Toggle,
            "quote" => Self::Quote,
            "to_do" => Self::ToDo,
            "callout" => Self::Callout,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading1 => "heading_1",
            Self::Heading2 => "heading_2",
            Self::Heading3 => "heading_3",
            Self::BulletedListItem => "bulleted_list_item",
            Self::NumberedListItem => "numbered_list_item",
            Self::Toggle => "toggle",
            Self::Quote => "quote",
            Self::ToDo => "to_do",
            Self::Callout => "callout",
        }
    }
}

/// A block of one of the [`TextBlockKind`]s with its runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    pub common: BlockCommon,
    pub kind: TextBlockKind,
    pub runs: Vec<RichTextItem>,
}

/// Content of a page row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Divider(DividerBlock),
    Mention(MentionBlock),
    LinkPreview(LinkPreviewBlock),
    Column(ColumnBlock),
    ColumnList(ColumnListBlock),
    RichText(RichTextBlock),
}

impl ContentBlock {
    /// A new divider to append under `parent_id`.
    pub fn divider(parent_id: &str) -> Self {
        ContentBlock::Divider(DividerBlock {
            common: BlockCommon::new("", parent_id),
        })
    }

    /// A new text block to append under `parent_id`.
    pub fn text(kind: TextBlockKind, parent_id: &str, runs: Vec<RichTextItem>) -> Self {
        ContentBlock::RichText(RichTextBlock {
            common: BlockCommon::new("", parent_id),
            kind,
            runs,
        })
    }

    /// A new link preview to append under `parent_id`.
    pub fn link_preview(parent_id: &str, url: &str) -> Self {
        ContentBlock::LinkPreview(LinkPreviewBlock {
            common: BlockCommon::new("", parent_id),
            url: url.to_string(),
        })
    }

    /// A new bulleted mention of `url` to append under `parent_id`.
    pub fn mention(parent_id: &str, url: &str) -> Self {
        ContentBlock::Mention(MentionBlock {
            common: BlockCommon::new("", parent_id),
            url: url.to_string(),
        })
    }

    pub fn id(&self) -> &str {
        match_all_blocks!(self, b => &b.common.id)
    }

    pub fn parent_id(&self) -> &str {
        match_all_blocks!(self, b => &b.common.parent_id)
    }

    pub fn common_mut(&mut self) -> &mut BlockCommon {
        match_all_blocks!(self, b => &mut b.common)
    }

    /// Notion block type this value is written as.
    pub fn block_type(&self) -> &'static str {
        match self {
            ContentBlock::Divider(_) => "divider",
            ContentBlock::Mention(_) => "bulleted_list_item",
            ContentBlock::LinkPreview(_) => "link_preview",
            ContentBlock::Column(_) => "column",
            ContentBlock::ColumnList(_) => "column_list",
            ContentBlock::RichText(b) => b.kind.as_str(),
        }
    }

    /// Parses one entry of a block-children listing.
    ///
    /// Image blocks are not content blocks; they and every other kind
    /// without a variant here yield [`AppError::UnsupportedKind`].
    pub fn from_json(raw: &Value) -> Result<Self, AppError> {
        let block_type = raw["type"]
            .as_str()
            .ok_or_else(|| AppError::MalformedResponse("block without 'type'".to_string()))?;
        let common = BlockCommon::from_json(raw)?;

        match block_type {
            "divider" => Ok(ContentBlock::Divider(DividerBlock { common })),
            "column" => Ok(ContentBlock::Column(ColumnBlock { common })),
            "column_list" => Ok(ContentBlock::ColumnList(ColumnListBlock { common })),
            "link_preview" => {
                let url = raw["link_preview"]["url"].as_str().ok_or_else(|| {
                    AppError::MalformedResponse(format!("link_preview {} without url", common.id))
                })?;
                Ok(ContentBlock::LinkPreview(LinkPreviewBlock {
                    common,
                    url: url.to_string(),
                }))
            }
            other => {
                let kind = TextBlockKind::from_wire(other).ok_or_else(|| {
                    AppError::UnsupportedKind {
                        kind: other.to_string(),
                        context: "block".to_string(),
                    }
                })?;
                let runs: Vec<RichTextItem> = match raw[other].get("rich_text") {
                    Some(runs) => serde_json::from_value(runs.clone())?,
                    None => Vec::new(),
                };

                if let (TextBlockKind::BulletedListItem, [only]) = (kind, runs.as_slice()) {
                    if let Some(url) = only.link_preview_url() {
                        return Ok(ContentBlock::Mention(MentionBlock {
                            common,
                            url: url.to_string(),
                        }));
                    }
                }

                Ok(ContentBlock::RichText(RichTextBlock { common, kind, runs }))
            }
        }
    }

    /// The `{ "<type>": { ... } }` fragment used to patch this block.
    pub fn to_payload(&self) -> Value {
        let body = match self {
            ContentBlock::Divider(_) | ContentBlock::Column(_) | ContentBlock::ColumnList(_) => {
                json!({})
            }
            ContentBlock::LinkPreview(b) => json!({ "url": b.url }),
            ContentBlock::Mention(b) => json!({
                "rich_text": [RichTextItem::link_preview_mention(&b.url)],
            }),
            ContentBlock::RichText(b) => json!({ "rich_text": b.runs }),
        };

        let mut payload = Map::new();
        payload.insert(self.block_type().to_string(), body);
        Value::Object(payload)
    }

    /// The entry used in an append-children request.
    pub fn to_child_payload(&self) -> Value {
        let mut payload = self.to_payload();
        if let Value::Object(fields) = &mut payload {
            fields.insert("object".to_string(), json!("block"));
            fields.insert("type".to_string(), json!(self.block_type()));
        }
        payload
    }
}

impl fmt::Display for ContentBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentBlock::Divider(_) => write!(f, "---"),
            ContentBlock::Mention(b) => write!(f, "{}", b.url),
            ContentBlock::LinkPreview(b) => write!(f, "{}", b.url),
            ContentBlock::Column(_) => write!(f, "column"),
            ContentBlock::ColumnList(_) => write!(f, "column_list"),
            ContentBlock::RichText(b) => write!(f, "{}", plain_text_of(&b.runs)),
        }
    }
}
