// src/types/rich_text.rs
//! Rich-text runs as typed values.
//!
//! Runs go over the wire as flat objects keyed by `type`; internally the
//! variant data lives in [`RichTextType`] so a mention can never lack its
//! mention payload.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The kind of rich text content.
#[derive(Debug, Clone, PartialEq)]
pub enum RichTextType {
    Text { content: String, link: Option<Link> },
    Mention(MentionData),
    Equation { expression: String },
}

/// What a mention run points at.
#[derive(Debug, Clone, PartialEq)]
pub enum MentionData {
    /// An unfurled link, e.g. a GitHub issue preview.
    LinkPreview { url: String },
    /// Any other mention kind, kept verbatim so it can be written back.
    Other { kind: String, data: Value },
}

/// One styled fragment of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireRun", into = "WireRun")]
pub struct RichTextItem {
    pub text_type: RichTextType,
    pub annotations: Annotations,
    pub plain_text: String,
    pub href: Option<String>,
}

impl RichTextItem {
    /// A plain text run without styling.
    pub fn plain_text(text: &str) -> Self {
        Self {
            text_type: RichTextType::Text {
                content: text.to_string(),
                link: None,
            },
            annotations: Annotations::default(),
            plain_text: text.to_string(),
            href: None,
        }
    }

    /// A text run linking to `url`.
    pub fn linked_text(text: &str, url: &str) -> Self {
        Self {
            text_type: RichTextType::Text {
                content: text.to_string(),
                link: Some(Link {
                    url: url.to_string(),
                }),
            },
            annotations: Annotations::default(),
            plain_text: text.to_string(),
            href: Some(url.to_string()),
        }
    }

    /// A mention run unfurling `url` as a link preview.
    pub fn link_preview_mention(url: &str) -> Self {
        Self {
            text_type: RichTextType::Mention(MentionData::LinkPreview {
                url: url.to_string(),
            }),
            annotations: Annotations::default(),
            plain_text: url.to_string(),
            href: Some(url.to_string()),
        }
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// The URL of a link-preview mention, if this run is one.
    pub fn link_preview_url(&self) -> Option<&str> {
        match &self.text_type {
            RichTextType::Mention(MentionData::LinkPreview { url }) => Some(url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: crate::types::Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireText {
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    link: Option<Link>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireEquation {
    expression: String,
}

/// Run shape as Notion sends and accepts it.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireRun {
    #[serde(rename = "type", default = "default_run_type")]
    run_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<WireText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mention: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    equation: Option<WireEquation>,
    #[serde(default)]
    annotations: Option<Annotations>,
    #[serde(default)]
    plain_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    href: Option<String>,
}

fn default_run_type() -> String {
    "text".to_string()
}

impl From<WireRun> for RichTextItem {
    fn from(wire: WireRun) -> Self {
        let text_type = match (wire.run_type.as_str(), wire.mention, wire.equation) {
            ("mention", Some(mention), _) => RichTextType::Mention(parse_mention(mention)),
            ("equation", _, Some(equation)) => RichTextType::Equation {
                expression: equation.expression,
            },
            _ => {
                let text = wire.text.unwrap_or(WireText {
                    content: wire.plain_text.clone(),
                    link: None,
                });
                RichTextType::Text {
                    content: text.content,
                    link: text.link,
                }
            }
        };

        Self {
            text_type,
            annotations: wire.annotations.unwrap_or_default(),
            plain_text: wire.plain_text,
            href: wire.href,
        }
    }
}

impl From<RichTextItem> for WireRun {
    fn from(item: RichTextItem) -> Self {
        let mut wire = WireRun {
            run_type: String::new(),
            text: None,
            mention: None,
            equation: None,
            annotations: Some(item.annotations),
            plain_text: item.plain_text,
            href: item.href,
        };

        match item.text_type {
            RichTextType::Text { content, link } => {
                wire.run_type = "text".to_string();
                wire.text = Some(WireText { content, link });
            }
            RichTextType::Mention(mention) => {
                wire.run_type = "mention".to_string();
                wire.mention = Some(mention_to_json(mention));
            }
            RichTextType::Equation { expression } => {
                wire.run_type = "equation".to_string();
                wire.equation = Some(WireEquation { expression });
            }
        }
        wire
    }
}

fn parse_mention(mention: Value) -> MentionData {
    let kind = mention
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if kind == "link_preview" {
        if let Some(url) = mention["link_preview"]["url"].as_str() {
            return MentionData::LinkPreview {
                url: url.to_string(),
            };
        }
    }
    MentionData::Other {
        kind,
        data: mention,
    }
}

fn mention_to_json(mention: MentionData) -> Value {
    match mention {
        MentionData::LinkPreview { url } => json!({
            "type": "link_preview",
            "link_preview": { "url": url },
        }),
        MentionData::Other { data, .. } => data,
    }
}

/// Concatenated plain text of a run list.
pub fn plain_text_of(runs: &[RichTextItem]) -> String {
    runs.iter().map(|r| r.plain_text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_text_run() {
        let run: RichTextItem = serde_json::from_value(json!({
            "type": "text",
            "text": {"content": "Hello", "link": {"url": "https://example.com"}},
            "annotations": {"bold": true, "italic": false, "strikethrough": false,
                            "underline": false, "code": false, "color": "red_background"},
            "plain_text": "Hello",
            "href": "https://example.com"
        }))
        .unwrap();

        assert_eq!(run.plain_text, "Hello");
        assert!(run.annotations.bold);
        assert_eq!(run.annotations.color, Color::RedBackground);
        assert_eq!(
            run.text_type,
            RichTextType::Text {
                content: "Hello".to_string(),
                link: Some(Link {
                    url: "https://example.com".to_string()
                }),
            }
        );
    }

    #[test]
    fn test_parse_link_preview_mention() {
        let run: RichTextItem = serde_json::from_value(json!({
            "type": "mention",
            "mention": {"type": "link_preview",
                        "link_preview": {"url": "https://github.com/rust-lang/rust/issues/1"}},
            "annotations": null,
            "plain_text": "https://github.com/rust-lang/rust/issues/1",
            "href": "https://github.com/rust-lang/rust/issues/1"
        }))
        .unwrap();

        assert_eq!(
            run.link_preview_url(),
            Some("https://github.com/rust-lang/rust/issues/1")
        );
        assert_eq!(run.annotations, Annotations::default());
    }

    #[test]
    fn test_other_mentions_are_kept_verbatim() {
        let raw = json!({"type": "user", "user": {"id": "u1"}});
        let run: RichTextItem = serde_json::from_value(json!({
            "type": "mention",
            "mention": raw.clone(),
            "plain_text": "@Ada"
        }))
        .unwrap();

        let written = serde_json::to_value(&run).unwrap();
        assert_eq!(written["mention"], raw);
        assert_eq!(written["type"], "mention");
    }

    #[test]
    fn test_linked_text_writes_link_and_href() {
        let written = serde_json::to_value(RichTextItem::linked_text("docs", "https://docs.rs")).unwrap();
        assert_eq!(written["text"]["link"]["url"], "https://docs.rs");
        assert_eq!(written["href"], "https://docs.rs");
        assert_eq!(written["plain_text"], "docs");
    }
}
