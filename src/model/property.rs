// src/model/property.rs
//! Database property values and the column kinds inferred from them.

use crate::error::AppError;
use crate::types::RichTextItem;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Semantic kind inferred for a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Title,
    Text,
    Url,
    /// Auto-numbered `unique_id` property, rendered as `PREFIX-N`.
    UniqueId,
    /// Image block of a page, keyed by the image's file name.
    Image,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Title => "title",
            ColumnKind::Text => "text",
            ColumnKind::Url => "url",
            ColumnKind::UniqueId => "unique_id",
            ColumnKind::Image => "image",
        }
    }

    /// Whether values of this kind can be sent back in a property payload.
    pub fn is_writable(&self) -> bool {
        matches!(self, ColumnKind::Title | ColumnKind::Text | ColumnKind::Url)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unique ID data structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueIdData {
    pub number: Option<i64>,
    pub prefix: Option<String>,
}

/// A database property value of one of the kinds the table understands.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Title(Vec<RichTextItem>),
    RichText(Vec<RichTextItem>),
    Url(Option<String>),
    UniqueId(UniqueIdData),
}

impl PropertyValue {
    /// Parses a raw property object (`{"id": .., "type": .., "<type>": ..}`).
    ///
    /// Kinds without a variant yield [`AppError::UnsupportedKind`] carrying
    /// the declared type name.
    pub fn from_json(raw: &Value) -> Result<Self, AppError> {
        let kind = raw["type"]
            .as_str()
            .ok_or_else(|| AppError::MalformedResponse("property without 'type'".to_string()))?;
        let body = raw.get(kind).cloned().unwrap_or(Value::Null);

        match kind {
            "title" => Ok(PropertyValue::Title(runs_or_empty(body)?)),
            "rich_text" => Ok(PropertyValue::RichText(runs_or_empty(body)?)),
            "url" => Ok(PropertyValue::Url(body.as_str().map(str::to_string))),
            "unique_id" => Ok(PropertyValue::UniqueId(serde_json::from_value(body)?)),
            other => Err(AppError::UnsupportedKind {
                kind: other.to_string(),
                context: "property".to_string(),
            }),
        }
    }

    pub fn column_kind(&self) -> ColumnKind {
        match self {
            PropertyValue::Title(_) => ColumnKind::Title,
            PropertyValue::RichText(_) => ColumnKind::Text,
            PropertyValue::Url(_) => ColumnKind::Url,
            PropertyValue::UniqueId(_) => ColumnKind::UniqueId,
        }
    }

    /// Scalar rendering stored in the table cell.
    pub fn to_cell_text(&self) -> String {
        match self {
            PropertyValue::Title(runs) | PropertyValue::RichText(runs) => runs
                .first()
                .map(|run| run.plain_text.clone())
                .unwrap_or_default(),
            PropertyValue::Url(url) => url.clone().unwrap_or_default(),
            PropertyValue::UniqueId(UniqueIdData { number, prefix }) => {
                let number = number.map(|n| n.to_string()).unwrap_or_default();
                match prefix.as_deref() {
                    Some(prefix) if !prefix.is_empty() => format!("{}-{}", prefix, number),
                    _ => number,
                }
            }
        }
    }
}

fn runs_or_empty(body: Value) -> Result<Vec<RichTextItem>, AppError> {
    if body.is_null() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value(body)?)
}
