// src/table/translate.rs
//! Turns cell values back into Notion property payloads.

use super::schema::{ColumnSchema, SchemaEntry};
use crate::error::AppError;
use crate::model::ColumnKind;
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

/// Property payload writing `value` into a column of `kind`, or `None` for
/// kinds the service computes itself.
pub fn property_payload(kind: ColumnKind, value: &str) -> Option<Value> {
    match kind {
        ColumnKind::Title => Some(json!({
            "title": [text_run(value)],
        })),
        ColumnKind::Text => Some(json!({
            "type": "rich_text",
            "rich_text": [text_run(value)],
        })),
        ColumnKind::Url => Some(json!({
            "type": "url",
            "url": stored_text(kind, value),
        })),
        ColumnKind::UniqueId | ColumnKind::Image => None,
    }
}

/// The value the service reports back after `value` was written.
///
/// Notion rejects an empty url, so it is written and read back as a single
/// space.
pub fn stored_text(kind: ColumnKind, value: &str) -> String {
    match kind {
        ColumnKind::Url if value.is_empty() => " ".to_string(),
        _ => value.to_string(),
    }
}

fn text_run(value: &str) -> Value {
    json!({
        "type": "text",
        "text": { "content": value },
        "plain_text": value,
    })
}

/// Looks up the plain column kind of `column`, rejecting unknown names and
/// nested schemas.
pub fn writable_kind(schema: &ColumnSchema, column: &str) -> Result<ColumnKind, AppError> {
    match schema.get(column) {
        Some(SchemaEntry::Column(kind)) => Ok(*kind),
        Some(SchemaEntry::Nested(_)) => Err(AppError::UnsupportedKind {
            kind: "nested table".to_string(),
            context: format!("column '{}'", column),
        }),
        None => Err(AppError::UnknownColumn(column.to_string())),
    }
}

/// `properties` object of an update call writing `values`.
pub fn update_properties(
    schema: &ColumnSchema,
    values: &IndexMap<String, String>,
) -> Result<Map<String, Value>, AppError> {
    let mut properties = Map::new();
    for (column, value) in values {
        let kind = writable_kind(schema, column)?;
        match property_payload(kind, value) {
            Some(payload) => {
                properties.insert(column.clone(), payload);
            }
            None => log::debug!("Column '{}' ({}) is not writable, skipped", column, kind),
        }
    }
    Ok(properties)
}

/// `properties` object of an insert call: every writable column of the
/// schema, with the supplied value or empty text.
pub fn insert_properties(
    schema: &ColumnSchema,
    data: &IndexMap<String, String>,
) -> Result<Map<String, Value>, AppError> {
    for column in data.keys() {
        writable_kind(schema, column)?;
    }

    let properties = schema
        .columns()
        .filter_map(|(column, kind)| {
            let value = data.get(column).map(String::as_str).unwrap_or("");
            property_payload(kind, value).map(|payload| (column.to_string(), payload))
        })
        .collect();
    Ok(properties)
}
