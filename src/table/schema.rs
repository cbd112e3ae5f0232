// src/table/schema.rs
//! Column schema inferred while normalizing records.

use crate::error::AppError;
use crate::model::ColumnKind;
use indexmap::IndexMap;
use serde::Serialize;

/// What a schema knows about one name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SchemaEntry {
    Column(ColumnKind),
    /// Schema of the nested table fetched for the row with this identifier.
    Nested(ColumnSchema),
}

/// Ordered mapping from column name to its inferred kind.
///
/// Later records may add columns but never change the kind of one that is
/// already known.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ColumnSchema {
    entries: IndexMap<String, SchemaEntry>,
}

impl ColumnSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `column` holds values of `kind`.
    pub fn record(&mut self, column: &str, kind: ColumnKind) -> Result<(), AppError> {
        match self.entries.get(column) {
            None => {
                self.entries
                    .insert(column.to_string(), SchemaEntry::Column(kind));
                Ok(())
            }
            Some(SchemaEntry::Column(existing)) if *existing == kind => Ok(()),
            Some(SchemaEntry::Column(existing)) => Err(AppError::ColumnKindConflict {
                column: column.to_string(),
                existing: existing.to_string(),
                found: kind.to_string(),
            }),
            Some(SchemaEntry::Nested(_)) => Err(AppError::ColumnKindConflict {
                column: column.to_string(),
                existing: "nested table".to_string(),
                found: kind.to_string(),
            }),
        }
    }

    /// Stores the schema of the child table fetched for `row_id`.
    pub fn nest(&mut self, row_id: &str, child: ColumnSchema) {
        self.entries
            .insert(row_id.to_string(), SchemaEntry::Nested(child));
    }

    pub fn get(&self, column: &str) -> Option<&SchemaEntry> {
        self.entries.get(column)
    }

    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        match self.entries.get(column) {
            Some(SchemaEntry::Column(kind)) => Some(*kind),
            _ => None,
        }
    }

    /// Plain columns in discovery order, nested schemas skipped.
    pub fn columns(&self) -> impl Iterator<Item = (&str, ColumnKind)> {
        self.entries.iter().filter_map(|(name, entry)| match entry {
            SchemaEntry::Column(kind) => Some((name.as_str(), *kind)),
            SchemaEntry::Nested(_) => None,
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &SchemaEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
