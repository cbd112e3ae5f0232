// src/table/row.rs
//! Rows, cells and the normalized table they form.

use super::schema::ColumnSchema;
use crate::constants::ID_COLUMN;
use crate::model::ContentBlock;
use crate::types::Warning;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Value held in one cell of a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    /// Content block of a page row.
    Content(ContentBlock),
    /// Nested table fetched for a row when recursion is on.
    Table(Table),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&ContentBlock> {
        match self {
            CellValue::Content(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            CellValue::Table(table) => Some(table),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(text) => write!(f, "{}", text),
            CellValue::Content(block) => write!(f, "{}", block),
            CellValue::Table(table) => write!(f, "<{} rows>", table.len()),
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<ContentBlock> for CellValue {
    fn from(value: ContentBlock) -> Self {
        CellValue::Content(value)
    }
}

impl From<Table> for CellValue {
    fn from(value: Table) -> Self {
        CellValue::Table(value)
    }
}

/// One record of a table: the service identifier plus named cells.
///
/// Cells serialize under their own key so a user column called `id` never
/// collides with the identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub id: String,
    cells: IndexMap<String, CellValue>,
}

impl Row {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: IndexMap::new(),
        }
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// Owned value of `column`; the id column reads the row identifier and
    /// missing columns read as empty text.
    pub fn value(&self, column: &str) -> CellValue {
        if column == ID_COLUMN {
            return CellValue::Text(self.id.clone());
        }
        self.cells
            .get(column)
            .cloned()
            .unwrap_or_else(|| CellValue::Text(String::new()))
    }

    /// Text rendering of `column` used for matching and appending.
    pub fn text(&self, column: &str) -> String {
        if column == ID_COLUMN {
            return self.id.clone();
        }
        match self.cells.get(column) {
            Some(CellValue::Text(text)) => text.clone(),
            Some(CellValue::Content(block)) => block.to_string(),
            Some(CellValue::Table(_)) | None => String::new(),
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Normalized rows of one resource with their inferred schema.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    pub rows: Vec<Row>,
    pub schema: ColumnSchema,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, id: &str) -> Option<&Row> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn row_mut(&mut self, id: &str) -> Option<&mut Row> {
        self.rows.iter_mut().find(|row| row.id == id)
    }
}
