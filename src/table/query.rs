// src/table/query.rs
//! Row selection and projection over a loaded table.

use super::row::{CellValue, Row, Table};
use crate::error::AppError;
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

/// How one column of a condition is tested.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Whole-value equality.
    Exact(String),
    /// Pattern found anywhere in the value.
    Pattern(Regex),
}

impl Matcher {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Matcher::Exact(expected) => value == expected,
            Matcher::Pattern(pattern) => pattern.is_match(value),
        }
    }
}

/// Conjunction of per-column matchers. Empty conditions match every row.
#[derive(Debug, Clone, Default)]
pub struct Condition {
    entries: Vec<(String, Matcher)>,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries
            .push((column.into(), Matcher::Exact(value.into())));
        self
    }

    /// Adds a regular expression test, compiling `pattern`.
    pub fn matches(self, column: impl Into<String>, pattern: &str) -> Result<Self, AppError> {
        Ok(self.regex(column, Regex::new(pattern)?))
    }

    pub fn regex(mut self, column: impl Into<String>, pattern: Regex) -> Self {
        self.entries.push((column.into(), Matcher::Pattern(pattern)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_satisfied_by(&self, row: &Row) -> bool {
        self.entries
            .iter()
            .all(|(column, matcher)| matcher.matches(&row.text(column)))
    }
}

/// Shape of a query answer, decided by how many columns were projected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    /// One column: its value per matching row.
    Values(Vec<CellValue>),
    /// Several columns: a sub-mapping per matching row.
    Records(Vec<IndexMap<String, CellValue>>),
    /// No projection: the matching rows themselves.
    Rows(Vec<Row>),
}

impl QueryResult {
    pub fn len(&self) -> usize {
        match self {
            QueryResult::Values(values) => values.len(),
            QueryResult::Records(records) => records.len(),
            QueryResult::Rows(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text of each value of a single-column answer.
    pub fn texts(&self) -> Vec<String> {
        match self {
            QueryResult::Values(values) => values.iter().map(ToString::to_string).collect(),
            QueryResult::Records(_) | QueryResult::Rows(_) => Vec::new(),
        }
    }
}

/// Linear scan of `table`, keeping rows that satisfy `condition`.
pub fn select(table: &Table, columns: &[&str], condition: &Condition) -> QueryResult {
    let matching = table.rows.iter().filter(|row| condition.is_satisfied_by(row));

    match columns {
        [] => QueryResult::Rows(matching.cloned().collect()),
        [column] => QueryResult::Values(matching.map(|row| row.value(column)).collect()),
        _ => QueryResult::Records(
            matching
                .map(|row| {
                    columns
                        .iter()
                        .map(|column| (column.to_string(), row.value(column)))
                        .collect()
                })
                .collect(),
        ),
    }
}
