// src/table/normalize.rs
//! Flattens raw database rows and page blocks into table rows.
//!
//! Database rows become one text cell per understood property. Page blocks
//! become a `block` cell holding the parsed content block, except images,
//! which are described by their source URL and optional local copy. While
//! scanning, the column schema is extended with every kind encountered.

use super::row::{Row, Table};
use super::schema::ColumnSchema;
use super::NotionTable;
use crate::api::{NotionTransport, ResourceKind};
use crate::config::TableConfig;
use crate::constants::{
    BLOCK_COLUMN, CHILDREN_COLUMN, IMAGE_DOWNLOAD_COLUMN, IMAGE_DOWNLOAD_FAILED,
    IMAGE_SOURCE_COLUMN,
};
use crate::error::AppError;
use crate::model::{ColumnKind, ContentBlock, PropertyValue};
use crate::types::{NotionId, ValidationError, Warning, WarningLevel};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// What to do with property or block kinds the table does not model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsupportedKindPolicy {
    /// Skip the value and record a warning on the table.
    #[default]
    Warn,
    /// Abort the load.
    Fail,
}

pub(crate) struct Normalizer<'a> {
    config: &'a TableConfig,
    transport: &'a Arc<dyn NotionTransport>,
}

/// Schema and warnings accumulated while scanning one batch of records.
struct Scan {
    schema: ColumnSchema,
    warnings: Vec<Warning>,
}

impl<'a> Normalizer<'a> {
    pub(crate) fn new(config: &'a TableConfig, transport: &'a Arc<dyn NotionTransport>) -> Self {
        Self { config, transport }
    }

    /// Normalizes `records` on top of `schema`.
    ///
    /// The returned table holds only the new rows; its schema is `schema`
    /// extended with whatever the records introduced.
    pub(crate) async fn normalize(
        &self,
        records: &[Value],
        schema: ColumnSchema,
    ) -> Result<Table, AppError> {
        let mut scan = Scan {
            schema,
            warnings: Vec::new(),
        };
        let mut rows = Vec::with_capacity(records.len());

        for raw in records {
            let row = match self.config.kind {
                ResourceKind::Database => self.database_row(raw, &mut scan).await?,
                ResourceKind::Page => self.page_row(raw, &mut scan).await?,
            };
            rows.push(row);
        }

        Ok(Table {
            rows,
            schema: scan.schema,
            warnings: scan.warnings,
        })
    }

    async fn database_row(&self, raw: &Value, scan: &mut Scan) -> Result<Row, AppError> {
        let mut row = Row::new(record_id(raw)?);
        let properties = raw["properties"].as_object().ok_or_else(|| {
            AppError::MalformedResponse(format!("database row {} without properties", row.id))
        })?;

        for (name, property) in properties {
            match PropertyValue::from_json(property) {
                Ok(value) => {
                    scan.schema.record(name, value.column_kind())?;
                    row.set(name.as_str(), value.to_cell_text());
                }
                Err(err) => {
                    self.tolerate(err, format!("column '{}' of row {}", name, row.id), scan)?
                }
            }
        }

        if self.config.recursive {
            self.attach_children(&mut row, scan).await?;
        }
        Ok(row)
    }

    async fn page_row(&self, raw: &Value, scan: &mut Scan) -> Result<Row, AppError> {
        let mut row = Row::new(record_id(raw)?);

        if raw["type"].as_str() == Some("image") {
            self.image_cells(raw, &mut row, scan).await?;
        } else {
            match ContentBlock::from_json(raw) {
                Ok(block) => row.set(BLOCK_COLUMN, block),
                Err(err) => self.tolerate(err, format!("block {}", row.id), scan)?,
            }
        }

        if self.config.recursive && raw["has_children"].as_bool().unwrap_or(false) {
            self.attach_children(&mut row, scan).await?;
        }
        Ok(row)
    }

    async fn image_cells(&self, raw: &Value, row: &mut Row, scan: &mut Scan) -> Result<(), AppError> {
        let image = &raw["image"];
        let url = image["file"]["url"]
            .as_str()
            .or_else(|| image["external"]["url"].as_str())
            .ok_or_else(|| {
                AppError::MalformedResponse(format!("image block {} without url", row.id))
            })?;
        let file_name = image_file_name(url)?;
        row.set(IMAGE_SOURCE_COLUMN, url);

        if let Some(dir) = &self.config.download_dir {
            let cell = match self.transport.download(url).await {
                Ok(bytes) => save_image(dir, &file_name, &bytes)
                    .await?
                    .display()
                    .to_string(),
                Err(err) => {
                    log::warn!("Could not download image {}: {}", url, err);
                    IMAGE_DOWNLOAD_FAILED.to_string()
                }
            };
            row.set(IMAGE_DOWNLOAD_COLUMN, cell);
        }

        scan.schema.record(&file_name, ColumnKind::Image)
    }

    /// Fetches the page table of `row` and stores it under the children
    /// column, nesting its schema under the row identifier.
    async fn attach_children(&self, row: &mut Row, scan: &mut Scan) -> Result<(), AppError> {
        let child_id = NotionId::parse(&row.id)?;
        log::debug!("Fetching nested content of {}", child_id);

        let mut child = NotionTable::with_transport(
            self.config.child(child_id),
            self.transport.child_session()?,
        );
        let child_table = Box::pin(child.get_table()).await?;

        scan.schema.nest(&row.id, child_table.schema.clone());
        row.set(CHILDREN_COLUMN, child_table);
        Ok(())
    }

    /// Applies the unsupported-kind policy to `err`; any other error passes
    /// through.
    fn tolerate(&self, err: AppError, context: String, scan: &mut Scan) -> Result<(), AppError> {
        match (&err, self.config.unsupported_kinds) {
            (AppError::UnsupportedKind { kind, context: what }, UnsupportedKindPolicy::Warn) => {
                log::warn!("Skipping unsupported {} kind '{}' in {}", what, kind, context);
                scan.warnings.push(
                    Warning::new(
                        WarningLevel::Warning,
                        format!("unsupported {} kind '{}'", what, kind),
                    )
                    .with_context(context),
                );
                Ok(())
            }
            _ => Err(err),
        }
    }
}

fn record_id(raw: &Value) -> Result<String, AppError> {
    raw["id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AppError::MalformedResponse("record without 'id'".to_string()))
}

/// Last path segment of an image URL, query string excluded.
pub fn image_file_name(url: &str) -> Result<String, AppError> {
    let parsed = Url::parse(url).map_err(|e| ValidationError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::from(ValidationError::InvalidUrl {
                url: url.to_string(),
                reason: "no file name in path".to_string(),
            })
        })
}

async fn save_image(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes).await?;
    log::debug!("Saved image to {}", path.display());
    Ok(path)
}
