// src/table/mod.rs
//! A Notion database or page exposed as a cached, queryable table.
//!
//! [`NotionTable`] fetches and normalizes its resource on first read and
//! answers every later read from memory. Mutations go to the service one
//! call per row and are mirrored into the cached table only for calls the
//! service accepted, so the cache never shows a write that did not happen.

mod cache;
mod normalize;
mod query;
mod row;
mod schema;
pub mod translate;

pub use cache::TableCache;
pub use normalize::{image_file_name, UnsupportedKindPolicy};
pub use query::{select, Condition, Matcher, QueryResult};
pub use row::{CellValue, Row, Table};
pub use schema::{ColumnSchema, SchemaEntry};

use crate::api::{
    fetch_records, ApiRequest, ApiResponse, NotionHttpClient, NotionTransport, PaginatedResponse,
    ResourceKind, RotatingIdentity,
};
use crate::config::TableConfig;
use crate::constants::{BLOCK_COLUMN, ID_COLUMN};
use crate::error::AppError;
use crate::model::ContentBlock;
use crate::types::{NotionId, ValidationError};
use indexmap::IndexMap;
use normalize::Normalizer;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Service answer to one mutation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationOutcome {
    /// Row, page or block the call addressed.
    pub target_id: String,
    pub status: u16,
    pub body: String,
}

impl MutationOutcome {
    fn new(target_id: impl Into<String>, response: ApiResponse<String>) -> Self {
        Self {
            target_id: target_id.into(),
            status: response.status.as_u16(),
            body: response.data,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Cached tabular view of one Notion resource.
pub struct NotionTable {
    config: TableConfig,
    transport: Arc<dyn NotionTransport>,
    cache: TableCache,
}

impl NotionTable {
    /// Opens a table over HTTP with the configured tokens.
    pub fn connect(config: TableConfig) -> Result<Self, AppError> {
        let identity = Arc::new(RotatingIdentity::new(config.tokens.clone())?);
        let client = NotionHttpClient::new(identity, config.transport)?;
        Ok(Self::with_transport(config, Arc::new(client)))
    }

    pub fn with_transport(config: TableConfig, transport: Arc<dyn NotionTransport>) -> Self {
        Self {
            config,
            transport,
            cache: TableCache::new(),
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Loads the table unless it is already cached.
    async fn loaded(&mut self) -> Result<&mut Table, AppError> {
        let config = &self.config;
        let transport = &self.transport;
        self.cache
            .get_or_load(|| load_table(config, transport))
            .await
    }

    /// Copy of the whole table.
    pub async fn get_table(&mut self) -> Result<Table, AppError> {
        Ok(self.loaded().await?.clone())
    }

    pub async fn column_schema(&mut self) -> Result<ColumnSchema, AppError> {
        Ok(self.loaded().await?.schema.clone())
    }

    pub async fn row_count(&mut self) -> Result<usize, AppError> {
        Ok(self.loaded().await?.len())
    }

    /// Drops the cached table; the next read fetches it again.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Projects `columns` of the rows satisfying `condition`.
    pub async fn query(
        &mut self,
        columns: &[&str],
        condition: &Condition,
    ) -> Result<QueryResult, AppError> {
        Ok(select(self.loaded().await?, columns, condition))
    }

    /// Creates a database row from `data`; unspecified writable columns are
    /// written empty.
    pub async fn insert(
        &mut self,
        data: &IndexMap<String, String>,
    ) -> Result<MutationOutcome, AppError> {
        if self.config.kind == ResourceKind::Page {
            return Err(AppError::UnsupportedKind {
                kind: "page".to_string(),
                context: "row insert target".to_string(),
            });
        }

        let properties = translate::insert_properties(&self.loaded().await?.schema, data)?;
        let body = json!({
            "parent": { "database_id": self.config.resource_id.to_hyphenated() },
            "properties": properties,
        });
        let response = self.transport.send(&ApiRequest::create_page(body)).await?;

        if !response.is_success() {
            log::warn!("Insert into {} rejected ({})", self.config.resource_id, response.status);
            return Ok(MutationOutcome::new("", response));
        }

        let record = serde_json::from_str::<Value>(&response.data).map_err(AppError::from);
        let target_id = record
            .as_ref()
            .ok()
            .and_then(|record| record["id"].as_str())
            .unwrap_or_default()
            .to_string();
        let absorbed = match record {
            Ok(record) => self.absorb_records(std::slice::from_ref(&record)).await,
            Err(err) => Err(err),
        };

        // The row exists remotely either way.
        if let Err(err) = absorbed {
            log::warn!("Could not mirror inserted row {} ({}), dropping cache", target_id, err);
            self.cache.invalidate();
        }
        log::info!("Inserted row {} into {}", target_id, self.config.resource_id);
        Ok(MutationOutcome::new(target_id, response))
    }

    /// Writes `values` to every row satisfying `condition`.
    pub async fn update(
        &mut self,
        values: &IndexMap<String, String>,
        condition: &Condition,
    ) -> Result<Vec<MutationOutcome>, AppError> {
        let (targets, properties, stored) = {
            let table = self.loaded().await?;
            let properties = translate::update_properties(&table.schema, values)?;
            let stored: Vec<(String, String)> = values
                .iter()
                .filter_map(|(column, value)| {
                    table
                        .schema
                        .kind_of(column)
                        .filter(|kind| kind.is_writable())
                        .map(|kind| (column.clone(), translate::stored_text(kind, value)))
                })
                .collect();
            (matching_ids(table, condition), properties, stored)
        };

        if properties.is_empty() {
            log::warn!("No writable column among {:?}, nothing to update", values.keys());
            return Ok(Vec::new());
        }

        let body = json!({ "properties": properties });
        let mut outcomes = Vec::with_capacity(targets.len());

        for row_id in targets {
            let response = self
                .transport
                .send(&ApiRequest::update_page(&row_id, body.clone()))
                .await?;
            let outcome = MutationOutcome::new(row_id, response);

            if outcome.is_success() {
                if let Some(row) = self
                    .cache
                    .get_mut()
                    .and_then(|table| table.row_mut(&outcome.target_id))
                {
                    for (column, value) in &stored {
                        row.set(column.as_str(), value.as_str());
                    }
                }
            } else {
                log::warn!("Update of row {} rejected ({})", outcome.target_id, outcome.status);
            }
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    /// Appends each value of `suffixes` to the current content of its column
    /// in every row satisfying `condition`.
    pub async fn append(
        &mut self,
        suffixes: &IndexMap<String, String>,
        condition: &Condition,
    ) -> Result<Vec<MutationOutcome>, AppError> {
        let targets: Vec<(String, IndexMap<String, String>)> = {
            let table = self.loaded().await?;
            table
                .rows
                .iter()
                .filter(|row| condition.is_satisfied_by(row))
                .map(|row| {
                    let values = suffixes
                        .iter()
                        .map(|(column, suffix)| {
                            (column.clone(), format!("{}{}", row.text(column), suffix))
                        })
                        .collect();
                    (row.id.clone(), values)
                })
                .collect()
        };

        let mut outcomes = Vec::with_capacity(targets.len());
        for (row_id, values) in targets {
            let by_id = Condition::new().eq(ID_COLUMN, row_id);
            outcomes.extend(self.update(&values, &by_id).await?);
        }
        Ok(outcomes)
    }

    /// Deletes every row satisfying `condition`.
    pub async fn delete(&mut self, condition: &Condition) -> Result<Vec<MutationOutcome>, AppError> {
        let targets = matching_ids(self.loaded().await?, condition);
        let mut outcomes = Vec::with_capacity(targets.len());

        for row_id in targets {
            outcomes.push(self.delete_block(&row_id).await?);
        }
        Ok(outcomes)
    }

    /// Appends `blocks` to the page they name as parent. All blocks must
    /// share the first block's parent.
    pub async fn insert_blocks(
        &mut self,
        blocks: &[ContentBlock],
    ) -> Result<MutationOutcome, AppError> {
        let parent = blocks
            .first()
            .ok_or(ValidationError::EmptyField("blocks"))?
            .parent_id()
            .to_string();
        let children: Vec<Value> = blocks.iter().map(ContentBlock::to_child_payload).collect();

        let response = self
            .transport
            .send(&ApiRequest::append_children(&parent, json!({ "children": children })))
            .await?;
        let outcome = MutationOutcome::new(parent, response);

        if outcome.is_success() && self.mirrors(&outcome.target_id) {
            let appended = serde_json::from_str::<PaginatedResponse<Value>>(&outcome.body)
                .map_err(AppError::from);
            let absorbed = match appended {
                Ok(listing) => self.absorb_records(&listing.results).await,
                Err(err) => Err(err),
            };
            if let Err(err) = absorbed {
                log::warn!("Could not mirror appended blocks ({}), dropping cache", err);
                self.cache.invalidate();
            }
        }
        Ok(outcome)
    }

    /// Rewrites the content of an existing block.
    pub async fn update_block(&mut self, block: &ContentBlock) -> Result<MutationOutcome, AppError> {
        let response = self
            .transport
            .send(&ApiRequest::update_block(block.id(), block.to_payload()))
            .await?;
        let outcome = MutationOutcome::new(block.id(), response);

        if outcome.is_success() {
            if let Some(row) = self
                .cache
                .get_mut()
                .and_then(|table| table.row_mut(block.id()))
            {
                if row.get(BLOCK_COLUMN).is_some() {
                    row.set(BLOCK_COLUMN, block.clone());
                }
            }
        } else {
            log::warn!("Update of block {} rejected ({})", block.id(), outcome.status);
        }
        Ok(outcome)
    }

    /// Deletes a block or page by identifier.
    pub async fn delete_block(&mut self, block_id: &str) -> Result<MutationOutcome, AppError> {
        let response = self
            .transport
            .send(&ApiRequest::delete_block(block_id))
            .await?;
        let outcome = MutationOutcome::new(block_id, response);

        if outcome.is_success() {
            if let Some(table) = self.cache.get_mut() {
                table.rows.retain(|row| row.id != block_id);
            }
        } else {
            log::warn!("Delete of {} rejected ({})", block_id, outcome.status);
        }
        Ok(outcome)
    }

    /// Whether blocks appended under `parent_id` are rows of the cached table.
    fn mirrors(&self, parent_id: &str) -> bool {
        self.config.kind == ResourceKind::Page
            && self.cache.is_loaded()
            && NotionId::parse(parent_id)
                .map(|id| id == self.config.resource_id)
                .unwrap_or(false)
    }

    /// Normalizes freshly created records and adds them to the cached table.
    async fn absorb_records(&mut self, records: &[Value]) -> Result<(), AppError> {
        let schema = self.loaded().await?.schema.clone();
        let added = Normalizer::new(&self.config, &self.transport)
            .normalize(records, schema)
            .await?;

        let table = self.loaded().await?;
        table.schema = added.schema;
        table.rows.extend(added.rows);
        table.warnings.extend(added.warnings);
        Ok(())
    }
}

async fn load_table(
    config: &TableConfig,
    transport: &Arc<dyn NotionTransport>,
) -> Result<Table, AppError> {
    let records = fetch_records(transport.as_ref(), &config.fetch_plan()).await?;
    let table = Normalizer::new(config, transport)
        .normalize(&records, ColumnSchema::new())
        .await?;

    log::info!(
        "Loaded {} rows, {} schema entries and {} warnings from {}",
        table.len(),
        table.schema.len(),
        table.warnings.len(),
        config.resource_id
    );
    Ok(table)
}

fn matching_ids(table: &Table, condition: &Condition) -> Vec<String> {
    table
        .rows
        .iter()
        .filter(|row| condition.is_satisfied_by(row))
        .map(|row| row.id.clone())
        .collect()
}
