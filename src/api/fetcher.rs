// src/api/fetcher.rs
//! Retrieves the raw records of a database or a page.
//!
//! Databases are read through the query endpoint, honoring the configured
//! sort order; pages are read as their list of child blocks. Either way the
//! result is the concatenation of every result page in service order.

use super::pagination::fetch_all_pages;
use super::types::{ApiRequest, ApiResponse, PaginatedResponse};
use super::NotionTransport;
use crate::constants::NOTION_API_PAGE_SIZE;
use crate::error::AppError;
use crate::types::NotionId;
use serde_json::{json, Value};

/// What kind of resource a table is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceKind {
    #[default]
    Database,
    /// Rows are the page's child blocks.
    Page,
}

/// One sort criterion of a database query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub property: String,
    pub descending: bool,
}

impl SortKey {
    pub fn ascending(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            descending: false,
        }
    }

    pub fn descending(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            descending: true,
        }
    }

    fn to_payload(&self) -> Value {
        json!({
            "property": self.property,
            "direction": if self.descending { "descending" } else { "ascending" },
        })
    }
}

/// Everything needed to read one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPlan {
    pub id: NotionId,
    pub kind: ResourceKind,
    /// Ignored for pages.
    pub sorts: Vec<SortKey>,
    /// Follow cursors past the first result page.
    pub get_all: bool,
}

impl FetchPlan {
    fn request(&self, cursor: Option<&str>) -> ApiRequest {
        match self.kind {
            ResourceKind::Page => ApiRequest::list_children(&self.id, cursor),
            ResourceKind::Database => {
                let mut body = json!({ "page_size": NOTION_API_PAGE_SIZE });
                if !self.sorts.is_empty() {
                    body["sorts"] = Value::Array(self.sorts.iter().map(SortKey::to_payload).collect());
                }
                if let Some(cursor) = cursor {
                    body["start_cursor"] = json!(cursor);
                }
                ApiRequest::query_database(&self.id, body)
            }
        }
    }
}

/// Reads every raw record of the resource `plan` describes.
///
/// A non-success response on any page aborts the whole fetch with
/// [`AppError::Transport`]; no partial results are returned.
pub async fn fetch_records(
    transport: &dyn NotionTransport,
    plan: &FetchPlan,
) -> Result<Vec<Value>, AppError> {
    let result = fetch_all_pages(
        |cursor| async move {
            let request = plan.request(cursor.as_deref());
            let response = transport.send(&request).await?;
            parse_result_page(response)
        },
        plan.get_all,
    )
    .await?;

    log::info!(
        "Fetched {} records of {:?} {} ({} pages)",
        result.items.len(),
        plan.kind,
        plan.id,
        result.pages_fetched
    );
    Ok(result.items)
}

fn parse_result_page(response: ApiResponse<String>) -> Result<PaginatedResponse<Value>, AppError> {
    if !response.is_success() {
        return Err(AppError::transport(
            response.status.as_u16(),
            response.data,
            response.url,
        ));
    }
    Ok(serde_json::from_str(&response.data)?)
}
