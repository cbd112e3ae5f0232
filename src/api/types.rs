// src/api/types.rs
//! Type definitions for the Notion API module.

use crate::constants::NOTION_API_PAGE_SIZE;
use crate::types::NotionId;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;

// --- API Request Types ---

/// One outbound call, independent of how it is transported.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, query string included.
    pub endpoint: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    /// `POST databases/{id}/query`
    pub fn query_database(database: &NotionId, body: Value) -> Self {
        Self {
            method: Method::POST,
            endpoint: format!("databases/{}/query", database.to_hyphenated()),
            body: Some(body),
        }
    }

    /// `GET blocks/{id}/children`, resuming at `start_cursor`.
    pub fn list_children(block: &NotionId, start_cursor: Option<&str>) -> Self {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("page_size", &NOTION_API_PAGE_SIZE.to_string());
        if let Some(cursor) = start_cursor {
            query.append_pair("start_cursor", cursor);
        }
        Self {
            method: Method::GET,
            endpoint: format!("blocks/{}/children?{}", block.to_hyphenated(), query.finish()),
            body: None,
        }
    }

    /// `POST pages`
    pub fn create_page(body: Value) -> Self {
        Self {
            method: Method::POST,
            endpoint: "pages".to_string(),
            body: Some(body),
        }
    }

    /// `PATCH pages/{id}`
    pub fn update_page(page_id: &str, body: Value) -> Self {
        Self {
            method: Method::PATCH,
            endpoint: format!("pages/{}", page_id),
            body: Some(body),
        }
    }

    /// `PATCH blocks/{id}`
    pub fn update_block(block_id: &str, body: Value) -> Self {
        Self {
            method: Method::PATCH,
            endpoint: format!("blocks/{}", block_id),
            body: Some(body),
        }
    }

    /// `PATCH blocks/{id}/children`
    pub fn append_children(block_id: &str, body: Value) -> Self {
        Self {
            method: Method::PATCH,
            endpoint: format!("blocks/{}/children", block_id),
            body: Some(body),
        }
    }

    /// `DELETE blocks/{id}`
    pub fn delete_block(block_id: &str) -> Self {
        Self {
            method: Method::DELETE,
            endpoint: format!("blocks/{}", block_id),
            body: None,
        }
    }
}

// --- API Response Types ---

/// Result of an HTTP operation with response metadata.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: StatusCode,
    pub url: String,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Generic paginated response from Notion API.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub object: String,
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

// --- Pagination Types ---

/// Result of a pagination operation.
#[derive(Debug, Clone)]
pub struct PaginationResult<T> {
    pub items: Vec<T>,
    pub pages_fetched: u32,
}
