// src/api/mod.rs
//! Notion API interaction: moving requests to the service and records back.
//!
//! Business logic depends on the [`NotionTransport`] trait, never on HTTP
//! details. The production implementation is [`NotionHttpClient`].

pub mod client;
pub mod fetcher;
pub mod identity;
mod pagination;
mod types;

use crate::error::AppError;
use std::sync::Arc;

/// The ability to exchange requests with a Notion workspace.
///
/// Implementations own retries and timeouts. A returned `Ok` response may
/// still carry a non-success status; callers decide what that means.
#[async_trait::async_trait]
pub trait NotionTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse<String>, AppError>;

    /// Downloads raw file content from an absolute URL. Non-success
    /// statuses are errors.
    async fn download(&self, url: &str) -> Result<Vec<u8>, AppError>;

    /// A transport for fetching nested tables, bound to the identity
    /// currently in use.
    fn child_session(&self) -> Result<Arc<dyn NotionTransport>, AppError>;
}

// Re-export the public interface
pub use client::{NotionHttpClient, TransportSettings};
pub use fetcher::{fetch_records, FetchPlan, ResourceKind, SortKey};
pub use identity::{Identity, IdentityProvider, RotatingIdentity};
pub use pagination::fetch_all_pages;
pub use types::{ApiRequest, ApiResponse, PaginatedResponse, PaginationResult};
