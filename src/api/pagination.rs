// src/api/pagination.rs
//! Cursor pagination over Notion list endpoints.

use super::types::{PaginatedResponse, PaginationResult};
use crate::error::AppError;

/// Fetches pages through `fetch_fn` until the service reports no more.
///
/// `fetch_fn` receives the cursor to resume from (`None` for the first
/// page). With `exhaust` unset only the first page is requested. No request
/// is issued after a page reporting `has_more = false` or lacking a cursor.
pub async fn fetch_all_pages<T, F, Fut>(
    mut fetch_fn: F,
    exhaust: bool,
) -> Result<PaginationResult<T>, AppError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<PaginatedResponse<T>, AppError>>,
{
    let mut all_items = Vec::new();
    let mut cursor = None;
    let mut pages_fetched = 0u32;

    loop {
        let response = fetch_fn(cursor).await?;

        let has_more = response.has_more;
        cursor = response.next_cursor;
        all_items.extend(response.results);
        pages_fetched += 1;

        if !exhaust {
            log::debug!("Stopping after the first page of results");
            break;
        }
        if !has_more || cursor.is_none() {
            break;
        }
    }

    log::debug!(
        "Fetched {} items over {} pages",
        all_items.len(),
        pages_fetched
    );

    Ok(PaginationResult {
        items: all_items,
        pages_fetched,
    })
}
