// src/table/cache.rs
//! Memoized table of a `NotionTable`.

use super::row::Table;
use crate::error::AppError;
use std::future::Future;

/// Holds the normalized table once it has been loaded.
///
/// Loading happens only through [`TableCache::get_or_load`]; nothing
/// expires on its own.
#[derive(Debug, Default)]
pub struct TableCache {
    table: Option<Table>,
    loads: u32,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached table, running `load` first if it is empty.
    ///
    /// A failed load leaves the cache empty.
    pub async fn get_or_load<F, Fut>(&mut self, load: F) -> Result<&mut Table, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Table, AppError>>,
    {
        let table = match self.table.take() {
            Some(table) => table,
            None => {
                let table = load().await?;
                self.loads += 1;
                table
            }
        };
        Ok(self.table.insert(table))
    }

    pub fn get_mut(&mut self) -> Option<&mut Table> {
        self.table.as_mut()
    }

    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }

    pub fn invalidate(&mut self) {
        if self.table.take().is_some() {
            log::debug!("Table cache invalidated");
        }
    }

    /// How many times the table was loaded from the service.
    pub fn loads(&self) -> u32 {
        self.loads
    }
}
