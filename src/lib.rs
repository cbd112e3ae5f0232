// src/lib.rs
//! notion-table library: Notion databases and pages as cached, queryable tables.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ValidationError`, `NotionErrorCode`
//! - **Configuration**: `TableConfig`, CLI input types
//! - **Table**: `NotionTable`, `Table`, `Row`, `CellValue`, `ColumnSchema`, `Condition`
//! - **Content model**: `ContentBlock` and its variants, `PropertyValue`, `ColumnKind`
//! - **Domain types**: `NotionId`, `ApiKey`, `RichTextItem`, `Warning`, etc.
//! - **Transport**: `NotionTransport`, `NotionHttpClient`, identity rotation, retries

mod api;
mod config;
mod constants;
mod error;
mod error_recovery;
mod model;
mod table;
mod types;

// --- Error Handling ---
pub use crate::error::{AppError, NotionErrorCode};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{
    parse_assignment, parse_assignments, CommandLineInput, FilterArgs, TableCommand, TableConfig,
    API_KEY_ENV,
};
pub use crate::constants::{
    BLOCK_COLUMN, CHILDREN_COLUMN, ID_COLUMN, IMAGE_DOWNLOAD_COLUMN, IMAGE_DOWNLOAD_FAILED,
    IMAGE_SOURCE_COLUMN,
};

// --- Table ---
pub use crate::table::{
    image_file_name, select, translate, CellValue, ColumnSchema, Condition, Matcher,
    MutationOutcome, NotionTable, QueryResult, Row, SchemaEntry, Table, TableCache,
    UnsupportedKindPolicy,
};

// --- Content Model ---
pub use crate::model::{
    BlockCommon, ColumnBlock, ColumnKind, ColumnListBlock, ContentBlock, DividerBlock,
    LinkPreviewBlock, MentionBlock, PropertyValue, RichTextBlock, TextBlockKind, UniqueIdData,
};

// --- Domain Types ---
pub use crate::types::{
    plain_text_of, Annotations, ApiKey, Color, Link, MentionData, NotionId, RichTextItem,
    RichTextType, Warning, WarningLevel,
};

// --- Transport ---
pub use crate::api::{
    fetch_all_pages, fetch_records, ApiRequest, ApiResponse, FetchPlan, Identity,
    IdentityProvider, NotionHttpClient, NotionTransport, PaginatedResponse, PaginationResult,
    ResourceKind, RotatingIdentity, SortKey, TransportSettings,
};
pub use crate::error_recovery::{retry_with_backoff, RetryPolicy};
