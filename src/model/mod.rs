// src/model/mod.rs
//! Typed vocabulary for what Notion returns: page content blocks and
//! database property values.

pub mod content;
mod property;

pub use content::{
    BlockCommon, ColumnBlock, ColumnListBlock, ContentBlock, DividerBlock, LinkPreviewBlock,
    MentionBlock, RichTextBlock, TextBlockKind,
};
pub use property::{ColumnKind, PropertyValue, UniqueIdData};
