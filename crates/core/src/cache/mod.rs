//! Local cache for item metadata, document content and primary texts.
//!
//! The cache lives under one root directory:
//!
//! - `alveo_cache.db`: SQLite index with one table per resource kind
//! - `files/`: one file per cached document, named by a random token
//!
//! Item metadata and primary texts are stored inline in the index. Document
//! bytes are written to the blob directory and the index keeps the path.
//! Entries are replaced when the same key is added again and are otherwise
//! kept forever; `max_age` only controls whether a lookup reports them fresh.

pub mod blobs;
pub mod clock;
pub mod connection;
pub mod facade;
pub mod index;
pub mod migrations;

use std::fmt;

pub use crate::Error;

pub use blobs::BlobStore;
pub use clock::{Clock, ManualClock, SystemClock};
pub use connection::CacheIndex;
pub use facade::{Cache, CacheSettings};

/// File name of the index database inside the cache root.
pub const INDEX_FILE_NAME: &str = "alveo_cache.db";

/// Name of the blob directory inside the cache root.
pub const FILES_DIR_NAME: &str = "files";

/// The three independent namespaces of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Item,
    Document,
    PrimaryText,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Item, ResourceKind::Document, ResourceKind::PrimaryText];

    /// Table holding this namespace.
    pub fn table(self) -> &'static str {
        match self {
            ResourceKind::Item => "items",
            ResourceKind::Document => "documents",
            ResourceKind::PrimaryText => "primary_texts",
        }
    }

    /// Column holding the resource URL.
    pub fn key_column(self) -> &'static str {
        match self {
            ResourceKind::Item | ResourceKind::Document => "url",
            ResourceKind::PrimaryText => "item_url",
        }
    }

    /// Column holding the inline payload, or the blob path for documents.
    pub fn value_column(self) -> &'static str {
        match self {
            ResourceKind::Item => "metadata",
            ResourceKind::Document => "path",
            ResourceKind::PrimaryText => "primary_text",
        }
    }

    /// Whether the payload is stored in the index row itself.
    pub fn is_inline(self) -> bool {
        !matches!(self, ResourceKind::Document)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Item => "item",
            ResourceKind::Document => "document",
            ResourceKind::PrimaryText => "primary text",
        };
        f.write_str(name)
    }
}
