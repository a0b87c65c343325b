//! The cache object owned by a client.
//!
//! [`Cache`] binds one [`CacheIndex`] and one [`BlobStore`] under a single
//! root directory and fixes the freshness policy (`max_age`).

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::blobs::BlobStore;
use super::clock::{Clock, SystemClock};
use super::connection::CacheIndex;
use super::{INDEX_FILE_NAME, ResourceKind};
use crate::{Error, ResourceKey, ToResourceKey};

/// Everything needed to open a [`Cache`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Entries older than this many seconds are reported as absent by the
    /// `has_*` checks. 0 means entries never expire.
    #[serde(default)]
    pub max_age: u64,
    /// Root directory for the index database and blob files.
    pub cache_dir: PathBuf,
}

impl CacheSettings {
    pub fn new(cache_dir: impl Into<PathBuf>, max_age: u64) -> Self {
        Self { max_age, cache_dir: cache_dir.into() }
    }
}

/// Local cache of item metadata, document content and primary texts.
///
/// Call [`Cache::close`] when done to release the index connection.
pub struct Cache {
    settings: CacheSettings,
    database: PathBuf,
    index: CacheIndex,
    blobs: BlobStore,
    clock: Arc<dyn Clock>,
}

impl Cache {
    /// Open (or create) the cache rooted at `cache_dir`.
    ///
    /// Safe to call repeatedly against the same directory; existing index
    /// and blob files are reused.
    pub async fn open(cache_dir: impl Into<PathBuf>, max_age: u64) -> Result<Self, Error> {
        Self::open_with(&CacheSettings::new(cache_dir, max_age)).await
    }

    pub async fn open_with(settings: &CacheSettings) -> Result<Self, Error> {
        Self::open_with_clock(settings, Arc::new(SystemClock)).await
    }

    /// Open with a custom time source for stamping and ageing entries.
    pub async fn open_with_clock(settings: &CacheSettings, clock: Arc<dyn Clock>) -> Result<Self, Error> {
        let root = &settings.cache_dir;
        if root.as_os_str().is_empty() {
            return Err(Error::Configuration("cache_dir must not be empty".into()));
        }
        if root.exists() && !root.is_dir() {
            return Err(Error::Configuration(format!(
                "cache_dir {} exists and is not a directory",
                root.display()
            )));
        }

        let blobs = BlobStore::ensure_ready(root)?;
        let database = root.join(INDEX_FILE_NAME);
        if database.exists() && !database.is_file() {
            return Err(Error::Configuration(format!(
                "cache index {} exists and is not a file",
                database.display()
            )));
        }
        let index = CacheIndex::open(&database).await?;

        tracing::debug!(cache_dir = %root.display(), max_age = settings.max_age, "cache ready");

        Ok(Self { settings: settings.clone(), database, index, blobs, clock })
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn max_age(&self) -> u64 {
        self.settings.max_age
    }

    pub fn cache_dir(&self) -> &Path {
        &self.settings.cache_dir
    }

    pub fn file_dir(&self) -> &Path {
        self.blobs.file_dir()
    }

    pub fn database(&self) -> &Path {
        &self.database
    }

    /// Whether fresh metadata for the item is cached.
    pub async fn has_item(&self, item_url: &impl ToResourceKey) -> Result<bool, Error> {
        self.has(ResourceKind::Item, &item_url.to_resource_key()).await
    }

    /// Whether fresh content for the document is cached.
    pub async fn has_document(&self, doc_url: &impl ToResourceKey) -> Result<bool, Error> {
        self.has(ResourceKind::Document, &doc_url.to_resource_key()).await
    }

    /// Whether a fresh primary text for the item is cached.
    pub async fn has_primary_text(&self, item_url: &impl ToResourceKey) -> Result<bool, Error> {
        self.has(ResourceKind::PrimaryText, &item_url.to_resource_key()).await
    }

    /// The item's metadata as JSON text.
    pub async fn get_item(&self, item_url: &impl ToResourceKey) -> Result<String, Error> {
        self.index.lookup(ResourceKind::Item, &item_url.to_resource_key()).await
    }

    /// The document's content, byte for byte.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` when nothing is cached for the URL, and
    /// `Error::MissingBlob` (naming the URL and file path) when the index
    /// has a row but the backing file cannot be read.
    pub async fn get_document(&self, doc_url: &impl ToResourceKey) -> Result<Vec<u8>, Error> {
        self.index.read_document(&self.blobs, &doc_url.to_resource_key()).await
    }

    pub async fn get_primary_text(&self, item_url: &impl ToResourceKey) -> Result<String, Error> {
        self.index.lookup(ResourceKind::PrimaryText, &item_url.to_resource_key()).await
    }

    /// Cache item metadata, replacing any earlier entry.
    pub async fn add_item(&self, item_url: &impl ToResourceKey, metadata: impl Into<String>) -> Result<(), Error> {
        self.index
            .put_text(ResourceKind::Item, &item_url.to_resource_key(), metadata.into(), self.clock.now())
            .await
    }

    /// Cache document content, replacing any earlier entry and its file.
    pub async fn add_document(&self, doc_url: &impl ToResourceKey, data: impl Into<Vec<u8>>) -> Result<(), Error> {
        self.index
            .put_document(&self.blobs, &doc_url.to_resource_key(), data.into(), self.clock.now())
            .await
            .map(|_| ())
    }

    pub async fn add_primary_text(&self, item_url: &impl ToResourceKey, text: impl Into<String>) -> Result<(), Error> {
        self.index
            .put_text(ResourceKind::PrimaryText, &item_url.to_resource_key(), text.into(), self.clock.now())
            .await
    }

    async fn has(&self, kind: ResourceKind, key: &ResourceKey) -> Result<bool, Error> {
        self.index
            .exists_fresh(kind, key, self.settings.max_age, self.clock.now())
            .await
    }

    /// Release the index connection.
    pub async fn close(self) -> Result<(), Error> {
        self.index.close().await
    }
}

impl PartialEq for Cache {
    fn eq(&self, other: &Self) -> bool {
        self.settings.max_age == other.settings.max_age && self.database == other.database
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("cache_dir", &self.settings.cache_dir)
            .field("max_age", &self.settings.max_age)
            .finish_non_exhaustive()
    }
}
