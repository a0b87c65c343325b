use alveo_core::{Error, ResourceKey, ToResourceKey};
use serde_json::Value;

use super::Document;

/// Value of `alveo:primary_text_url` for items without a primary text.
pub const NO_PRIMARY_TEXT: &str = "No primary text found";

/// `alveo:primary_text_url` of raw item metadata, skipping the sentinel.
pub fn primary_text_url(metadata: &Value) -> Option<&str> {
    metadata
        .get("alveo:primary_text_url")
        .and_then(Value::as_str)
        .filter(|url| *url != NO_PRIMARY_TEXT)
}

/// An item in a collection, described by its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    url: ResourceKey,
    metadata: Value,
}

impl Item {
    /// Build from item metadata, which must carry `alveo:catalog_url`.
    pub fn from_metadata(metadata: Value) -> Result<Self, Error> {
        let url = metadata
            .get("alveo:catalog_url")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Parse("item metadata has no 'alveo:catalog_url'".into()))?;
        Ok(Self { url: ResourceKey::new(url), metadata })
    }

    /// Parse the JSON text served (and cached) for an item.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let metadata = serde_json::from_str(text).map_err(|e| Error::Parse(format!("item metadata: {e}")))?;
        Self::from_metadata(metadata)
    }

    pub fn url(&self) -> &ResourceKey {
        &self.url
    }

    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    /// The item's documents, in server order.
    pub fn documents(&self) -> Result<Vec<Document>, Error> {
        match self.metadata.get("alveo:documents").and_then(Value::as_array) {
            Some(docs) => docs.iter().cloned().map(Document::from_metadata).collect(),
            None => Ok(Vec::new()),
        }
    }

    pub fn document(&self, index: usize) -> Result<Document, Error> {
        self.documents()?
            .into_iter()
            .nth(index)
            .ok_or_else(|| Error::InvalidInput(format!("item {} has no document at index {index}", self.url)))
    }

    /// URL of the primary text, or `None` when the item has none.
    pub fn primary_text_url(&self) -> Option<&str> {
        primary_text_url(&self.metadata)
    }

    pub fn annotations_url(&self) -> Option<&str> {
        self.metadata.get("alveo:annotations_url").and_then(Value::as_str)
    }
}

impl ToResourceKey for Item {
    fn to_resource_key(&self) -> ResourceKey {
        self.url.clone()
    }
}
