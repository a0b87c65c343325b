use alveo_core::{Error, ResourceKey, ToResourceKey};
use serde_json::Value;

/// A document of an item, described by its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    url: ResourceKey,
    metadata: Value,
}

impl Document {
    /// Build from document metadata, which must carry `alveo:url`.
    pub fn from_metadata(metadata: Value) -> Result<Self, Error> {
        let url = metadata
            .get("alveo:url")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Parse("document metadata has no 'alveo:url'".into()))?;
        Ok(Self { url: ResourceKey::new(url), metadata })
    }

    /// A document known only by its URL.
    pub fn from_url(url: impl ToResourceKey) -> Self {
        let url = url.to_resource_key();
        let metadata = serde_json::json!({ "alveo:url": url.as_str() });
        Self { url, metadata }
    }

    pub fn url(&self) -> &ResourceKey {
        &self.url
    }

    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    /// Last path segment of the URL, percent-decoded.
    pub fn filename(&self) -> String {
        let segment = self.url.as_str().rsplit('/').next().unwrap_or_default();
        urlencoding::decode(segment)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| segment.to_string())
    }
}

impl ToResourceKey for Document {
    fn to_resource_key(&self) -> ResourceKey {
        self.url.clone()
    }
}
