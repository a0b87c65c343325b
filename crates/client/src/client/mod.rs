//! The Alveo API client.
//!
//! [`Client`] pairs a [`Transport`] with a local [`Cache`]. Item metadata,
//! document content and primary texts go through the fetch-or-cache path:
//! a fresh cache entry is returned without touching the network, anything
//! else is fetched and (if enabled) written back.
//!
//! A cache that fails while being read is treated as a miss. A cache that
//! fails while being written is logged and ignored; the fetched payload is
//! still returned.

mod annotations;
mod catalog;
mod items;
mod lists;

use std::path::{Path, PathBuf};

use alveo_core::{AlveoConfig, Cache, Error, ResourceKey, ResourceKind, ToResourceKey};
use bytes::Bytes;
use serde_json::Value;

use crate::objects::{Document, Item, ItemGroup, primary_text_url};
use crate::outcome::parse_json;
use crate::transport::{ApiRequest, HttpTransport, Transport, endpoint, parse_resource_url};

pub use items::DocumentSource;

/// Independent read and write toggles for the local cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Return fresh cache entries instead of fetching.
    pub use_cache: bool,
    /// Store fetched payloads in the cache.
    pub update_cache: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self { use_cache: true, update_cache: true }
    }
}

impl From<&AlveoConfig> for CachePolicy {
    fn from(config: &AlveoConfig) -> Self {
        Self { use_cache: config.use_cache, update_cache: config.update_cache }
    }
}

/// Client for one Alveo server.
pub struct Client<T = HttpTransport> {
    transport: T,
    cache: Cache,
    api_url: url::Url,
    policy: CachePolicy,
}

impl Client<HttpTransport> {
    /// Build an HTTP client and open its cache from configuration.
    pub async fn from_config(config: &AlveoConfig) -> Result<Self, Error> {
        let transport = HttpTransport::from_config(config)?;
        let cache = Cache::open_with(&config.cache_settings()).await?;
        Self::new(transport, cache, &config.api_url, CachePolicy::from(config))
    }
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, cache: Cache, api_url: &str, policy: CachePolicy) -> Result<Self, Error> {
        let api_url = parse_resource_url(api_url)?;
        Ok(Self { transport, cache, api_url, policy })
    }

    pub fn api_url(&self) -> &url::Url {
        &self.api_url
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Release the cache's index connection.
    pub async fn close(self) -> Result<(), Error> {
        self.cache.close().await
    }

    fn endpoint(&self, path: &str) -> Result<url::Url, Error> {
        Ok(endpoint(&self.api_url, path)?)
    }

    async fn send(&self, request: ApiRequest) -> Result<Bytes, Error> {
        Ok(self.transport.request(request).await?)
    }

    async fn get_json(&self, url: url::Url) -> Result<Value, Error> {
        let body = self.send(ApiRequest::get(url)).await?;
        Ok(parse_json(&body)?)
    }

    /// Make an authenticated request to confirm the credentials work.
    ///
    /// # Errors
    ///
    /// `Error::Unauthorized` if the server rejects them.
    pub async fn check_credentials(&self) -> Result<(), Error> {
        self.send(ApiRequest::get(self.endpoint("item_lists.json")?)).await?;
        Ok(())
    }

    /// Item metadata, from the cache when fresh.
    pub async fn get_item(&self, item: &impl ToResourceKey, force_download: bool) -> Result<Item, Error> {
        let key = item.to_resource_key();
        Item::from_metadata(self.item_metadata(&key, force_download).await?)
    }

    async fn item_metadata(&self, key: &ResourceKey, force_download: bool) -> Result<Value, Error> {
        let source = parse_resource_url(key.as_str())?;
        let bytes = self.fetch_or_cache(ResourceKind::Item, key, source, force_download).await?;
        let text = String::from_utf8(bytes).map_err(|e| Error::Parse(format!("item {key}: {e}")))?;
        serde_json::from_str(&text).map_err(|e| Error::Parse(format!("item {key} metadata: {e}")))
    }

    /// Document content, from the cache when fresh.
    pub async fn get_document(&self, document: &impl ToResourceKey, force_download: bool) -> Result<Vec<u8>, Error> {
        let key = document.to_resource_key();
        let source = parse_resource_url(key.as_str())?;
        self.fetch_or_cache(ResourceKind::Document, &key, source, force_download).await
    }

    /// The item's primary text, or `None` if its metadata says it has none.
    ///
    /// The text is cached under the item URL as given, not the primary
    /// text URL.
    pub async fn get_primary_text(
        &self, item: &impl ToResourceKey, force_download: bool,
    ) -> Result<Option<String>, Error> {
        let key = item.to_resource_key();
        let metadata = self.item_metadata(&key, false).await?;
        let Some(text_url) = primary_text_url(&metadata) else {
            tracing::debug!(item = %key, "item has no primary text");
            return Ok(None);
        };
        let source = parse_resource_url(text_url)?;
        let bytes = self
            .fetch_or_cache(ResourceKind::PrimaryText, &key, source, force_download)
            .await?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| Error::Parse(format!("primary text of {key}: {e}")))
    }

    /// Metadata of every item in the group, in group order.
    pub async fn get_all(&self, group: &ItemGroup, force_download: bool) -> Result<Vec<Item>, Error> {
        let mut items = Vec::with_capacity(group.len());
        for url in group {
            items.push(self.get_item(url, force_download).await?);
        }
        Ok(items)
    }

    /// Save a document's content to `dir`, named `filename` or the
    /// document's own file name. Returns the written path.
    pub async fn download_document(
        &self, document: &Document, dir: &Path, filename: Option<&str>, force_download: bool,
    ) -> Result<PathBuf, Error> {
        let content = self.get_document(document, force_download).await?;
        let path = match filename {
            Some(name) => dir.join(name),
            None => dir.join(document.filename()),
        };
        tokio::fs::write(&path, &content)
            .await
            .map_err(|e| Error::storage(&path, e))?;
        tracing::debug!(path = %path.display(), size = content.len(), "saved document");
        Ok(path)
    }

    async fn fetch_or_cache(
        &self, kind: ResourceKind, key: &ResourceKey, source: url::Url, force_download: bool,
    ) -> Result<Vec<u8>, Error> {
        if self.policy.use_cache
            && !force_download
            && let Some(hit) = self.read_cached(kind, key).await?
        {
            tracing::debug!(%kind, %key, "cache hit");
            return Ok(hit);
        }

        let body = self.send(ApiRequest::get(source)).await?;

        if self.policy.update_cache {
            self.write_back(kind, key, &body).await;
        }

        Ok(body.to_vec())
    }

    async fn read_cached(&self, kind: ResourceKind, key: &ResourceKey) -> Result<Option<Vec<u8>>, Error> {
        match self.lookup_cached(kind, key).await {
            Ok(hit) => Ok(hit),
            Err(e) if e.is_storage() || e.is_not_found() => {
                tracing::warn!(%kind, %key, error = %e, "cache read failed, fetching from server");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn lookup_cached(&self, kind: ResourceKind, key: &ResourceKey) -> Result<Option<Vec<u8>>, Error> {
        let fresh = match kind {
            ResourceKind::Item => self.cache.has_item(key).await?,
            ResourceKind::Document => self.cache.has_document(key).await?,
            ResourceKind::PrimaryText => self.cache.has_primary_text(key).await?,
        };
        if !fresh {
            return Ok(None);
        }
        let payload = match kind {
            ResourceKind::Item => self.cache.get_item(key).await?.into_bytes(),
            ResourceKind::Document => self.cache.get_document(key).await?,
            ResourceKind::PrimaryText => self.cache.get_primary_text(key).await?.into_bytes(),
        };
        Ok(Some(payload))
    }

    async fn write_back(&self, kind: ResourceKind, key: &ResourceKey, payload: &[u8]) {
        let result = match kind {
            ResourceKind::Document => self.cache.add_document(key, payload).await,
            ResourceKind::Item | ResourceKind::PrimaryText => match std::str::from_utf8(payload) {
                Ok(text) if kind == ResourceKind::Item => self.cache.add_item(key, text).await,
                Ok(text) => self.cache.add_primary_text(key, text).await,
                Err(e) => Err(Error::Parse(format!("{kind} payload is not UTF-8: {e}"))),
            },
        };

        if let Err(e) = result {
            tracing::warn!(%kind, %key, error = %e, "failed to cache fetched payload");
        }
    }
}

impl PartialEq for Client<HttpTransport> {
    fn eq(&self, other: &Self) -> bool {
        self.transport.credentials() == other.transport.credentials()
            && self.api_url == other.api_url
            && self.cache == other.cache
            && self.policy == other.policy
    }
}

impl<T> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("api_url", &self.api_url.as_str())
            .field("cache", &self.cache)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::objects::NO_PRIMARY_TEXT;
    use crate::transport::mock::MockTransport;
    use crate::transport::{ApiError, Method};
    use alveo_core::CacheSettings;
    use alveo_core::cache::ManualClock;
    use serde_json::json;
    use std::sync::Arc;

    pub(crate) const API: &str = "https://alveo.test";
    const ITEM: &str = "https://alveo.test/catalog/ace/A01a";
    const TEXT: &str = "https://alveo.test/catalog/ace/A01a/primary_text.json";
    const DOC: &str = "https://alveo.test/catalog/ace/A01a/document/A01a-plain.txt";

    pub(crate) async fn client_with(dir: &Path, policy: CachePolicy) -> Client<MockTransport> {
        let cache = Cache::open(dir, 0).await.unwrap();
        Client::new(MockTransport::new(), cache, API, policy).unwrap()
    }

    fn item_metadata(primary_text: &str) -> Value {
        json!({
            "alveo:catalog_url": ITEM,
            "alveo:primary_text_url": primary_text,
            "alveo:documents": [{"alveo:url": DOC}],
        })
    }

    #[tokio::test]
    async fn test_item_is_served_from_cache_after_first_fetch() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        client.transport().respond_json(Method::Get, ITEM, &item_metadata(TEXT));

        let first = client.get_item(&ITEM, false).await.unwrap();
        let second = client.get_item(&ITEM, false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.url().as_str(), ITEM);
        assert_eq!(client.transport().count(Method::Get, ITEM), 1);
    }

    #[tokio::test]
    async fn test_force_download_bypasses_cache_and_refreshes_it() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        client.transport().respond(Method::Get, DOC, "old");
        client.get_document(&DOC, false).await.unwrap();

        client.transport().respond(Method::Get, DOC, "new");
        assert_eq!(client.get_document(&DOC, true).await.unwrap(), b"new");
        assert_eq!(client.get_document(&DOC, false).await.unwrap(), b"new");
        assert_eq!(client.transport().count(Method::Get, DOC), 2);
    }

    #[tokio::test]
    async fn test_stale_entry_is_fetched_again() {
        let tmp = tempfile::tempdir().unwrap();
        let clock = ManualClock::starting_now();
        let cache = Cache::open_with_clock(&CacheSettings::new(tmp.path(), 1), Arc::new(clock.clone()))
            .await
            .unwrap();
        let client = Client::new(MockTransport::new(), cache, API, CachePolicy::default()).unwrap();
        client.transport().respond_json(Method::Get, ITEM, &item_metadata(TEXT));

        client.get_item(&ITEM, false).await.unwrap();
        clock.advance(chrono::Duration::seconds(2));
        assert!(!client.cache().has_item(&ResourceKey::new(ITEM)).await.unwrap());

        client.get_item(&ITEM, false).await.unwrap();
        assert_eq!(client.transport().count(Method::Get, ITEM), 2);
        assert!(client.cache().has_item(&ResourceKey::new(ITEM)).await.unwrap());
    }

    #[tokio::test]
    async fn test_use_cache_off_still_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy { use_cache: false, update_cache: true }).await;
        client.transport().respond(Method::Get, DOC, "content");

        client.get_document(&DOC, false).await.unwrap();
        client.get_document(&DOC, false).await.unwrap();

        assert_eq!(client.transport().count(Method::Get, DOC), 2);
        assert_eq!(client.cache().get_document(&ResourceKey::new(DOC)).await.unwrap(), b"content");
    }

    #[tokio::test]
    async fn test_update_cache_off_never_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy { use_cache: true, update_cache: false }).await;
        client.transport().respond(Method::Get, DOC, "content");

        client.get_document(&DOC, false).await.unwrap();

        assert!(!client.cache().has_document(&ResourceKey::new(DOC)).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_blob_falls_back_to_network() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        client.transport().respond(Method::Get, DOC, "content");
        client.get_document(&DOC, false).await.unwrap();

        for entry in std::fs::read_dir(client.cache().file_dir()).unwrap() {
            std::fs::remove_file(entry.unwrap().path()).unwrap();
        }

        assert_eq!(client.get_document(&DOC, false).await.unwrap(), b"content");
        assert_eq!(client.transport().count(Method::Get, DOC), 2);
        assert_eq!(client.cache().get_document(&ResourceKey::new(DOC)).await.unwrap(), b"content");
    }

    #[tokio::test]
    async fn test_write_back_failure_still_returns_payload() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        client.transport().respond(Method::Get, DOC, "content");

        let file_dir = client.cache().file_dir().to_path_buf();
        std::fs::remove_dir_all(&file_dir).unwrap();
        std::fs::write(&file_dir, b"in the way").unwrap();

        assert_eq!(client.get_document(&DOC, false).await.unwrap(), b"content");
        assert!(!client.cache().has_document(&ResourceKey::new(DOC)).await.unwrap());
    }

    #[tokio::test]
    async fn test_transport_error_propagates_and_caches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        client.transport().fail(
            Method::Get,
            ITEM,
            ApiError::Status { status: 500, method: Method::Get, url: ITEM.into(), body: "boom".into() },
        );

        let result = client.get_item(&ITEM, false).await;

        assert!(matches!(result, Err(Error::HttpError { status: 500, .. })));
        assert!(!client.cache().has_item(&ResourceKey::new(ITEM)).await.unwrap());
    }

    #[tokio::test]
    async fn test_primary_text_is_cached_under_item_url() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        client.transport().respond_json(Method::Get, ITEM, &item_metadata(TEXT));
        client.transport().respond(Method::Get, TEXT, "the quick brown fox");

        let text = client.get_primary_text(&ITEM, false).await.unwrap();
        let again = client.get_primary_text(&ITEM, false).await.unwrap();

        assert_eq!(text.as_deref(), Some("the quick brown fox"));
        assert_eq!(again, text);
        assert_eq!(client.transport().count(Method::Get, TEXT), 1);
        assert_eq!(
            client.cache().get_primary_text(&ResourceKey::new(ITEM)).await.unwrap(),
            "the quick brown fox"
        );
    }

    #[tokio::test]
    async fn test_primary_text_key_is_the_requested_url() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        let alias = "https://alveo.test/catalog/ace/A01a/";
        client.transport().respond_json(Method::Get, alias, &item_metadata(TEXT));
        client.transport().respond(Method::Get, TEXT, "the quick brown fox");

        client.get_primary_text(&alias, false).await.unwrap();

        assert!(client.cache().has_primary_text(&alias).await.unwrap());
        assert!(!client.cache().has_primary_text(&ITEM).await.unwrap());

        let bare = "https://alveo.test/catalog/ace/A01b";
        client
            .transport()
            .respond_json(Method::Get, bare, &json!({"alveo:primary_text_url": TEXT}));
        let text = client.get_primary_text(&bare, false).await.unwrap();
        assert_eq!(text.as_deref(), Some("the quick brown fox"));
        assert!(client.cache().has_primary_text(&bare).await.unwrap());
    }

    #[tokio::test]
    async fn test_no_primary_text_sentinel_skips_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        client.transport().respond_json(Method::Get, ITEM, &item_metadata(NO_PRIMARY_TEXT));

        assert_eq!(client.get_primary_text(&ITEM, false).await.unwrap(), None);
        assert_eq!(client.transport().requests().len(), 1);
        assert!(!client.cache().has_primary_text(&ResourceKey::new(ITEM)).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_all_keeps_group_order() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        let other = "https://alveo.test/catalog/ace/A02b";
        client.transport().respond_json(Method::Get, ITEM, &item_metadata(TEXT));
        client.transport().respond_json(Method::Get, other, &json!({"alveo:catalog_url": other}));

        let items = client.get_all(&ItemGroup::new([other, ITEM]), false).await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].url().as_str(), other);
        assert_eq!(items[1].url().as_str(), ITEM);
    }

    #[tokio::test]
    async fn test_download_document_uses_document_filename() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        client.transport().respond_json(Method::Get, ITEM, &item_metadata(TEXT));
        client.transport().respond(Method::Get, DOC, "plain text");

        let document = client.get_item(&ITEM, false).await.unwrap().document(0).unwrap();
        let path = client.download_document(&document, out.path(), None, false).await.unwrap();

        assert_eq!(path, out.path().join("A01a-plain.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), b"plain text");
    }

    #[tokio::test]
    async fn test_check_credentials_unauthorized() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        let url = "https://alveo.test/item_lists.json";
        client.transport().fail(
            Method::Get,
            url,
            ApiError::Unauthorized { status: 401, method: Method::Get, url: url.into() },
        );

        assert!(matches!(client.check_credentials().await, Err(Error::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_invalid_resource_url() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        assert!(matches!(client.get_item(&"not a url", false).await, Err(Error::InvalidUrl(_))));
        assert!(client.transport().requests().is_empty());
    }
}
