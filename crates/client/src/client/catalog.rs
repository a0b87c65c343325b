//! Catalog, collection and search endpoints.

use std::path::{Path, PathBuf};

use alveo_core::{Error, ToResourceKey};
use serde_json::{Value, json};

use super::Client;
use crate::objects::{Collection, ItemGroup};
use crate::outcome::{check_success, field_as, message_text};
use crate::transport::{ApiRequest, Transport, parse_resource_url, with_query};

impl<T: Transport> Client<T> {
    /// Version string reported by the server.
    pub async fn api_version(&self) -> Result<String, Error> {
        let resp = self.get_json(self.endpoint("version")?).await?;
        Ok(field_as(&resp, "API version")?)
    }

    /// JSON-LD context used by the server for annotations and metadata.
    pub async fn annotation_context(&self) -> Result<Value, Error> {
        self.get_json(self.endpoint("schema/json-ld")?).await
    }

    pub async fn collections(&self) -> Result<Vec<Collection>, Error> {
        let resp = self.get_json(self.endpoint("catalog")?).await?;
        let urls: Vec<String> = field_as(&resp, "collections")?;
        Ok(urls.into_iter().map(Collection::from_url).collect())
    }

    pub async fn collection_info(&self, collection: &impl ToResourceKey) -> Result<Value, Error> {
        let url = parse_resource_url(collection.to_resource_key().as_str())?;
        self.get_json(url).await
    }

    /// Create a collection; returns the server's success message.
    pub async fn create_collection(&self, name: &str, metadata: Value) -> Result<String, Error> {
        let body = json!({ "collection_metadata": metadata, "name": name });
        let resp = self.send(ApiRequest::post(self.endpoint("catalog")?, body)).await?;
        Ok(message_text(&check_success(&resp)?))
    }

    /// Update collection metadata, merging unless `replace` is set.
    pub async fn modify_collection_metadata(
        &self, collection: &impl ToResourceKey, metadata: Value, replace: Option<bool>,
    ) -> Result<String, Error> {
        let url = parse_resource_url(collection.to_resource_key().as_str())?;
        let mut body = json!({ "collection_metadata": metadata });
        if let Some(replace) = replace {
            body["replace"] = Value::Bool(replace);
        }
        let resp = self.send(ApiRequest::put(url, body)).await?;
        Ok(message_text(&check_success(&resp)?))
    }

    /// Every item of the collection.
    pub async fn items_in_collection(&self, collection: &Collection) -> Result<ItemGroup, Error> {
        self.search_metadata(&format!("collection_name:{}", collection.name())).await
    }

    /// Run a metadata search query and return the matching items.
    pub async fn search_metadata(&self, query: &str) -> Result<ItemGroup, Error> {
        let url = with_query(self.endpoint("catalog/search")?, [("metadata", query)]);
        let resp = self.get_json(url).await?;
        let urls: Vec<String> = field_as(&resp, "items")?;
        tracing::debug!(query, results = urls.len(), "metadata search");
        Ok(ItemGroup::new(urls))
    }

    /// Run a SPARQL query against one collection.
    ///
    /// Returns the SPARQL JSON results document.
    pub async fn sparql_query(&self, collection_name: &str, query: &str) -> Result<Value, Error> {
        let path = format!("sparql/{}", urlencoding::encode(collection_name));
        let url = with_query(self.endpoint(&path)?, [("query", query)]);
        self.get_json(url).await
    }

    /// Download an archive with the metadata and documents of `items`.
    ///
    /// `format` is `zip` or `warc`. Returns `path`.
    pub async fn download_items(&self, items: &ItemGroup, path: &Path, format: &str) -> Result<PathBuf, Error> {
        let url = with_query(self.endpoint("catalog/download_items")?, [("format", format)]);
        let body = json!({ "items": items.to_strings() });
        let data = self.send(ApiRequest::post(url, body)).await?;
        tokio::fs::write(path, &data).await.map_err(|e| Error::storage(path, e))?;
        tracing::debug!(path = %path.display(), items = items.len(), size = data.len(), "downloaded items");
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CachePolicy;
    use crate::client::tests::client_with;
    use crate::transport::Method;

    #[tokio::test]
    async fn test_api_version() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        client
            .transport()
            .respond_json(Method::Get, "https://alveo.test/version", &json!({"API version": "Hydra-2.0"}));

        assert_eq!(client.api_version().await.unwrap(), "Hydra-2.0");
    }

    #[tokio::test]
    async fn test_collections() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        client.transport().respond_json(
            Method::Get,
            "https://alveo.test/catalog",
            &json!({"collections": ["https://alveo.test/catalog/ace", "https://alveo.test/catalog/cooee"]}),
        );

        let collections = client.collections().await.unwrap();

        let names: Vec<_> = collections.iter().map(Collection::name).collect();
        assert_eq!(names, vec!["ace", "cooee"]);
    }

    #[tokio::test]
    async fn test_search_metadata_encodes_query() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        client.transport().respond_json(
            Method::Get,
            "https://alveo.test/catalog/search?metadata=collection_name%3Aace",
            &json!({"items": ["https://alveo.test/catalog/ace/A01a", "https://alveo.test/catalog/ace/A01b"]}),
        );

        let group = client
            .items_in_collection(&Collection::from_url("https://alveo.test/catalog/ace"))
            .await
            .unwrap();

        assert_eq!(group.len(), 2);
        assert!(group.contains(&"https://alveo.test/catalog/ace/A01b"));
    }

    #[tokio::test]
    async fn test_create_collection_failure_is_api_error() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        client.transport().respond_json(
            Method::Post,
            "https://alveo.test/catalog",
            &json!({"error": "collection already exists"}),
        );

        let result = client.create_collection("ace", json!({})).await;

        assert!(matches!(result, Err(Error::ApiFailed(msg)) if msg == "collection already exists"));
        let sent = client.transport().requests();
        assert_eq!(sent[0].body.as_ref().unwrap()["name"], "ace");
    }

    #[tokio::test]
    async fn test_modify_collection_metadata_sends_replace_flag() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        let url = "https://alveo.test/catalog/ace";
        client.transport().respond_json(Method::Put, url, &json!({"success": "metadata updated"}));

        let message = client
            .modify_collection_metadata(&url, json!({"dcterms:title": "ACE"}), Some(true))
            .await
            .unwrap();

        assert_eq!(message, "metadata updated");
        assert_eq!(client.transport().requests()[0].body.as_ref().unwrap()["replace"], true);
    }

    #[tokio::test]
    async fn test_sparql_query() {
        let tmp = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        client.transport().respond_json(
            Method::Get,
            "https://alveo.test/sparql/ace?query=select+*",
            &json!({"results": {"bindings": []}}),
        );

        let resp = client.sparql_query("ace", "select *").await.unwrap();

        assert!(resp["results"]["bindings"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_items_writes_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let client = client_with(tmp.path(), CachePolicy::default()).await;
        client.transport().respond(
            Method::Post,
            "https://alveo.test/catalog/download_items?format=zip",
            vec![0x50u8, 0x4b, 0x03, 0x04],
        );
        let path = out.path().join("items.zip");

        let written = client
            .download_items(&ItemGroup::new(["https://alveo.test/catalog/ace/A01a"]), &path, "zip")
            .await
            .unwrap();

        assert_eq!(written, path);
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x50u8, 0x4b, 0x03, 0x04]);
        let sent = client.transport().requests();
        assert_eq!(sent[0].body.as_ref().unwrap()["items"][0], "https://alveo.test/catalog/ace/A01a");
    }
}
