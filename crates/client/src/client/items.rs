//! Creating, modifying and deleting items and documents.

use std::path::PathBuf;

use alveo_core::{Error, ResourceKey, ToResourceKey};
use serde_json::{Map, Value, json};

use super::Client;
use crate::outcome::{check_success, message_text};
use crate::transport::{ApiError, ApiRequest, MultipartBody, Transport, parse_resource_url};

/// Vocabulary prefixes used in item and document metadata.
pub fn metadata_context() -> Value {
    json!({
        "ausnc": "http://ns.ausnc.org.au/schemas/ausnc_md_model/",
        "corpus": "http://ns.ausnc.org.au/corpora/",
        "dc": "http://purl.org/dc/terms/",
        "dcterms": "http://purl.org/dc/terms/",
        "foaf": "http://xmlns.com/foaf/0.1/",
        "hcsvlab": "http://alveo.edu.au/vocabulary/",
    })
}

const DISPLAY_DOCUMENT: &str = "http://alveo.edu.org/vocabulary/display_document";

/// Where the content of a new document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Text content uploaded inline.
    Content(String),
    /// A URL the server records as the document's source.
    Url(String),
    /// A local file uploaded as a multipart form. The document is
    /// identified by the file's name.
    File(PathBuf),
}

/// Identifier of the first created resource in a `{"success": [...]}` reply.
fn created_id(success: &Value) -> Result<String, ApiError> {
    match success {
        Value::Array(ids) => ids.first().map(message_text),
        Value::String(id) => Some(id.clone()),
        _ => None,
    }
    .ok_or_else(|| ApiError::Parse(format!("no created identifier in {success}")))
}

fn child_url(parent: &ResourceKey, segment: &str) -> ResourceKey {
    ResourceKey::new(format!("{}/{segment}", parent.as_str().trim_end_matches('/')))
}

impl<T: Transport> Client<T> {
    /// Add an item to a collection; returns the new item's URL.
    pub async fn add_item(
        &self, collection: &impl ToResourceKey, name: &str, metadata: Map<String, Value>,
    ) -> Result<ResourceKey, Error> {
        self.create_item(collection, name, metadata, None).await
    }

    /// Add an item holding a single text document named `<name>.txt`.
    pub async fn add_text_item(
        &self, collection: &impl ToResourceKey, name: &str, mut metadata: Map<String, Value>, text: &str,
        title: Option<&str>,
    ) -> Result<ResourceKey, Error> {
        let doc_name = format!("{name}.txt");
        metadata.insert("hcsvlab:display_document".into(), json!({ "@id": doc_name }));
        metadata.insert("hcsvlab:indexable_document".into(), json!({ "@id": doc_name }));
        metadata.insert(
            "ausnc:document".into(),
            json!([{
                "@id": "document1.txt",
                "@type": "foaf:Document",
                "dcterms:extent": text.chars().count(),
                "dcterms:identifier": doc_name,
                "dcterms:title": title.unwrap_or(name),
                "dcterms:type": "Text",
            }]),
        );
        let documents = json!([{ "content": text, "identifier": doc_name }]);
        self.create_item(collection, name, metadata, Some(documents)).await
    }

    async fn create_item(
        &self, collection: &impl ToResourceKey, name: &str, mut metadata: Map<String, Value>,
        documents: Option<Value>,
    ) -> Result<ResourceKey, Error> {
        let collection = collection.to_resource_key();
        metadata.insert("dcterms:identifier".into(), Value::String(name.to_string()));
        metadata.insert("@type".into(), Value::String("ausnc:AusNCObject".into()));

        let mut item = json!({
            "metadata": { "@context": metadata_context(), "@graph": [metadata] },
        });
        if let Some(documents) = documents {
            item["documents"] = documents;
        }

        let url = parse_resource_url(collection.as_str())?;
        let resp = self.send(ApiRequest::post(url, json!({ "items": [item] }))).await?;
        let id = created_id(&check_success(&resp)?)?;

        let item_url = child_url(&collection, &id);
        tracing::debug!(item = %item_url, "created item");
        Ok(item_url)
    }

    /// Replace metadata fields of an item.
    pub async fn modify_item(&self, item: &impl ToResourceKey, metadata: Value) -> Result<String, Error> {
        let url = parse_resource_url(item.to_resource_key().as_str())?;
        let resp = self.send(ApiRequest::put(url, json!({ "metadata": metadata }))).await?;
        Ok(message_text(&check_success(&resp)?))
    }

    pub async fn delete_item(&self, item: &impl ToResourceKey) -> Result<String, Error> {
        let url = parse_resource_url(item.to_resource_key().as_str())?;
        let resp = self.send(ApiRequest::delete(url)).await?;
        Ok(message_text(&check_success(&resp)?))
    }

    /// Add a document to an item; returns the new document's URL.
    ///
    /// With `display_document` the item is updated to show this document.
    pub async fn add_document(
        &self, item: &impl ToResourceKey, name: &str, metadata: Map<String, Value>, source: DocumentSource,
        display_document: bool,
    ) -> Result<ResourceKey, Error> {
        let item = item.to_resource_key();
        let doc_id = match &source {
            DocumentSource::File(path) => path
                .file_name()
                .map(|file_name| file_name.to_string_lossy().into_owned())
                .ok_or_else(|| Error::InvalidInput(format!("not a file path: {}", path.display())))?,
            DocumentSource::Content(_) | DocumentSource::Url(_) => name.to_string(),
        };

        let mut doc_metadata = Map::new();
        doc_metadata.insert("@context".into(), metadata_context());
        doc_metadata.insert("@type".into(), Value::String("foaf:Document".into()));
        doc_metadata.insert("dcterms:identifier".into(), Value::String(doc_id.clone()));
        doc_metadata.extend(metadata);

        let url = parse_resource_url(item.as_str())?;
        let request = match source {
            DocumentSource::Content(content) => {
                ApiRequest::post(url, json!({ "metadata": doc_metadata, "document_content": content }))
            }
            DocumentSource::Url(source_url) => {
                doc_metadata.insert("dcterms:source".into(), json!({ "@id": source_url }));
                ApiRequest::post(url, json!({ "metadata": doc_metadata }))
            }
            DocumentSource::File(path) => {
                let content = tokio::fs::read(&path).await.map_err(|e| Error::storage(&path, e))?;
                let form = MultipartBody::default()
                    .text("metadata", Value::Object(doc_metadata).to_string())
                    .file("file", doc_id.as_str(), content);
                ApiRequest::upload(url, form)
            }
        };

        let resp = self.send(request).await?;
        check_success(&resp)?;

        if display_document {
            let mut display = Map::new();
            display.insert(DISPLAY_DOCUMENT.into(), Value::String(doc_id));
            self.modify_item(&item, Value::Object(display)).await?;
        }

        let doc_url = child_url(&item, &format!("document/{name}"));
        tracing::debug!(document = %doc_url, "created document");
        Ok(doc_url)
    }

    pub async fn delete_document(&self, document: &impl ToResourceKey) -> Result<String, Error> {
        let url = parse_resource_url(document.to_resource_key().as_str())?;
        let resp = self.send(ApiRequest::delete(url)).await?;
        Ok(message_text(&check_success(&resp)?))
    }
}
