//! Request execution against the Alveo API.
//!
//! The [`Transport`] trait is the only way the client talks to the network.
//! [`HttpTransport`] is the reqwest-backed implementation; tests swap in a
//! mock that serves canned responses.

pub mod error;
pub mod http;
#[cfg(test)]
pub mod mock;
pub mod url;

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

pub use error::ApiError;
pub use http::{Credentials, HttpTransport};
pub use url::{UrlError, endpoint, parse_resource_url, with_query};

/// HTTP methods used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file sent as one part of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content: Bytes,
}

/// A `multipart/form-data` body: text fields followed by file parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartBody {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl MultipartBody {
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(mut self, field: impl Into<String>, file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        self.files.push(FilePart { field: field.into(), file_name: file_name.into(), content: content.into() });
        self
    }

    /// Text value of the first field called `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }
}

/// One API request: method, absolute URL and an optional JSON or
/// multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: ::url::Url,
    pub body: Option<Value>,
    pub form: Option<MultipartBody>,
}

impl ApiRequest {
    pub fn get(url: ::url::Url) -> Self {
        Self { method: Method::Get, url, body: None, form: None }
    }

    pub fn post(url: ::url::Url, body: Value) -> Self {
        Self { method: Method::Post, url, body: Some(body), form: None }
    }

    /// POST a multipart form.
    pub fn upload(url: ::url::Url, form: MultipartBody) -> Self {
        Self { method: Method::Post, url, body: None, form: Some(form) }
    }

    pub fn put(url: ::url::Url, body: Value) -> Self {
        Self { method: Method::Put, url, body: Some(body), form: None }
    }

    pub fn delete(url: ::url::Url) -> Self {
        Self { method: Method::Delete, url, body: None, form: None }
    }
}

/// Executes API requests.
///
/// Implementations return the raw response body on a 2xx status and an
/// [`ApiError`] otherwise.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: ApiRequest) -> Result<Bytes, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn request(&self, request: ApiRequest) -> Result<Bytes, ApiError> {
        (**self).request(request).await
    }
}
