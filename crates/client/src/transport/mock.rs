//! In-memory transport for tests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use super::{ApiError, ApiRequest, Method, Transport};

/// Serves canned responses keyed by method and URL and records every request.
///
/// Unregistered requests fail with a 404 status error.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<(Method, String), Result<Bytes, ApiError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, url: &str, body: impl Into<Bytes>) {
        self.set(method, url, Ok(body.into()));
    }

    pub fn respond_json(&self, method: Method, url: &str, body: &Value) {
        self.respond(method, url, body.to_string());
    }

    pub fn fail(&self, method: Method, url: &str, error: ApiError) {
        self.set(method, url, Err(error));
    }

    fn set(&self, method: Method, url: &str, response: Result<Bytes, ApiError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((method, url.to_string()), response);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of requests made to `url` with `method`.
    pub fn count(&self, method: Method, url: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.url.as_str() == url)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: ApiRequest) -> Result<Bytes, ApiError> {
        let key = (request.method, request.url.to_string());
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request);

        match self.responses.lock().unwrap_or_else(PoisonError::into_inner).get(&key) {
            Some(response) => response.clone(),
            None => Err(ApiError::Status { status: 404, method: key.0, url: key.1, body: "not found".into() }),
        }
    }
}
