//! Transport error types.

use std::sync::Arc;

use super::Method;
use super::url::UrlError;

/// A failed API request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The server rejected the credentials (401/403).
    #[error("UNAUTHORIZED: {method} {url}: status {status}")]
    Unauthorized { status: u16, method: Method, url: String },

    /// Any other non-success HTTP status.
    #[error("HTTP_ERROR: {method} {url}: status {status}: {body}")]
    Status { status: u16, method: Method, url: String, body: String },

    /// Request timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    Timeout(String),

    /// Connection-level failure.
    #[error("NETWORK_ERROR: {0}")]
    Network(Arc<reqwest::Error>),

    #[error("INVALID_URL: {0}")]
    InvalidUrl(#[from] UrlError),

    /// The server answered but reported that the operation failed.
    #[error("API_ERROR: operation failed: {0}")]
    Failed(String),

    /// Response body did not have the expected shape.
    #[error("PARSE_ERROR: {0}")]
    Parse(String),
}

impl ApiError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { status, .. } | ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ApiError::Timeout(err.to_string()) } else { ApiError::Network(Arc::new(err)) }
    }
}

impl From<ApiError> for alveo_core::Error {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized { .. } => alveo_core::Error::Unauthorized(err.to_string()),
            ApiError::Status { status, ref method, ref url, ref body } => {
                alveo_core::Error::HttpError { status, message: format!("{method} {url}: {body}") }
            }
            ApiError::Timeout(msg) => alveo_core::Error::FetchTimeout(msg),
            ApiError::Network(e) => alveo_core::Error::Network(e.to_string()),
            ApiError::InvalidUrl(e) => alveo_core::Error::InvalidUrl(e.to_string()),
            ApiError::Failed(msg) => alveo_core::Error::ApiFailed(msg),
            ApiError::Parse(msg) => alveo_core::Error::Parse(msg),
        }
    }
}

impl From<UrlError> for alveo_core::Error {
    fn from(err: UrlError) -> Self {
        alveo_core::Error::InvalidUrl(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::Status {
            status: 404,
            method: Method::Get,
            url: "https://app.alveo.edu.au/catalog/x".into(),
            body: "not found".into(),
        };
        assert!(err.to_string().starts_with("HTTP_ERROR"));
        assert!(err.to_string().contains("GET"));
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_into_core_error() {
        let err = ApiError::Unauthorized { status: 401, method: Method::Get, url: "u".into() };
        assert!(matches!(alveo_core::Error::from(err), alveo_core::Error::Unauthorized(_)));

        let err = ApiError::Status { status: 500, method: Method::Post, url: "u".into(), body: String::new() };
        assert!(matches!(alveo_core::Error::from(err), alveo_core::Error::HttpError { status: 500, .. }));

        let err = ApiError::Failed("nope".into());
        assert!(matches!(alveo_core::Error::from(err), alveo_core::Error::ApiFailed(_)));
    }
}
