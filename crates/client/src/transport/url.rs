//! URL handling for API requests.
//!
//! Resource URLs handed out by the server are used as-is (after a sanity
//! check); endpoint URLs are built by appending path segments to the
//! configured base URL.

/// Error type for URL parsing failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse a resource URL.
///
/// Trims whitespace, requires an http(s) scheme and drops any fragment.
/// Path and query are kept exactly, since the URL doubles as a cache key.
pub fn parse_resource_url(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(format!("{trimmed}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Append `path` to `base`, keeping any path prefix `base` already has.
///
/// `endpoint("https://host/alveo", "catalog/search")` is
/// `https://host/alveo/catalog/search`.
pub fn endpoint(base: &url::Url, path: &str) -> Result<url::Url, UrlError> {
    let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), path.trim_start_matches('/'));
    parse_resource_url(&joined)
}

/// Return `url` with the given query pairs appended (percent-encoded).
pub fn with_query<'a>(mut url: url::Url, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> url::Url {
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in pairs {
            query.append_pair(key, value);
        }
    }
    url
}
