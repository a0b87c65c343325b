//! reqwest-backed transport.

use std::time::{Duration, Instant};

use alveo_core::AlveoConfig;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, multipart};

use super::{ApiError, ApiRequest, Method, MultipartBody, Transport};

/// How requests are authenticated.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Sent in the `X-API-KEY` header.
    ApiKey(String),
    /// Pre-obtained OAuth token, sent as `Authorization: Bearer`.
    Bearer(String),
    Anonymous,
}

impl Credentials {
    /// API key if configured, else the OAuth token, else anonymous.
    pub fn from_config(config: &AlveoConfig) -> Self {
        match (&config.api_key, &config.oauth_token) {
            (Some(key), _) => Credentials::ApiKey(key.clone()),
            (None, Some(token)) => Credentials::Bearer(token.clone()),
            (None, None) => Credentials::Anonymous,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::ApiKey(_) => f.write_str("ApiKey(..)"),
            Credentials::Bearer(_) => f.write_str("Bearer(..)"),
            Credentials::Anonymous => f.write_str("Anonymous"),
        }
    }
}

/// Settings for building an [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub credentials: Credentials,
    pub user_agent: String,
    pub timeout: Duration,
    /// Verify the server's TLS certificate.
    pub verify_ssl: bool,
}

impl From<&AlveoConfig> for HttpConfig {
    fn from(config: &AlveoConfig) -> Self {
        Self {
            credentials: Credentials::from_config(config),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            verify_ssl: config.verify_ssl,
        }
    }
}

/// HTTP transport for the Alveo API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    credentials: Credentials,
}

impl HttpTransport {
    /// Create a new transport with the given configuration.
    pub fn new(config: HttpConfig) -> Result<Self, ApiError> {
        if !config.verify_ssl {
            tracing::warn!("TLS certificate verification disabled");
        }

        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()?;

        Ok(Self { http, credentials: config.credentials })
    }

    pub fn from_config(config: &AlveoConfig) -> Result<Self, ApiError> {
        Self::new(HttpConfig::from(config))
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

fn reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn multipart_form(body: MultipartBody) -> multipart::Form {
    let mut form = multipart::Form::new();
    for (name, value) in body.fields {
        form = form.text(name, value);
    }
    for file in body.files {
        let part = multipart::Part::bytes(file.content.to_vec()).file_name(file.file_name);
        form = form.part(file.field, part);
    }
    form
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: ApiRequest) -> Result<Bytes, ApiError> {
        let start = Instant::now();
        let ApiRequest { method, url, body, form } = request;

        let mut builder = self
            .http
            .request(reqwest_method(method), url.clone())
            .header(header::ACCEPT, "application/json");

        builder = match &self.credentials {
            Credentials::ApiKey(key) => builder.header("X-API-KEY", key),
            Credentials::Bearer(token) => builder.bearer_auth(token),
            Credentials::Anonymous => builder,
        };

        if let Some(form) = form {
            builder = builder.multipart(multipart_form(form));
        } else if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!(%method, %url, status = status.as_u16(), "API response");

        if status == 401 || status == 403 {
            return Err(ApiError::Unauthorized { status: status.as_u16(), method, url: url.to_string() });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status: status.as_u16(), method, url: url.to_string(), body });
        }

        let bytes = response.bytes().await?;

        tracing::debug!("{} {} completed in {:?} ({} bytes)", method, url, start.elapsed(), bytes.len());

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_prefer_api_key() {
        let config = AlveoConfig {
            api_key: Some("key".into()),
            oauth_token: Some("token".into()),
            ..Default::default()
        };
        assert_eq!(Credentials::from_config(&config), Credentials::ApiKey("key".into()));

        let config = AlveoConfig { oauth_token: Some("token".into()), ..Default::default() };
        assert_eq!(Credentials::from_config(&config), Credentials::Bearer("token".into()));

        assert_eq!(Credentials::from_config(&AlveoConfig::default()), Credentials::Anonymous);
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let rendered = format!("{:?}", Credentials::ApiKey("super-secret".into()));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn test_http_config_from_alveo_config() {
        let config = AlveoConfig { timeout_ms: 1_500, verify_ssl: false, ..Default::default() };
        let http = HttpConfig::from(&config);
        assert_eq!(http.timeout, Duration::from_millis(1_500));
        assert!(!http.verify_ssl);
    }

    #[tokio::test]
    async fn test_transport_new() {
        let transport = HttpTransport::from_config(&AlveoConfig::default());
        assert!(transport.is_ok());
    }
}
