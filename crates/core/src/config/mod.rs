//! Client configuration with layered loading.
//!
//! Configuration is loaded with figment from several sources, highest wins:
//!
//! 1. Environment variables (ALVEO_*)
//! 2. TOML config file (if ALVEO_CONFIG_FILE set)
//! 3. Legacy JSON config at `~/alveo.config` (if present)
//! 4. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::cache::CacheSettings;

mod validation;

pub use validation::ConfigError;

/// Prefix of the environment variables read by [`AlveoConfig::load`].
pub const ENV_PREFIX: &str = "ALVEO_";

/// File name of the legacy JSON config in the home directory.
pub const LEGACY_CONFIG_FILE: &str = "alveo.config";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlveoConfig {
    /// API key sent in the `X-API-KEY` header.
    ///
    /// Set via ALVEO_API_KEY environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Pre-obtained OAuth bearer token, used when no API key is set.
    ///
    /// Set via ALVEO_OAUTH_TOKEN environment variable.
    #[serde(default)]
    pub oauth_token: Option<String>,

    /// Base URL of the Alveo server.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Root directory of the local cache. A leading `~` is expanded.
    ///
    /// Set via ALVEO_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Seconds before a cached entry is considered stale; 0 never expires.
    ///
    /// Set via ALVEO_MAX_AGE environment variable.
    #[serde(default)]
    pub max_age: u64,

    /// Read from the cache before going to the network.
    #[serde(default = "default_true")]
    pub use_cache: bool,

    /// Write fetched payloads back into the cache.
    #[serde(default = "default_true")]
    pub update_cache: bool,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Verify the server's TLS certificate.
    #[serde(default = "default_true")]
    pub verify_ssl: bool,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_url() -> String {
    "https://app.alveo.edu.au".into()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("~/alveo_cache")
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_user_agent() -> String {
    concat!("alveo-rs/", env!("CARGO_PKG_VERSION")).into()
}

fn default_true() -> bool {
    true
}

impl Default for AlveoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            oauth_token: None,
            api_url: default_api_url(),
            cache_dir: default_cache_dir(),
            max_age: 0,
            use_cache: true,
            update_cache: true,
            timeout_ms: default_timeout_ms(),
            verify_ssl: true,
            user_agent: default_user_agent(),
        }
    }
}

/// Layout of `~/alveo.config` as written by earlier clients.
///
/// Flags were stored as `"true"`/`"false"` strings as often as booleans.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LegacyConfig {
    #[serde(rename(deserialize = "apiKey"), default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(rename(deserialize = "base_url"), default, skip_serializing_if = "Option::is_none")]
    api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cache_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_age: Option<u64>,
    #[serde(default, deserialize_with = "flag", skip_serializing_if = "Option::is_none")]
    use_cache: Option<bool>,
    #[serde(default, deserialize_with = "flag", skip_serializing_if = "Option::is_none")]
    update_cache: Option<bool>,
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        None => None,
        Some(Flag::Bool(b)) => Some(b),
        Some(Flag::Text(s)) => Some(matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1")),
    })
}

impl LegacyConfig {
    fn read(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("{}: {e}", path.display())))?;
        let legacy = serde_json::from_str(&text)
            .map_err(|e| ConfigError::LoadFailed(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "read legacy config file");
        Ok(Some(legacy))
    }
}

/// Location of the legacy JSON config, if a home directory is known.
pub fn legacy_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LEGACY_CONFIG_FILE))
}

/// Replace a leading `~` with the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

impl AlveoConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - A configuration file cannot be read or parsed
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let toml = std::env::var_os("ALVEO_CONFIG_FILE").map(PathBuf::from);
        Self::load_layers(legacy_config_path().as_deref(), toml.as_deref(), ENV_PREFIX)
    }

    /// Load from explicit sources; see [`AlveoConfig::load`].
    pub fn load_layers(legacy: Option<&Path>, toml: Option<&Path>, env_prefix: &str) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(legacy) = legacy.map(LegacyConfig::read).transpose()?.flatten() {
            figment = figment.merge(Serialized::defaults(legacy));
        }

        if let Some(toml) = toml {
            figment = figment.merge(Toml::file(toml));
        }

        figment = figment.merge(
            Env::prefixed(env_prefix)
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let mut config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;
        config.cache_dir = expand_home(&config.cache_dir);

        config.validate()?;

        Ok(config)
    }

    /// Settings for opening the local cache.
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings::new(self.cache_dir.clone(), self.max_age)
    }

    /// Check that some credential is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if neither an API key nor an OAuth
    /// token is set.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .or(self.oauth_token.as_deref())
            .ok_or_else(|| ConfigError::Missing {
                field: "api_key".into(),
                hint: format!("Set ALVEO_API_KEY or add \"apiKey\" to ~/{LEGACY_CONFIG_FILE}"),
            })
    }
}
