//! Unified error types for the Alveo client.
//!
//! Cache failures fall into three groups: a key that is simply absent
//! (`NotFound`), storage that could not be read or written (`is_storage`),
//! and a cache root or index that is unusable (`Configuration`).

use std::path::PathBuf;

use tokio_rusqlite::rusqlite;

use crate::cache::ResourceKind;

/// Unified error types for the Alveo client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No cache entry exists for the key in the given namespace.
    #[error("NOT_FOUND: {kind} not present in cache: {key}")]
    NotFound { kind: ResourceKind, key: String },

    /// A blob file or cache directory could not be read, written or created.
    #[error("STORAGE_ERROR: {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The index has a row for a document whose backing file is unreadable.
    #[error("STORAGE_ERROR: error reading file {} to retrieve document {key}: {source}", path.display())]
    MissingBlob {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every generated blob name was already taken.
    #[error("STORAGE_ERROR: no unused blob file name after {attempts} attempts")]
    BlobNameExhausted { attempts: u32 },

    /// Database operation failed.
    #[error("STORAGE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// The index connection failed in a way not covered by `Database`.
    #[error("STORAGE_ERROR: index connection failed: {0}")]
    IndexConnection(String),

    /// Migration failed to apply.
    #[error("STORAGE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// The cache root or index is not usable.
    #[error("CONFIG_ERROR: {0}")]
    Configuration(String),

    /// Invalid input parameters.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// The server rejected the credentials.
    #[error("UNAUTHORIZED: {0}")]
    Unauthorized(String),

    /// HTTP error response.
    #[error("HTTP_ERROR: status {status}: {message}")]
    HttpError { status: u16, message: String },

    /// Request timed out.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Connection-level failure.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// The server answered 200 but reported that the operation failed.
    #[error("API_ERROR: operation failed: {0}")]
    ApiFailed(String),

    /// A response body did not have the expected shape.
    #[error("PARSE_ERROR: {0}")]
    Parse(String),
}

impl Error {
    /// Whether this is a read/write failure of the cache's own storage.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Storage { .. }
                | Error::MissingBlob { .. }
                | Error::BlobNameExhausted { .. }
                | Error::Database(_)
                | Error::IndexConnection(_)
                | Error::MigrationFailed(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Storage { path: path.into(), source }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            other => Error::IndexConnection(other.to_string()),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
