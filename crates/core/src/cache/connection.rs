//! Index database connection management with pragma configuration.
//!
//! This module handles opening the SQLite index, applying pragmas and
//! running migrations. Namespace operations live in [`super::index`].

use super::migrations;
use crate::Error;
use std::path::{Path, PathBuf};
use tokio_rusqlite::Connection;

/// Cache index handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations on a
/// background thread. Calls are executed one at a time in submission order,
/// so each operation below is a single step with respect to other callers
/// of the same index.
#[derive(Debug)]
pub struct CacheIndex {
    pub(crate) conn: Connection,
    path: Option<PathBuf>,
}

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;";

impl CacheIndex {
    /// Open the index at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies pragmas, runs any
    /// pending migrations and verifies the namespace tables.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).await.map_err(|e| Error::Database(e.into()))?;

        Self::configure(&conn).await?;
        tracing::debug!(path = %path.display(), "opened cache index");

        Ok(Self { conn, path: Some(path) })
    }

    /// Open an in-memory index for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;

        Self::configure(&conn).await?;

        Ok(Self { conn, path: None })
    }

    async fn configure(conn: &Connection) -> Result<(), Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(conn).await
    }

    /// Location of the database file, `None` for in-memory indexes.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Release the connection and its background thread.
    pub async fn close(self) -> Result<(), Error> {
        self.conn.close().await.map_err(Error::Database)
    }
}
