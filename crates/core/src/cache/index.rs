//! Namespace operations on the cache index.
//!
//! Each namespace maps a resource URL to a payload (or, for documents, a
//! blob path) and the time the row was written. Writes replace every
//! existing row for the key inside one transaction.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use tokio_rusqlite::rusqlite::types::{Type, ValueRef};
use tokio_rusqlite::{params, rusqlite};

use super::blobs::BlobStore;
use super::connection::CacheIndex;
use super::ResourceKind;
use crate::{Error, ResourceKey};

/// Parse a stored `datetime` column.
///
/// Rows are written as RFC 3339 with an offset. Older rows without an
/// offset are read as local time.
pub fn parse_recorded_at(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at);
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    Local.from_local_datetime(&naive).earliest().map(|at| at.fixed_offset())
}

/// Whether a row written at `recorded_at` is still fresh at `now`.
///
/// A `max_age` of 0 means entries never expire. An unparseable timestamp
/// is never fresh under a positive `max_age`.
pub fn is_fresh(recorded_at: &str, now: DateTime<FixedOffset>, max_age: u64) -> bool {
    if max_age == 0 {
        return true;
    }
    let Some(at) = parse_recorded_at(recorded_at) else {
        tracing::warn!(recorded_at, "unparseable cache timestamp, treating entry as stale");
        return false;
    };
    let max_age_ms = i64::try_from(max_age).unwrap_or(i64::MAX).saturating_mul(1000);
    (now - at).num_milliseconds() <= max_age_ms
}

/// Read a text column that may hold TEXT or a UTF-8 BLOB.
///
/// Caches written by older clients store payloads as BLOBs.
fn text_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Blob, Box::new(e))),
        other => Err(rusqlite::Error::InvalidColumnType(idx, "text".into(), other.data_type())),
    }
}

/// Inline value or blob path of the row for `key`, run on the connection thread.
fn select_value(conn: &rusqlite::Connection, kind: ResourceKind, key: &str) -> Result<String, Error> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ?1 LIMIT 1",
        kind.value_column(),
        kind.table(),
        kind.key_column()
    );
    match conn.query_row(&sql, params![key], |row| text_column(row, 0)) {
        Ok(value) => Ok(value.unwrap_or_default()),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(Error::NotFound { kind, key: key.to_string() }),
        Err(e) => Err(e.into()),
    }
}

/// Swap every document row for `key` with one pointing at `path`.
///
/// Returns the blob paths the removed rows referenced.
fn replace_document_row(
    conn: &mut rusqlite::Connection, key: &str, path: &str, recorded_at: &str,
) -> Result<Vec<String>, Error> {
    let tx = conn.transaction()?;
    let old_paths = {
        let mut stmt = tx.prepare("SELECT path FROM documents WHERE url = ?1")?;
        stmt.query_map(params![key], |row| text_column(row, 0))?
            .collect::<Result<Vec<_>, _>>()?
    };
    tx.execute("DELETE FROM documents WHERE url = ?1", params![key])?;
    tx.execute(
        "INSERT INTO documents (url, path, datetime) VALUES (?1, ?2, ?3)",
        params![key, path, recorded_at],
    )?;
    tx.commit()?;
    Ok(old_paths.into_iter().flatten().collect())
}

impl CacheIndex {
    /// Timestamp of the row for `key`, if any.
    pub async fn recorded_at(&self, kind: ResourceKind, key: &ResourceKey) -> Result<Option<String>, Error> {
        let sql = format!(
            "SELECT datetime FROM {} WHERE {} = ?1 LIMIT 1",
            kind.table(),
            kind.key_column()
        );
        let key = key.as_str().to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                match conn.query_row(&sql, params![key], |row| text_column(row, 0)) {
                    Ok(at) => Ok(Some(at.unwrap_or_default())),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a row exists for `key` and is no older than `max_age` seconds.
    pub async fn exists_fresh(
        &self, kind: ResourceKind, key: &ResourceKey, max_age: u64, now: DateTime<FixedOffset>,
    ) -> Result<bool, Error> {
        let fresh = match self.recorded_at(kind, key).await? {
            Some(recorded_at) => is_fresh(&recorded_at, now, max_age),
            None => false,
        };
        tracing::debug!(%kind, %key, fresh, "cache freshness check");
        Ok(fresh)
    }

    /// Stored text for items and primary texts; the blob path for documents.
    ///
    /// Returns `Error::NotFound` if no row exists for `key`.
    pub async fn lookup(&self, kind: ResourceKind, key: &ResourceKey) -> Result<String, Error> {
        let key = key.as_str().to_string();
        self.conn
            .call(move |conn| select_value(conn, kind, &key))
            .await
            .map_err(Error::from)
    }

    /// Replace the inline payload for `key` in an item or primary text namespace.
    pub async fn put_text(
        &self, kind: ResourceKind, key: &ResourceKey, text: String, now: DateTime<FixedOffset>,
    ) -> Result<(), Error> {
        if !kind.is_inline() {
            return Err(Error::InvalidInput(format!("{kind} payloads are not stored inline")));
        }
        let delete = format!("DELETE FROM {} WHERE {} = ?1", kind.table(), kind.key_column());
        let insert = format!(
            "INSERT INTO {} ({}, {}, datetime) VALUES (?1, ?2, ?3)",
            kind.table(),
            kind.key_column(),
            kind.value_column()
        );
        let key = key.as_str().to_string();
        let recorded_at = now.to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(&delete, params![key])?;
                tx.execute(&insert, params![key, text, recorded_at])?;
                tx.commit()?;
                tracing::debug!(%kind, key = %key, size = text.len(), "cached inline payload");
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Store document bytes in a new blob and point the row for `key` at it.
    ///
    /// Every blob referenced by an earlier row for `key` is removed, so a
    /// file orphaned by an interrupted write is cleaned up as well. Returns
    /// the path of the new blob.
    pub async fn put_document(
        &self, blobs: &BlobStore, key: &ResourceKey, bytes: Vec<u8>, now: DateTime<FixedOffset>,
    ) -> Result<PathBuf, Error> {
        let blobs = blobs.clone();
        let key = key.as_str().to_string();
        let recorded_at = now.to_rfc3339();
        self.conn
            .call(move |conn| -> Result<PathBuf, Error> {
                let path = blobs.generate_path()?;
                blobs.write(&path, &bytes)?;

                let path_str = path.to_string_lossy().into_owned();
                let old_paths = match replace_document_row(conn, &key, &path_str, &recorded_at) {
                    Ok(old_paths) => old_paths,
                    Err(e) => {
                        if let Err(cleanup) = blobs.delete(&path) {
                            tracing::warn!(error = %cleanup, "failed to remove blob of aborted document write");
                        }
                        return Err(e);
                    }
                };

                for old in old_paths {
                    if let Err(e) = blobs.delete(Path::new(&old)) {
                        tracing::warn!(path = %old, error = %e, "failed to remove replaced document blob");
                    }
                }

                tracing::debug!(key = %key, path = %path_str, size = bytes.len(), "cached document");
                Ok(path)
            })
            .await
            .map_err(Error::from)
    }

    /// Read the bytes of the cached document for `key`.
    ///
    /// A row whose blob cannot be read is a `MissingBlob` error, not a miss.
    pub async fn read_document(&self, blobs: &BlobStore, key: &ResourceKey) -> Result<Vec<u8>, Error> {
        let blobs = blobs.clone();
        let key = key.as_str().to_string();
        self.conn
            .call(move |conn| -> Result<Vec<u8>, Error> {
                let path = PathBuf::from(select_value(conn, ResourceKind::Document, &key)?);
                blobs.read(&path).map_err(|e| match e {
                    Error::Storage { path, source } => Error::MissingBlob { key, path, source },
                    other => other,
                })
            })
            .await
            .map_err(Error::from)
    }

    /// Number of rows stored for `key`.
    pub async fn row_count(&self, kind: ResourceKind, key: &ResourceKey) -> Result<usize, Error> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?1", kind.table(), kind.key_column());
        let key = key.as_str().to_string();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 = conn.query_row(&sql, params![key], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }
}
