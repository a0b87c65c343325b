//! Index schema migrations.
//!
//! Uses a simple version table approach to track applied migrations.
//! The first migration creates the three namespace tables with
//! `CREATE TABLE IF NOT EXISTS`, so a database written by an older client
//! (same tables, no version table) is adopted rather than rebuilt.

use std::num::ParseIntError;

use super::{Error, ResourceKind};
use tokio_rusqlite::{Connection, params, rusqlite};

/// Migration list: (version, SQL).
const MIGRATIONS: &[(&str, &str)] = &[
    ("1", include_str!("../../migrations/001_cache_tables.sql")),
    ("2", include_str!("../../migrations/002_key_indexes.sql")),
];

/// Run any pending migrations, then check the namespace tables.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` if a migration SQL fails to execute and
/// `Error::Configuration` if the database was written by a newer schema or
/// a namespace table lacks a required column.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(Error::from)?;

        let current: i64 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| {
                row.get(0)
            })
            .map_err(Error::from)?;

        let latest = MIGRATIONS.len() as i64;
        if current > latest {
            return Err(Error::Configuration(format!(
                "cache index schema version {current} is newer than supported version {latest}"
            )));
        }

        for (version, sql) in MIGRATIONS {
            let version_num: i64 = version
                .parse()
                .map_err(|e: ParseIntError| Error::MigrationFailed(e.to_string()))?;
            if version_num > current {
                conn.execute_batch(sql)
                    .map_err(|e| Error::MigrationFailed(format!("version {version_num}: {e}")))?;
                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                    params![version_num, chrono::Local::now().to_rfc3339()],
                )
                .map_err(Error::from)?;
                tracing::debug!(version = version_num, "applied cache index migration");
            }
        }

        verify_schema(conn)
    })
    .await
    .map_err(Error::from)
}

/// Check that every namespace table has its key, value and timestamp columns.
fn verify_schema(conn: &rusqlite::Connection) -> Result<(), Error> {
    for kind in ResourceKind::ALL {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", kind.table()))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;

        for required in [kind.key_column(), kind.value_column(), "datetime"] {
            if !columns.iter().any(|c| c == required) {
                return Err(Error::Configuration(format!(
                    "cache index table '{}' is missing column '{required}'",
                    kind.table()
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        let tables: i64 = conn
            .call(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table'
                     AND name IN ('items', 'documents', 'primary_texts')",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();

        assert_eq!(tables, 3);
    }

    #[tokio::test]
    async fn test_migrations_version_tracking() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();

        let count: i64 = conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0)))
            .await
            .unwrap();

        assert_eq!(count, MIGRATIONS.len() as i64);
    }

    #[tokio::test]
    async fn test_adopts_database_without_version_table() {
        let conn = Connection::open_in_memory().await.unwrap();
        conn.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE items (url text, metadata text, datetime text);
                 CREATE TABLE documents (url text, path text, datetime text);
                 CREATE TABLE primary_texts (item_url text, primary_text text, datetime text);
                 INSERT INTO items VALUES ('http://x/1', '{}', '2016-03-01T10:00:00+10:00');",
            )
        })
        .await
        .unwrap();

        run(&conn).await.unwrap();

        let rows: i64 = conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_rejects_table_missing_columns() {
        let conn = Connection::open_in_memory().await.unwrap();
        conn.call(|conn| conn.execute_batch("CREATE TABLE documents (url text, datetime text);"))
            .await
            .unwrap();

        let result = run(&conn).await;
        assert!(matches!(result, Err(Error::Configuration(msg)) if msg.contains("path")));
    }

    #[tokio::test]
    async fn test_rejects_newer_schema_version() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        conn.call(|conn| {
            conn.execute("INSERT INTO _migrations (version, applied_at) VALUES (99, 'later')", [])
        })
        .await
        .unwrap();

        let result = run(&conn).await;
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
