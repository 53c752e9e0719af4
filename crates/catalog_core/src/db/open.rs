//! Connection lifecycle utilities for the catalog store.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable connection.
//! - Close connections explicitly so shutdown failures are observable.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolved target of a database URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    Memory,
}

impl StoreLocation {
    /// Parses `sqlite://<path>`, `sqlite:<path>`, `file:<path>`, a bare path,
    /// or `:memory:`. Query strings (`?mode=...`) are ignored.
    pub fn parse(url: &str) -> DbResult<Self> {
        let trimmed = url.trim();
        let without_scheme = ["sqlite://", "sqlite:", "file:"]
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix))
            .unwrap_or(trimmed);

        if without_scheme.contains("://") {
            return Err(DbError::UnsupportedUrl(trimmed.to_string()));
        }

        let target = without_scheme
            .split_once('?')
            .map_or(without_scheme, |(path, _)| path);
        match target {
            "" => Err(DbError::UnsupportedUrl(trimmed.to_string())),
            ":memory:" => Ok(Self::Memory),
            path => Ok(Self::File(PathBuf::from(path))),
        }
    }

    /// Opens the store at this location and applies pending migrations.
    pub fn open(&self) -> DbResult<Connection> {
        match self {
            Self::File(path) => open_db(path),
            Self::Memory => open_db_in_memory(),
        }
    }
}

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

/// Opens the store addressed by a `DATABASE_URL` value.
pub fn open_db_from_url(url: &str) -> DbResult<Connection> {
    StoreLocation::parse(url)?.open()
}

/// Closes a connection, surfacing any pending-statement failure.
pub fn close_db(conn: Connection) -> DbResult<()> {
    let started_at = Instant::now();
    match conn.close() {
        Ok(()) => {
            info!(
                "event=db_close module=db status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err((_conn, err)) => {
            error!(
                "event=db_close module=db status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err.into())
        }
    }
}

fn open_with(
    mode: &str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn) {
        Ok(applied) => {
            info!(
                "event=db_open module=db status=ok mode={} migrations_applied={} duration_ms={}",
                mode,
                applied,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<usize> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)
}

#[cfg(test)]
mod tests {
    use super::StoreLocation;
    use crate::db::migrations::{latest_version, schema_version};
    use crate::db::DbError;
    use std::path::PathBuf;

    #[test]
    fn parse_accepts_sqlite_and_file_schemes() {
        assert_eq!(
            StoreLocation::parse("sqlite://data/catalog.db").unwrap(),
            StoreLocation::File(PathBuf::from("data/catalog.db"))
        );
        assert_eq!(
            StoreLocation::parse("file:./dev.db?mode=rwc").unwrap(),
            StoreLocation::File(PathBuf::from("./dev.db"))
        );
        assert_eq!(
            StoreLocation::parse("/var/lib/catalog.db").unwrap(),
            StoreLocation::File(PathBuf::from("/var/lib/catalog.db"))
        );
    }

    #[test]
    fn parse_recognizes_memory_targets() {
        assert_eq!(StoreLocation::parse(":memory:").unwrap(), StoreLocation::Memory);
        assert_eq!(
            StoreLocation::parse("sqlite::memory:").unwrap(),
            StoreLocation::Memory
        );
    }

    #[test]
    fn parsed_memory_location_opens_migrated_store() {
        let conn = StoreLocation::parse("sqlite::memory:")
            .unwrap()
            .open()
            .unwrap();
        assert_eq!(schema_version(&conn).unwrap(), latest_version());
    }

    #[test]
    fn parse_rejects_foreign_schemes_and_empty_values() {
        assert!(matches!(
            StoreLocation::parse("postgresql://localhost:5432/products"),
            Err(DbError::UnsupportedUrl(_))
        ));
        assert!(matches!(
            StoreLocation::parse("  "),
            Err(DbError::UnsupportedUrl(_))
        ));
    }
}
