//! SQLite store handle and connection setup.
//!
//! Runtime defaults:
//! - `journal_mode = WAL` so readers proceed while a writer commits
//! - `busy_timeout = 5s` so concurrent writers queue instead of failing
//! - `foreign_keys = ON` to protect relational integrity between tables
//!
//! The store is never reached through global state. Callers construct a
//! [`Store`] once, pass it to whatever serves requests, and open one
//! [`Connection`] per request with [`Store::connect`].

pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to an initialized, migrated stockpile database file.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    busy_timeout: Duration,
}

impl Store {
    /// Create (if needed) and migrate the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// database cannot be opened, configured, or migrated.
    pub fn init(path: &Path, busy_timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create store directory {}", parent.display()))?;
            }
        }

        let mut conn = open_configured(path, busy_timeout)?;
        migrations::migrate(&mut conn).context("apply store migrations")?;
        conn.close()
            .map_err(|(_, err)| err)
            .context("close migration connection")?;

        tracing::debug!(path = %path.display(), "stockpile store ready");

        Ok(Self {
            path: path.to_path_buf(),
            busy_timeout,
        })
    }

    /// Open an existing store without creating it.
    ///
    /// Returns `Ok(None)` when no database exists at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be opened or migrated.
    pub fn open_existing(path: &Path, busy_timeout: Duration) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::init(path, busy_timeout).map(Some)
    }

    /// Open a fresh connection for one request.
    ///
    /// # Errors
    ///
    /// Returns an error if opening or configuring the connection fails.
    pub fn connect(&self) -> Result<Connection> {
        open_configured(&self.path, self.busy_timeout)
    }

    /// Path of the underlying database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Open a migrated in-memory database, mainly for tests and dry runs.
///
/// # Errors
///
/// Returns an error if SQLite cannot allocate the database or migrations fail.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory store")?;
    configure_connection(&conn, DEFAULT_BUSY_TIMEOUT).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply store migrations")?;
    Ok(conn)
}

fn open_configured(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    let conn =
        Connection::open(path).with_context(|| format!("open store database {}", path.display()))?;
    configure_connection(&conn, busy_timeout).context("configure sqlite pragmas")?;
    Ok(conn)
}

fn configure_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(busy_timeout)?;
    register_casefold(conn)
}

/// `casefold(text)`: Unicode lowercase, for case-insensitive name search.
///
/// SQLite's built-in `LIKE` and `lower()` only fold ASCII letters.
fn register_casefold(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
}

/// Fold a search fragment the same way `casefold` folds stored names.
pub(crate) fn fold_fragment(fragment: &str) -> String {
    fragment.trim().to_lowercase()
}

/// Current wall-clock time in microseconds, used for `*_at_us` columns.
pub(crate) fn now_us() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_BUSY_TIMEOUT, Store};
    use crate::db::migrations;
    use tempfile::TempDir;

    fn temp_db_path() -> (TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("nested/stockpile.db");
        (dir, path)
    }

    #[test]
    fn connect_sets_wal_busy_timeout_and_fk() {
        let (_dir, path) = temp_db_path();
        let store = Store::init(&path, DEFAULT_BUSY_TIMEOUT).expect("init store");
        let conn = store.connect().expect("connect");

        let journal_mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .expect("query journal_mode");
        assert_eq!(journal_mode.to_ascii_lowercase(), "wal");

        let busy_timeout_ms: u64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .expect("query busy_timeout");
        assert_eq!(
            u128::from(busy_timeout_ms),
            DEFAULT_BUSY_TIMEOUT.as_millis()
        );

        let foreign_keys: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .expect("query foreign_keys");
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn init_creates_parent_and_runs_migrations() {
        let (_dir, path) = temp_db_path();
        let store = Store::init(&path, DEFAULT_BUSY_TIMEOUT).expect("init store");
        assert!(store.path().exists());

        let conn = store.connect().expect("connect");
        let version = migrations::current_schema_version(&conn).expect("schema version query");
        assert_eq!(version, migrations::LATEST_SCHEMA_VERSION);
    }

    #[test]
    fn open_existing_returns_none_for_missing_file() {
        let (_dir, path) = temp_db_path();
        let store = Store::open_existing(&path, DEFAULT_BUSY_TIMEOUT).expect("probe store");
        assert!(store.is_none());
        assert!(!path.exists());
    }
}
