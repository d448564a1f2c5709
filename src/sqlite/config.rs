use std::path::PathBuf;
use std::time::Duration;

use rusqlite::OpenFlags;
use serde::Deserialize;

use crate::connection::DbConnection;
use crate::error::SqlAccessError;
use crate::source::ConnectionSource;

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

/// Options for opening `SQLite` connections.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteOptions {
    pub db_path: PathBuf,
    /// How long a statement waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Switch the database to WAL journaling on open.
    #[serde(default = "default_true")]
    pub wal: bool,
    #[serde(default)]
    pub foreign_keys: bool,
    #[serde(default = "default_true")]
    pub create_if_missing: bool,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout_ms: default_busy_timeout_ms(),
            wal: true,
            foreign_keys: false,
            create_if_missing: true,
        }
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn foreign_keys(mut self, foreign_keys: bool) -> Self {
        self.opts.foreign_keys = foreign_keys;
        self
    }

    #[must_use]
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.opts.create_if_missing = create;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Build a connection source from these options.
    #[must_use]
    pub fn build(self) -> SqliteSource {
        SqliteSource::new(self.finish())
    }
}

/// Opens one `SQLite` connection per acquire.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    opts: SqliteOptions,
}

impl SqliteSource {
    #[must_use]
    pub fn new(opts: SqliteOptions) -> Self {
        Self { opts }
    }

    #[must_use]
    pub fn builder(db_path: impl Into<PathBuf>) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }

    #[must_use]
    pub fn options(&self) -> &SqliteOptions {
        &self.opts
    }

    /// Open and configure a connection.
    ///
    /// # Errors
    ///
    /// Returns `SqlAccessError::ConnectionError` if the file cannot be opened,
    /// or the driver error if a pragma fails.
    pub fn open(&self) -> Result<rusqlite::Connection, SqlAccessError> {
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.opts.create_if_missing {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }
        let conn = rusqlite::Connection::open_with_flags(&self.opts.db_path, flags).map_err(|e| {
            SqlAccessError::ConnectionError(format!(
                "Failed to open SQLite database {}: {e}",
                self.opts.db_path.display()
            ))
        })?;
        conn.busy_timeout(Duration::from_millis(self.opts.busy_timeout_ms))?;
        if self.opts.wal {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        if self.opts.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        }
        Ok(conn)
    }
}

impl ConnectionSource for SqliteSource {
    fn acquire(&self) -> Result<DbConnection, SqlAccessError> {
        self.open().map(DbConnection::sqlite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let opts = SqliteSource::builder("app.db")
            .busy_timeout(Duration::from_millis(250))
            .wal(false)
            .foreign_keys(true)
            .finish();
        assert_eq!(opts.busy_timeout_ms, 250);
        assert!(!opts.wal);
        assert!(opts.foreign_keys);
        assert!(opts.create_if_missing);
    }

    #[test]
    fn deserializes_with_defaults() {
        let opts: SqliteOptions = serde_json::from_str(r#"{ "db_path": "data/app.db" }"#).unwrap();
        assert_eq!(opts.db_path, PathBuf::from("data/app.db"));
        assert_eq!(opts.busy_timeout_ms, 5_000);
        assert!(opts.wal);
        assert!(!opts.foreign_keys);
    }

    #[test]
    fn refuses_missing_file_without_create() {
        let dir = tempfile::tempdir().unwrap();
        let source = SqliteSource::builder(dir.path().join("absent.db"))
            .create_if_missing(false)
            .build();
        assert!(matches!(
            source.open(),
            Err(SqlAccessError::ConnectionError(_))
        ));
    }
}
