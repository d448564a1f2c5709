use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::connection::DbConnection;
use crate::error::SqlAccessError;
use crate::executor;
use crate::results::{Row, RowSet};
use crate::source::ConnectionSource;
use crate::statement::Statement;
use crate::transaction::Transaction;
use crate::types::{DatabaseType, GeneratedKeys, IsolationLevel};

/// Entry point for running statements.
///
/// Outside a transaction every call acquires its own connection from the
/// source and releases it before returning, so one `Database` can be cloned
/// and used from many threads at once.
///
/// ```rust,no_run
/// use sql_access::{Database, IsolationLevel, SqlAccessError, SqlExt};
///
/// # fn main() -> Result<(), SqlAccessError> {
/// let db = Database::connect("sqlite:app.db")?;
/// db.execute_batch("CREATE TABLE IF NOT EXISTS people (id INTEGER PRIMARY KEY, name TEXT)")?;
///
/// let keys = db.insert("INSERT INTO people (name) VALUES (:name)".params([("name", "Kasia")]))?;
/// let id = keys["id"].clone();
///
/// let name = db.find_one(
///     "SELECT name FROM people WHERE id = ?".params_list([id]),
///     |row| row.string("name"),
/// )?;
/// assert_eq!(name.as_deref(), Some("Kasia"));
///
/// db.transaction(IsolationLevel::Serializable, |tx| {
///     tx.update("UPDATE people SET name = 'Kasia K.' WHERE name = 'Kasia'")?;
///     Ok::<_, SqlAccessError>(())
/// })?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Database {
    source: Arc<dyn ConnectionSource>,
}

impl Database {
    pub fn new(source: impl ConnectionSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    #[must_use]
    pub fn from_source(source: Arc<dyn ConnectionSource>) -> Self {
        Self { source }
    }

    /// Open a database from a URL: `sqlite:<path>` (or `sqlite://<path>`) or
    /// `postgres://...` / `postgresql://...`.
    ///
    /// Every acquire opens a fresh connection, so a private in-memory `SQLite`
    /// database (`sqlite::memory:` or an empty path) would be empty on every
    /// call and is rejected. Use a file path, or a shared-cache URI such as
    /// `sqlite:file:mem1?mode=memory&cache=shared`.
    ///
    /// # Errors
    ///
    /// Returns `SqlAccessError::ConfigError` for an unknown scheme, a backend
    /// that is not compiled in, or a private in-memory `SQLite` database. No
    /// connection is opened until first use.
    pub fn connect(url: &str) -> Result<Self, SqlAccessError> {
        match backend_for_url(url)? {
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => {
                let path = url
                    .strip_prefix("sqlite://")
                    .or_else(|| url.strip_prefix("sqlite:"))
                    .unwrap_or(url);
                if path.is_empty() || path == ":memory:" {
                    return Err(SqlAccessError::ConfigError(format!(
                        "{url} opens a new empty database per connection; use a file or a shared-cache URI"
                    )));
                }
                Ok(Self::new(crate::sqlite::SqliteSource::new(
                    crate::sqlite::SqliteOptions::new(path),
                )))
            }
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => Ok(Self::new(crate::postgres::PostgresSource::new(
                crate::postgres::PostgresOptions::new(url),
            ))),
        }
    }

    /// Acquire a connection for direct use.
    ///
    /// # Errors
    ///
    /// Whatever the source reports.
    pub fn acquire(&self) -> Result<DbConnection, SqlAccessError> {
        self.source.acquire()
    }

    /// First row through `extractor`, or `None` if the query matched nothing.
    ///
    /// Rows after the first are ignored.
    ///
    /// # Errors
    ///
    /// Binding, driver and extractor failures, unchanged.
    pub fn find_one<T, F>(
        &self,
        stmt: impl Into<Statement>,
        extractor: F,
    ) -> Result<Option<T>, SqlAccessError>
    where
        F: Fn(&Row<'_>) -> Result<T, SqlAccessError>,
    {
        executor::find_one(&mut self.acquire()?, &stmt.into(), extractor)
    }

    /// Every row through `extractor`, in result order. No rows gives an empty `Vec`.
    ///
    /// # Errors
    ///
    /// Binding, driver and extractor failures, unchanged.
    pub fn find_all<T, F>(
        &self,
        stmt: impl Into<Statement>,
        extractor: F,
    ) -> Result<Vec<T>, SqlAccessError>
    where
        F: Fn(&Row<'_>) -> Result<T, SqlAccessError>,
    {
        executor::find_all(&mut self.acquire()?, &stmt.into(), extractor)
    }

    /// Hand the whole cursor to `consume`, which advances it as it likes.
    ///
    /// # Errors
    ///
    /// Binding, driver and `consume` failures, unchanged.
    pub fn find_with<T, F>(&self, stmt: impl Into<Statement>, consume: F) -> Result<T, SqlAccessError>
    where
        F: FnOnce(&mut RowSet<'_>) -> Result<T, SqlAccessError>,
    {
        executor::find_with(&mut self.acquire()?, &stmt.into(), consume)
    }

    /// Run an INSERT/UPDATE/DELETE and return the affected row count.
    ///
    /// # Errors
    ///
    /// Binding and driver failures.
    pub fn update(&self, stmt: impl Into<Statement>) -> Result<usize, SqlAccessError> {
        executor::update(&mut self.acquire()?, &stmt.into())
    }

    /// Run an INSERT and return the values generated for the inserted row.
    ///
    /// # Errors
    ///
    /// Binding and driver failures.
    pub fn insert(&self, stmt: impl Into<Statement>) -> Result<GeneratedKeys, SqlAccessError> {
        executor::insert(&mut self.acquire()?, &stmt.into(), &[])
    }

    /// Like [`Database::insert`], reporting only `key_columns`.
    ///
    /// # Errors
    ///
    /// Binding and driver failures.
    pub fn insert_returning(
        &self,
        stmt: impl Into<Statement>,
        key_columns: &[&str],
    ) -> Result<GeneratedKeys, SqlAccessError> {
        executor::insert(&mut self.acquire()?, &stmt.into(), key_columns)
    }

    /// Run parameterless SQL, possibly several statements.
    ///
    /// # Errors
    ///
    /// Driver failures.
    pub fn execute_batch(&self, sql: &str) -> Result<(), SqlAccessError> {
        executor::execute_batch(&mut self.acquire()?, sql)
    }

    /// Begin a transaction under manual control.
    ///
    /// # Errors
    ///
    /// Acquisition failures or the driver error from BEGIN.
    pub fn begin(&self, isolation: IsolationLevel) -> Result<Transaction, SqlAccessError> {
        Transaction::begin(self.acquire()?, isolation)
    }

    /// Run `work` inside a transaction on a freshly acquired connection.
    ///
    /// Commits when `work` returns `Ok` (or rolls back if it called
    /// [`Transaction::set_rollback_only`]); rolls back when it returns `Err`
    /// and hands that error back unchanged. A panic in `work` rolls back as
    /// the transaction unwinds. Calling `transaction` again from inside
    /// `work` starts an independent transaction on another connection.
    ///
    /// # Errors
    ///
    /// The error returned by `work`, or a failure to begin or commit.
    pub fn transaction<R, E, F>(&self, isolation: IsolationLevel, work: F) -> Result<R, E>
    where
        F: FnOnce(&mut Transaction) -> Result<R, E>,
        E: From<SqlAccessError>,
    {
        let mut tx = self.begin(isolation)?;
        match work(&mut tx) {
            Ok(value) if tx.is_rollback_only() => {
                tx.rollback()?;
                Ok(value)
            }
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "rollback after failed unit of work also failed");
                }
                Err(err)
            }
        }
    }
}

fn backend_for_url(url: &str) -> Result<DatabaseType, SqlAccessError> {
    let scheme = url
        .split_once(':')
        .map(|(scheme, _)| scheme.to_ascii_lowercase())
        .ok_or_else(|| SqlAccessError::ConfigError(format!("missing scheme in url: {url}")))?;
    match scheme.as_str() {
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(DatabaseType::Sqlite),
        #[cfg(feature = "postgres")]
        "postgres" | "postgresql" => Ok(DatabaseType::Postgres),
        #[allow(unreachable_patterns)]
        "sqlite" | "postgres" | "postgresql" => Err(SqlAccessError::ConfigError(format!(
            "backend for '{scheme}' is not enabled in this build"
        ))),
        _ => Err(SqlAccessError::ConfigError(format!(
            "unsupported database url scheme: {scheme}"
        ))),
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_schemes_select_backends() {
        #[cfg(feature = "sqlite")]
        assert_eq!(backend_for_url("sqlite:app.db").unwrap(), DatabaseType::Sqlite);
        #[cfg(feature = "postgres")]
        assert_eq!(
            backend_for_url("postgresql://localhost/db").unwrap(),
            DatabaseType::Postgres
        );
        assert!(matches!(
            backend_for_url("mysql://localhost/db"),
            Err(SqlAccessError::ConfigError(_))
        ));
        assert!(matches!(backend_for_url("app.db"), Err(SqlAccessError::ConfigError(_))));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn private_memory_database_is_rejected() {
        for url in ["sqlite::memory:", "sqlite://:memory:", "sqlite:"] {
            assert!(
                matches!(Database::connect(url), Err(SqlAccessError::ConfigError(_))),
                "{url}"
            );
        }
        assert!(Database::connect("sqlite:file:mem1?mode=memory&cache=shared").is_ok());
    }
}
