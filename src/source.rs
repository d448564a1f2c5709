use crate::connection::DbConnection;
use crate::error::SqlAccessError;

/// Supplies connections to a [`Database`](crate::Database).
///
/// Every standalone call and every transaction acquires its own connection and
/// drops it when done. Any `Fn() -> Result<DbConnection, SqlAccessError>`
/// closure is a source, which is how an external pool plugs in:
///
/// ```rust
/// use sql_access::{Database, DbConnection, SqlAccessError};
///
/// let db = Database::new(|| -> Result<DbConnection, SqlAccessError> {
///     Ok(DbConnection::sqlite(rusqlite::Connection::open_in_memory()?))
/// });
/// # let _ = db;
/// ```
pub trait ConnectionSource: Send + Sync {
    /// Hand out a connection for exclusive use.
    ///
    /// # Errors
    ///
    /// Whatever the source reports when no connection can be produced.
    fn acquire(&self) -> Result<DbConnection, SqlAccessError>;
}

impl<F> ConnectionSource for F
where
    F: Fn() -> Result<DbConnection, SqlAccessError> + Send + Sync,
{
    fn acquire(&self) -> Result<DbConnection, SqlAccessError> {
        self()
    }
}
