use std::fmt;
use std::ops::DerefMut;

use crate::binding::PlaceholderStyle;
use crate::types::DatabaseType;

/// A live connection to one of the enabled backends.
///
/// The handle may be a plain driver connection or any owned guard that derefs
/// to one (a pool checkout, for example). Dropping the `DbConnection` releases
/// it.
pub enum DbConnection {
    #[cfg(feature = "sqlite")]
    Sqlite(Box<dyn DerefMut<Target = rusqlite::Connection> + Send>),
    #[cfg(feature = "postgres")]
    Postgres(Box<dyn DerefMut<Target = postgres::Client> + Send>),
}

impl DbConnection {
    #[cfg(feature = "sqlite")]
    #[must_use]
    pub fn sqlite(conn: rusqlite::Connection) -> Self {
        DbConnection::Sqlite(Box::new(Box::new(conn)))
    }

    /// Wrap a pooled or otherwise managed `SQLite` handle.
    #[cfg(feature = "sqlite")]
    #[must_use]
    pub fn sqlite_handle<H>(handle: H) -> Self
    where
        H: DerefMut<Target = rusqlite::Connection> + Send + 'static,
    {
        DbConnection::Sqlite(Box::new(handle))
    }

    #[cfg(feature = "postgres")]
    #[must_use]
    pub fn postgres(client: postgres::Client) -> Self {
        DbConnection::Postgres(Box::new(Box::new(client)))
    }

    /// Wrap a pooled or otherwise managed Postgres client.
    #[cfg(feature = "postgres")]
    #[must_use]
    pub fn postgres_handle<H>(handle: H) -> Self
    where
        H: DerefMut<Target = postgres::Client> + Send + 'static,
    {
        DbConnection::Postgres(Box::new(handle))
    }

    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(_) => DatabaseType::Sqlite,
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(_) => DatabaseType::Postgres,
        }
    }

    pub(crate) fn placeholder_style(&self) -> PlaceholderStyle {
        match self {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(_) => PlaceholderStyle::Sqlite,
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(_) => PlaceholderStyle::Postgres,
        }
    }
}

impl fmt::Debug for DbConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DbConnection")
            .field(&self.database_type())
            .finish()
    }
}
