//! Convenient imports for common functionality.

pub use crate::{
    ConnectionSource, Database, DbConnection, FromSqlValue, GeneratedKeys, IsolationLevel, Row,
    RowSet, SqlAccessError, SqlExt, SqlValue, Statement, Transaction, extractor, named, positional,
};

#[cfg(feature = "postgres")]
pub use crate::{PostgresOptions, PostgresSource};
#[cfg(feature = "sqlite")]
pub use crate::{SqliteOptions, SqliteSource};
