//! Blocking data access over `SQLite` and Postgres.
//!
//! Statements carry positional (`?`) or named (`:name`) parameters and are
//! bound by one binder for whichever backend runs them. Results are read
//! through extractors that see one borrowed [`Row`] at a time, inserts report
//! their generated keys, and [`Database::transaction`] runs a unit of work on
//! one connection, committing on success and rolling back on error.
//!
//! Backends are selected with the `sqlite` (default) and `postgres` features.

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("enable at least one backend feature: `sqlite` or `postgres`");

pub mod binding;
pub mod connection;
pub mod conversion;
pub mod database;
pub mod error;
mod executor;
pub mod prelude;
pub mod results;
pub mod source;
pub mod statement;
pub mod transaction;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use binding::{BoundStatement, PlaceholderStyle, bind};
pub use connection::DbConnection;
pub use conversion::FromSqlValue;
pub use database::Database;
pub use error::SqlAccessError;
pub use results::{Columns, Row, RowSet, extractor};
pub use source::ConnectionSource;
pub use statement::{Params, SqlExt, Statement};
pub use transaction::Transaction;
pub use types::{DatabaseType, GeneratedKeys, IsolationLevel, SqlValue};

#[cfg(feature = "postgres")]
pub use postgres::{PostgresOptions, PostgresOptionsBuilder, PostgresSource};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteOptions, SqliteOptionsBuilder, SqliteSource};
