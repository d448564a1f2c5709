// Postgres backend (blocking client)
//
// - config: options and the connection source
// - params: ToSql for SqlValue
// - query: statement execution and row extraction
// - transaction: BEGIN/COMMIT/ROLLBACK with isolation levels

pub mod config;
pub mod params;
pub mod query;
pub(crate) mod transaction;

pub use config::{PostgresOptions, PostgresOptionsBuilder, PostgresSource};
pub use params::as_refs;
pub use query::postgres_extract_value;
pub(crate) use query::read_row;
