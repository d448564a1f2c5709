// SQLite backend
//
// - config: options and the connection source
// - params: SqlValue -> rusqlite values
// - query: statement execution and row extraction
// - transaction: BEGIN/COMMIT/ROLLBACK for the requested isolation level

pub mod config;
pub mod params;
pub mod query;
pub(crate) mod transaction;

pub use config::{SqliteOptions, SqliteOptionsBuilder, SqliteSource};
pub use params::{Params, sql_value_to_sqlite_value};
pub use query::sqlite_extract_value;
pub(crate) use query::read_row;
