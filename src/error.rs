use thiserror::Error;

#[cfg(feature = "postgres")]
use postgres;
#[cfg(feature = "sqlite")]
use rusqlite;

/// Every failure this crate reports.
///
/// Driver failures are carried unmodified in the backend variants; the other
/// variants are raised by the binding and row layers themselves.
#[derive(Debug, Error)]
pub enum SqlAccessError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] postgres::Error),

    #[error("Binding error: {0}")]
    BindingError(String),

    #[error("Unexpected null for column '{column}'")]
    MissingValue { column: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Cannot read column '{column}' as {expected}: found {found}")]
    ConversionError {
        column: String,
        expected: &'static str,
        found: String,
    },

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SqlAccessError {
    /// True for failures reported by the database driver itself.
    #[must_use]
    pub fn is_driver_error(&self) -> bool {
        match self {
            #[cfg(feature = "sqlite")]
            SqlAccessError::SqliteError(_) => true,
            #[cfg(feature = "postgres")]
            SqlAccessError::PostgresError(_) => true,
            _ => false,
        }
    }

    pub(crate) fn missing(column: &str) -> Self {
        SqlAccessError::MissingValue {
            column: column.to_string(),
        }
    }
}
