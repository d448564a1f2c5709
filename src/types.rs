use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// Values that can be bound as statement parameters or read back from a row.
///
/// One enum serves every backend so statements and extractors never branch on
/// driver types:
/// ```rust
/// use sql_access::SqlValue;
///
/// let params = vec![
///     SqlValue::from(1),
///     SqlValue::from("alice"),
///     SqlValue::from(None::<i64>),
/// ];
/// assert!(params[2].is_null());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Exact numeric value
    Decimal(Decimal),
    /// Text/string value
    Text(String),
    /// Binary data
    Blob(Vec<u8>),
    /// Timestamp without time zone
    Timestamp(NaiveDateTime),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day
    Time(NaiveTime),
    /// JSON document
    Json(JsonValue),
    /// SQL array
    Array(Vec<SqlValue>),
}

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let SqlValue::Int(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let SqlValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let SqlValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let SqlValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Short name of the variant, used in conversion errors.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::Int(_) => "int",
            SqlValue::Float(_) => "float",
            SqlValue::Decimal(_) => "decimal",
            SqlValue::Text(_) => "text",
            SqlValue::Blob(_) => "blob",
            SqlValue::Timestamp(_) => "timestamp",
            SqlValue::Date(_) => "date",
            SqlValue::Time(_) => "time",
            SqlValue::Json(_) => "json",
            SqlValue::Array(_) => "array",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(b) => write!(f, "{b}"),
            SqlValue::Int(i) => write!(f, "{i}"),
            SqlValue::Float(x) => write!(f, "{x}"),
            SqlValue::Decimal(d) => write!(f, "{d}"),
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::Blob(bytes) => write!(f, "<{} bytes>", bytes.len()),
            SqlValue::Timestamp(ts) => write!(f, "{}", ts.format("%F %T%.f")),
            SqlValue::Date(d) => write!(f, "{}", d.format("%F")),
            SqlValue::Time(t) => write!(f, "{}", t.format("%T%.f")),
            SqlValue::Json(json) => write!(f, "{json}"),
            SqlValue::Array(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident($conv:expr)),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::$variant($conv(value))
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool(std::convert::identity),
    i8 => Int(i64::from),
    i16 => Int(i64::from),
    i32 => Int(i64::from),
    i64 => Int(std::convert::identity),
    u8 => Int(i64::from),
    u16 => Int(i64::from),
    u32 => Int(i64::from),
    f32 => Float(f64::from),
    f64 => Float(std::convert::identity),
    Decimal => Decimal(std::convert::identity),
    String => Text(std::convert::identity),
    &str => Text(str::to_string),
    Vec<u8> => Blob(std::convert::identity),
    &[u8] => Blob(<[u8]>::to_vec),
    NaiveDateTime => Timestamp(std::convert::identity),
    NaiveDate => Date(std::convert::identity),
    NaiveTime => Time(std::convert::identity),
    JsonValue => Json(std::convert::identity),
    Vec<SqlValue> => Array(std::convert::identity),
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(value.naive_utc())
    }
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        SqlValue::Text(value.clone())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// Values the driver reported for auto-populated columns after an insert,
/// keyed by column name.
pub type GeneratedKeys = BTreeMap<String, SqlValue>;

/// Isolation level requested when a transaction begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationLevel {
    /// Whatever the connection uses when no level is requested
    #[default]
    Default,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// SQL spelling of the level, `None` for the driver default.
    #[must_use]
    pub fn as_sql(self) -> Option<&'static str> {
        match self {
            IsolationLevel::Default => None,
            IsolationLevel::ReadUncommitted => Some("READ UNCOMMITTED"),
            IsolationLevel::ReadCommitted => Some("READ COMMITTED"),
            IsolationLevel::RepeatableRead => Some("REPEATABLE READ"),
            IsolationLevel::Serializable => Some("SERIALIZABLE"),
        }
    }
}

impl std::str::FromStr for IsolationLevel {
    type Err = crate::error::SqlAccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace([' ', '_'], "-");
        <IsolationLevel as ValueEnum>::from_str(&normalized, true).map_err(|_| {
            crate::error::SqlAccessError::ConfigError(format!("unknown isolation level: {s}"))
        })
    }
}

/// The database backends compiled into this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DatabaseType {
    /// `SQLite` database
    #[cfg(feature = "sqlite")]
    Sqlite,
    /// `PostgreSQL` database
    #[cfg(feature = "postgres")]
    Postgres,
}
