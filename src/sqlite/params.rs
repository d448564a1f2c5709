use rusqlite::types::Value;

use crate::error::SqlAccessError;
use crate::types::SqlValue;

/// Convert a single `SqlValue` to a rusqlite `Value`.
///
/// `SQLite` has no boolean, temporal, decimal or JSON storage classes: booleans
/// become 0/1, the rest are stored as text in the forms the row accessors parse
/// back.
///
/// # Errors
///
/// Returns `SqlAccessError::BindingError` for arrays, which `SQLite` cannot bind.
pub fn sql_value_to_sqlite_value(value: &SqlValue) -> Result<Value, SqlAccessError> {
    Ok(match value {
        SqlValue::Null => Value::Null,
        SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
        SqlValue::Int(i) => Value::Integer(*i),
        SqlValue::Float(f) => Value::Real(*f),
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Blob(bytes) => Value::Blob(bytes.clone()),
        SqlValue::Decimal(d) => Value::Text(d.to_string()),
        SqlValue::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        SqlValue::Date(d) => Value::Text(d.format("%F").to_string()),
        SqlValue::Time(t) => Value::Text(t.format("%T%.f").to_string()),
        SqlValue::Json(json) => Value::Text(json.to_string()),
        SqlValue::Array(_) => {
            return Err(SqlAccessError::BindingError(
                "SQLite cannot bind array values; encode them as JSON".into(),
            ));
        }
    })
}

/// `SQLite` parameter container.
pub struct Params(pub Vec<Value>);

impl Params {
    /// Convert bound values into `SQLite` values.
    ///
    /// # Errors
    ///
    /// Returns `SqlAccessError::BindingError` if a value has no `SQLite` form.
    pub fn convert(params: &[SqlValue]) -> Result<Self, SqlAccessError> {
        params
            .iter()
            .map(sql_value_to_sqlite_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Params)
    }

    #[must_use]
    pub fn as_refs(&self) -> Vec<&dyn rusqlite::ToSql> {
        self.0.iter().map(|v| v as &dyn rusqlite::ToSql).collect()
    }
}
