//! Typed reads from [`SqlValue`].
//!
//! Backends hand rows over as `SqlValue`s; the row accessors turn them into Rust
//! types through [`FromSqlValue`]. NULL never reaches these conversions: the
//! row decides between `MissingValue` and `None` before converting.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value as JsonValue;

use crate::error::SqlAccessError;
use crate::types::SqlValue;

/// Conversion from a non-NULL column value.
pub trait FromSqlValue: Sized {
    /// Name of the target type, used in conversion errors.
    const EXPECTED: &'static str;

    /// Convert a non-NULL value read from `column`.
    ///
    /// # Errors
    ///
    /// Returns `SqlAccessError::ConversionError` if the value has the wrong shape.
    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, SqlAccessError>;
}

fn mismatch<T: FromSqlValue>(column: &str, value: &SqlValue) -> SqlAccessError {
    SqlAccessError::ConversionError {
        column: column.to_string(),
        expected: T::EXPECTED,
        found: value.type_name().to_string(),
    }
}

fn out_of_range<T: FromSqlValue>(column: &str, value: &SqlValue) -> SqlAccessError {
    SqlAccessError::ConversionError {
        column: column.to_string(),
        expected: T::EXPECTED,
        found: format!("out-of-range value {value}"),
    }
}

impl FromSqlValue for SqlValue {
    const EXPECTED: &'static str = "value";

    fn from_sql_value(_column: &str, value: &SqlValue) -> Result<Self, SqlAccessError> {
        Ok(value.clone())
    }
}

impl FromSqlValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, SqlAccessError> {
        match value {
            SqlValue::Bool(b) => Ok(*b),
            SqlValue::Int(i) => Ok(*i != 0),
            SqlValue::Decimal(d) => Ok(!d.is_zero()),
            SqlValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" | "yes" | "y" => Ok(true),
                "false" | "f" | "0" | "no" | "n" => Ok(false),
                _ => Err(mismatch::<Self>(column, value)),
            },
            _ => Err(mismatch::<Self>(column, value)),
        }
    }
}

fn integral(column: &str, value: &SqlValue) -> Result<i64, SqlAccessError> {
    match value {
        SqlValue::Int(i) => Ok(*i),
        SqlValue::Bool(b) => Ok(i64::from(*b)),
        SqlValue::Decimal(d) if d.fract().is_zero() => {
            d.to_i64().ok_or_else(|| out_of_range::<i64>(column, value))
        }
        #[allow(clippy::cast_possible_truncation)]
        SqlValue::Float(f) if f.is_finite() && f.fract() == 0.0 => {
            if *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                Ok(*f as i64)
            } else {
                Err(out_of_range::<i64>(column, value))
            }
        }
        SqlValue::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| mismatch::<i64>(column, value)),
        _ => Err(mismatch::<i64>(column, value)),
    }
}

macro_rules! impl_integer {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FromSqlValue for $ty {
                const EXPECTED: &'static str = $name;

                fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, SqlAccessError> {
                    let wide = integral(column, value).map_err(|err| match err {
                        SqlAccessError::ConversionError { found, column, .. } => {
                            SqlAccessError::ConversionError { column, expected: $name, found }
                        }
                        other => other,
                    })?;
                    <$ty>::try_from(wide).map_err(|_| out_of_range::<Self>(column, value))
                }
            }
        )*
    };
}

impl_integer! {
    i8 => "byte",
    i16 => "short",
    i32 => "int",
    i64 => "long",
}

impl FromSqlValue for f64 {
    const EXPECTED: &'static str = "double";

    #[allow(clippy::cast_precision_loss)]
    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, SqlAccessError> {
        match value {
            SqlValue::Float(f) => Ok(*f),
            SqlValue::Int(i) => Ok(*i as f64),
            SqlValue::Decimal(d) => d.to_f64().ok_or_else(|| out_of_range::<Self>(column, value)),
            SqlValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| mismatch::<Self>(column, value)),
            _ => Err(mismatch::<Self>(column, value)),
        }
    }
}

impl FromSqlValue for f32 {
    const EXPECTED: &'static str = "float";

    #[allow(clippy::cast_possible_truncation)]
    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, SqlAccessError> {
        let wide = f64::from_sql_value(column, value).map_err(|_| mismatch::<Self>(column, value))?;
        Ok(wide as f32)
    }
}

impl FromSqlValue for Decimal {
    const EXPECTED: &'static str = "decimal";

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, SqlAccessError> {
        match value {
            SqlValue::Decimal(d) => Ok(*d),
            SqlValue::Int(i) => Ok(Decimal::from(*i)),
            SqlValue::Float(f) => {
                Decimal::try_from(*f).map_err(|_| out_of_range::<Self>(column, value))
            }
            SqlValue::Text(s) => Decimal::from_str(s.trim())
                .or_else(|_| Decimal::from_scientific(s.trim()))
                .map_err(|_| mismatch::<Self>(column, value)),
            _ => Err(mismatch::<Self>(column, value)),
        }
    }
}

impl FromSqlValue for String {
    const EXPECTED: &'static str = "string";

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, SqlAccessError> {
        match value {
            SqlValue::Text(s) => Ok(s.clone()),
            SqlValue::Blob(bytes) => {
                String::from_utf8(bytes.clone()).map_err(|_| mismatch::<Self>(column, value))
            }
            SqlValue::Array(_) | SqlValue::Null => Err(mismatch::<Self>(column, value)),
            other => Ok(other.to_string()),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    const EXPECTED: &'static str = "bytes";

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, SqlAccessError> {
        match value {
            SqlValue::Blob(bytes) => Ok(bytes.clone()),
            SqlValue::Text(s) => Ok(s.as_bytes().to_vec()),
            _ => Err(mismatch::<Self>(column, value)),
        }
    }
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

impl FromSqlValue for NaiveDateTime {
    const EXPECTED: &'static str = "timestamp";

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, SqlAccessError> {
        match value {
            SqlValue::Timestamp(ts) => Ok(*ts),
            SqlValue::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
            SqlValue::Text(s) => {
                parse_timestamp(s).ok_or_else(|| mismatch::<Self>(column, value))
            }
            _ => Err(mismatch::<Self>(column, value)),
        }
    }
}

impl FromSqlValue for NaiveDate {
    const EXPECTED: &'static str = "date";

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, SqlAccessError> {
        match value {
            SqlValue::Date(d) => Ok(*d),
            SqlValue::Timestamp(ts) => Ok(ts.date()),
            SqlValue::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .or_else(|| parse_timestamp(s).map(|ts| ts.date()))
                .ok_or_else(|| mismatch::<Self>(column, value)),
            _ => Err(mismatch::<Self>(column, value)),
        }
    }
}

impl FromSqlValue for NaiveTime {
    const EXPECTED: &'static str = "time";

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, SqlAccessError> {
        match value {
            SqlValue::Time(t) => Ok(*t),
            SqlValue::Timestamp(ts) => Ok(ts.time()),
            SqlValue::Text(s) => NaiveTime::parse_from_str(s.trim(), "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M"))
                .map_err(|_| mismatch::<Self>(column, value)),
            _ => Err(mismatch::<Self>(column, value)),
        }
    }
}

impl FromSqlValue for JsonValue {
    const EXPECTED: &'static str = "json";

    fn from_sql_value(column: &str, value: &SqlValue) -> Result<Self, SqlAccessError> {
        match value {
            SqlValue::Json(json) => Ok(json.clone()),
            SqlValue::Text(s) => {
                serde_json::from_str(s).map_err(|_| mismatch::<Self>(column, value))
            }
            _ => Err(mismatch::<Self>(column, value)),
        }
    }
}

/// Map a JSON document onto the value model (used for JSON-encoded arrays).
#[must_use]
pub fn json_to_sql_value(json: &JsonValue) -> SqlValue {
    match json {
        JsonValue::Null => SqlValue::Null,
        JsonValue::Bool(b) => SqlValue::Bool(*b),
        JsonValue::Number(n) => n
            .as_i64()
            .map(SqlValue::Int)
            .or_else(|| n.as_f64().map(SqlValue::Float))
            .unwrap_or_else(|| SqlValue::Text(n.to_string())),
        JsonValue::String(s) => SqlValue::Text(s.clone()),
        JsonValue::Array(items) => SqlValue::Array(items.iter().map(json_to_sql_value).collect()),
        JsonValue::Object(_) => SqlValue::Json(json.clone()),
    }
}

/// Elements of an array column, as values.
///
/// Native arrays come from Postgres; `SQLite` has no array type, so JSON arrays
/// (stored as text or JSON) are accepted too.
pub(crate) fn array_elements(column: &str, value: &SqlValue) -> Result<Vec<SqlValue>, SqlAccessError> {
    let not_array = || SqlAccessError::ConversionError {
        column: column.to_string(),
        expected: "array",
        found: value.type_name().to_string(),
    };
    match value {
        SqlValue::Array(items) => Ok(items.clone()),
        SqlValue::Json(JsonValue::Array(items)) => Ok(items.iter().map(json_to_sql_value).collect()),
        SqlValue::Text(s) => match serde_json::from_str::<JsonValue>(s) {
            Ok(JsonValue::Array(items)) => Ok(items.iter().map(json_to_sql_value).collect()),
            _ => Err(not_array()),
        },
        _ => Err(not_array()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_check_range() {
        assert_eq!(i32::from_sql_value("n", &SqlValue::Int(42)).unwrap(), 42);
        let err = i8::from_sql_value("n", &SqlValue::Int(300)).unwrap_err();
        assert!(matches!(err, SqlAccessError::ConversionError { expected: "byte", .. }));
    }

    #[test]
    fn float_outside_i64_is_rejected_not_saturated() {
        let two_pow_63 = 9_223_372_036_854_775_808.0_f64;
        assert!(matches!(
            i64::from_sql_value("n", &SqlValue::Float(two_pow_63)),
            Err(SqlAccessError::ConversionError { .. })
        ));
        assert_eq!(
            i64::from_sql_value("n", &SqlValue::Float(-two_pow_63)).unwrap(),
            i64::MIN
        );
        assert_eq!(i64::from_sql_value("n", &SqlValue::Float(12.0)).unwrap(), 12);
    }

    #[test]
    fn zero_is_a_value_not_a_null() {
        assert_eq!(i64::from_sql_value("n", &SqlValue::Int(0)).unwrap(), 0);
        assert!(!bool::from_sql_value("b", &SqlValue::Int(0)).unwrap());
    }

    #[test]
    fn text_is_not_silently_an_int() {
        let err = i32::from_sql_value("name", &SqlValue::Text("Kasia".into())).unwrap_err();
        assert!(matches!(
            err,
            SqlAccessError::ConversionError { ref column, expected: "int", .. } if column == "name"
        ));
    }

    #[test]
    fn timestamps_parse_from_sqlite_text() {
        let ts = NaiveDateTime::from_sql_value(
            "created",
            &SqlValue::Text("2024-03-01 12:30:15.250".into()),
        )
        .unwrap();
        assert_eq!(ts.format("%F %T%.3f").to_string(), "2024-03-01 12:30:15.250");

        let date =
            NaiveDate::from_sql_value("d", &SqlValue::Text("2024-03-01".into())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn decimals_keep_exact_text() {
        let d = Decimal::from_sql_value("price", &SqlValue::Text("12.50".into())).unwrap();
        assert_eq!(d.to_string(), "12.50");
    }

    #[test]
    fn json_arrays_become_elements() {
        let items = array_elements("tags", &SqlValue::Text("[1, \"a\", null]".into())).unwrap();
        assert_eq!(
            items,
            vec![SqlValue::Int(1), SqlValue::Text("a".into()), SqlValue::Null]
        );
        assert!(array_elements("tags", &SqlValue::Text("not json".into())).is_err());
    }
}
