use std::io::Cursor;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use super::Columns;
use crate::conversion::{FromSqlValue, array_elements};
use crate::error::SqlAccessError;
use crate::types::SqlValue;

/// The current row of a result, borrowed for the duration of one extractor call.
///
/// Every typed accessor comes in two forms. The strict one fails with
/// [`SqlAccessError::MissingValue`] when the column is SQL NULL; the `_or_null`
/// one returns `Ok(None)` instead. Neither ever substitutes a zero or empty
/// default.
#[derive(Debug)]
pub struct Row<'a> {
    columns: &'a Columns,
    values: &'a [SqlValue],
}

macro_rules! typed_accessors {
    ($($ty:ty => $strict:ident, $nullable:ident;)*) => {
        $(
            #[doc = concat!("Read `column` as `", stringify!($ty), "`, failing on NULL.")]
            ///
            /// # Errors
            ///
            /// `MissingValue` on NULL, `ColumnNotFound` or `ConversionError` otherwise.
            pub fn $strict(&self, column: &str) -> Result<$ty, SqlAccessError> {
                self.get::<$ty>(column)
            }

            #[doc = concat!("Read `column` as `", stringify!($ty), "`, `None` on NULL.")]
            ///
            /// # Errors
            ///
            /// `ColumnNotFound` or `ConversionError`.
            pub fn $nullable(&self, column: &str) -> Result<Option<$ty>, SqlAccessError> {
                self.get_opt::<$ty>(column)
            }
        )*
    };
}

impl<'a> Row<'a> {
    pub(crate) fn new(columns: &'a Columns, values: &'a [SqlValue]) -> Self {
        Self { columns, values }
    }

    /// Column names of the result, in select order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.columns.names()
    }

    /// Raw value of a column by name.
    ///
    /// # Errors
    ///
    /// Returns `ColumnNotFound` if the result has no such column.
    pub fn value(&self, column: &str) -> Result<&SqlValue, SqlAccessError> {
        self.columns
            .index_of(column)
            .and_then(|idx| self.values.get(idx))
            .ok_or_else(|| SqlAccessError::ColumnNotFound(column.to_string()))
    }

    /// Raw value of a column by zero-based position.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// True if the column holds SQL NULL.
    ///
    /// # Errors
    ///
    /// Returns `ColumnNotFound` if the result has no such column.
    pub fn is_null(&self, column: &str) -> Result<bool, SqlAccessError> {
        Ok(self.value(column)?.is_null())
    }

    /// Strict typed read.
    ///
    /// # Errors
    ///
    /// `MissingValue` on NULL, `ColumnNotFound` or `ConversionError` otherwise.
    pub fn get<T: FromSqlValue>(&self, column: &str) -> Result<T, SqlAccessError> {
        match self.value(column)? {
            SqlValue::Null => Err(SqlAccessError::missing(column)),
            value => T::from_sql_value(column, value),
        }
    }

    /// Nullable typed read.
    ///
    /// # Errors
    ///
    /// `ColumnNotFound` or `ConversionError`.
    pub fn get_opt<T: FromSqlValue>(&self, column: &str) -> Result<Option<T>, SqlAccessError> {
        match self.value(column)? {
            SqlValue::Null => Ok(None),
            value => T::from_sql_value(column, value).map(Some),
        }
    }

    typed_accessors! {
        SqlValue => object, object_or_null;
        bool => boolean, boolean_or_null;
        i8 => byte, byte_or_null;
        i16 => short, short_or_null;
        i32 => int, int_or_null;
        i64 => long, long_or_null;
        f32 => float, float_or_null;
        f64 => double, double_or_null;
        Decimal => decimal, decimal_or_null;
        String => string, string_or_null;
        Vec<u8> => bytes, bytes_or_null;
        NaiveDateTime => timestamp, timestamp_or_null;
        NaiveTime => time, time_or_null;
        NaiveDate => date, date_or_null;
        JsonValue => json, json_or_null;
    }

    /// Character data as a reader.
    ///
    /// # Errors
    ///
    /// Same as [`Row::string`].
    pub fn character_stream(&self, column: &str) -> Result<Cursor<String>, SqlAccessError> {
        self.string(column).map(Cursor::new)
    }

    /// # Errors
    ///
    /// Same as [`Row::string_or_null`].
    pub fn character_stream_or_null(
        &self,
        column: &str,
    ) -> Result<Option<Cursor<String>>, SqlAccessError> {
        Ok(self.string_or_null(column)?.map(Cursor::new))
    }

    /// Binary data as a reader.
    ///
    /// # Errors
    ///
    /// Same as [`Row::bytes`].
    pub fn binary_stream(&self, column: &str) -> Result<Cursor<Vec<u8>>, SqlAccessError> {
        self.bytes(column).map(Cursor::new)
    }

    /// # Errors
    ///
    /// Same as [`Row::bytes_or_null`].
    pub fn binary_stream_or_null(
        &self,
        column: &str,
    ) -> Result<Option<Cursor<Vec<u8>>>, SqlAccessError> {
        Ok(self.bytes_or_null(column)?.map(Cursor::new))
    }

    /// Array column, element by element.
    ///
    /// NULL is treated like every other accessor: it fails here and is `None`
    /// from [`Row::array_or_null`]. A NULL element fails with `MissingValue`
    /// naming the element (`tags[2]`).
    ///
    /// # Errors
    ///
    /// `MissingValue`, `ColumnNotFound` or `ConversionError`.
    pub fn array<T: FromSqlValue>(&self, column: &str) -> Result<Vec<T>, SqlAccessError> {
        self.array_or_null(column)?
            .ok_or_else(|| SqlAccessError::missing(column))
    }

    /// # Errors
    ///
    /// `MissingValue` for a NULL element, `ColumnNotFound` or `ConversionError`.
    pub fn array_or_null<T: FromSqlValue>(
        &self,
        column: &str,
    ) -> Result<Option<Vec<T>>, SqlAccessError> {
        let value = self.value(column)?;
        if value.is_null() {
            return Ok(None);
        }
        array_elements(column, value)?
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                let label = format!("{column}[{idx}]");
                match item {
                    SqlValue::Null => Err(SqlAccessError::missing(&label)),
                    item => T::from_sql_value(&label, item),
                }
            })
            .collect::<Result<Vec<T>, _>>()
            .map(Some)
    }
}

/// Pin a closure to the extractor shape so it can be named, stored and reused
/// across queries.
///
/// ```rust
/// use sql_access::{Row, SqlAccessError, extractor};
///
/// let name = extractor(|row: &Row<'_>| row.string("name"));
/// # let _ = name;
/// ```
pub fn extractor<T, F>(f: F) -> F
where
    F: Fn(&Row<'_>) -> Result<T, SqlAccessError>,
{
    f
}
