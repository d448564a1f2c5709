use std::error::Error;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use postgres::Client;
use postgres::types::{FromSql, Kind, Type};

use super::params::as_refs;
use crate::binding::BoundStatement;
use crate::error::SqlAccessError;
use crate::results::{Columns, Cursor, RowSet};
use crate::types::{GeneratedKeys, SqlValue};

fn scalar<'a, T, F>(row: &'a postgres::Row, idx: usize, wrap: F) -> Result<SqlValue, SqlAccessError>
where
    T: FromSql<'a>,
    F: FnOnce(T) -> SqlValue,
{
    let val: Option<T> = row.try_get(idx)?;
    Ok(val.map_or(SqlValue::Null, wrap))
}

fn array<'a, T, F>(row: &'a postgres::Row, idx: usize, wrap: F) -> Result<SqlValue, SqlAccessError>
where
    T: FromSql<'a>,
    F: Fn(T) -> SqlValue,
{
    let val: Option<Vec<Option<T>>> = row.try_get(idx)?;
    Ok(val.map_or(SqlValue::Null, |items| {
        SqlValue::Array(
            items
                .into_iter()
                .map(|item| item.map_or(SqlValue::Null, &wrap))
                .collect(),
        )
    }))
}

/// A column type with no dedicated mapping.
///
/// Text-like types (including enums and extension types such as `citext`)
/// decode as text, uuids as their hyphenated form, and everything else as the
/// raw binary wire value. Never fails the row.
struct Unmapped(SqlValue);

impl<'a> FromSql<'a> for Unmapped {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        if *ty == Type::UUID && raw.len() == 16 {
            return Ok(Unmapped(SqlValue::Text(format_uuid(raw))));
        }
        if <&str as FromSql>::accepts(ty) {
            let text = <&str as FromSql>::from_sql(ty, raw)?;
            return Ok(Unmapped(SqlValue::Text(text.to_string())));
        }
        if matches!(ty.kind(), Kind::Enum(_)) {
            return Ok(Unmapped(SqlValue::Text(std::str::from_utf8(raw)?.to_string())));
        }
        Ok(Unmapped(SqlValue::Blob(raw.to_vec())))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn format_uuid(raw: &[u8]) -> String {
    let mut out = String::with_capacity(36);
    for (idx, byte) in raw.iter().enumerate() {
        if matches!(idx, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Extracts a `SqlValue` from a Postgres row at the given index.
///
/// # Errors
/// Returns `SqlAccessError` if the column cannot be retrieved.
pub fn postgres_extract_value(row: &postgres::Row, idx: usize) -> Result<SqlValue, SqlAccessError> {
    match *row.columns()[idx].type_() {
        Type::BOOL => scalar(row, idx, SqlValue::Bool),
        Type::INT2 => scalar(row, idx, |v: i16| SqlValue::Int(i64::from(v))),
        Type::INT4 => scalar(row, idx, |v: i32| SqlValue::Int(i64::from(v))),
        Type::INT8 => scalar(row, idx, SqlValue::Int),
        Type::OID => scalar(row, idx, |v: u32| SqlValue::Int(i64::from(v))),
        Type::FLOAT4 => scalar(row, idx, |v: f32| SqlValue::Float(f64::from(v))),
        Type::FLOAT8 => scalar(row, idx, SqlValue::Float),
        Type::NUMERIC => scalar(row, idx, SqlValue::Decimal),
        Type::BYTEA => scalar(row, idx, SqlValue::Blob),
        Type::TIMESTAMP => scalar(row, idx, SqlValue::Timestamp),
        Type::TIMESTAMPTZ => scalar(row, idx, |v: DateTime<Utc>| SqlValue::Timestamp(v.naive_utc())),
        Type::DATE => scalar(row, idx, SqlValue::Date),
        Type::TIME => scalar(row, idx, SqlValue::Time),
        Type::JSON | Type::JSONB => scalar(row, idx, SqlValue::Json),
        Type::BOOL_ARRAY => array(row, idx, SqlValue::Bool),
        Type::INT2_ARRAY => array(row, idx, |v: i16| SqlValue::Int(i64::from(v))),
        Type::INT4_ARRAY => array(row, idx, |v: i32| SqlValue::Int(i64::from(v))),
        Type::INT8_ARRAY => array(row, idx, SqlValue::Int),
        Type::FLOAT4_ARRAY => array(row, idx, |v: f32| SqlValue::Float(f64::from(v))),
        Type::FLOAT8_ARRAY => array(row, idx, SqlValue::Float),
        Type::NUMERIC_ARRAY => array(row, idx, SqlValue::Decimal),
        Type::TIMESTAMP_ARRAY => array(row, idx, SqlValue::Timestamp),
        Type::TIMESTAMPTZ_ARRAY => {
            array(row, idx, |v: DateTime<Utc>| SqlValue::Timestamp(v.naive_utc()))
        }
        Type::DATE_ARRAY => array(row, idx, SqlValue::Date),
        Type::TIME_ARRAY => array(row, idx, SqlValue::Time),
        Type::JSONB_ARRAY | Type::JSON_ARRAY => array(row, idx, SqlValue::Json),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY | Type::BPCHAR_ARRAY | Type::NAME_ARRAY => {
            array(row, idx, SqlValue::Text)
        }
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => scalar(row, idx, SqlValue::Text),
        ref ty if matches!(ty.kind(), Kind::Array(_)) => array(row, idx, |v: Unmapped| v.0),
        _ => scalar(row, idx, |v: Unmapped| v.0),
    }
}

pub(crate) fn read_row(
    row: &postgres::Row,
    width: usize,
    out: &mut Vec<SqlValue>,
) -> Result<(), SqlAccessError> {
    for idx in 0..width {
        out.push(postgres_extract_value(row, idx)?);
    }
    Ok(())
}

/// Run a row-producing statement and hand its rows to `consume`.
pub(crate) fn query<R, F>(
    client: &mut Client,
    bound: &BoundStatement<'_>,
    consume: F,
) -> Result<R, SqlAccessError>
where
    F: FnOnce(&mut RowSet<'_>) -> Result<R, SqlAccessError>,
{
    let stmt = client.prepare(&bound.sql)?;
    let columns = Columns::new(
        stmt.columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect(),
    );
    let rows = client.query(&stmt, &as_refs(&bound.values))?;
    let mut row_set = RowSet::new(columns, Cursor::Postgres(rows.iter()));
    consume(&mut row_set)
}

pub(crate) fn execute(client: &mut Client, bound: &BoundStatement<'_>) -> Result<usize, SqlAccessError> {
    let affected = client.execute(&*bound.sql, &as_refs(&bound.values))?;
    usize::try_from(affected).map_err(|e| {
        SqlAccessError::ExecutionError(format!("postgres affected rows conversion error: {e}"))
    })
}

pub(crate) fn insert(client: &mut Client, bound: &BoundStatement<'_>) -> Result<GeneratedKeys, SqlAccessError> {
    query(client, bound, |rows| {
        let mut keys = GeneratedKeys::new();
        if let Some(row) = rows.next_row()? {
            for (idx, name) in row.column_names().iter().enumerate() {
                if let Some(value) = row.value_at(idx) {
                    keys.insert(name.clone(), value.clone());
                }
            }
        }
        Ok(keys)
    })
}

pub(crate) fn execute_batch(client: &mut Client, sql: &str) -> Result<(), SqlAccessError> {
    client.batch_execute(sql)?;
    Ok(())
}
