use rusqlite::types::ValueRef;

use super::params::Params;
use crate::binding::BoundStatement;
use crate::error::SqlAccessError;
use crate::results::{Columns, Cursor, RowSet};
use crate::types::{GeneratedKeys, SqlValue};

/// Reclassify driver errors that belong to the binding layer.
pub(crate) fn classify(err: rusqlite::Error) -> SqlAccessError {
    match err {
        rusqlite::Error::InvalidParameterCount(given, expected) => SqlAccessError::BindingError(
            format!("statement expects {expected} parameters but {given} were supplied"),
        ),
        other => SqlAccessError::SqliteError(other),
    }
}

/// Extract a `SqlValue` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlAccessError` if the column cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<SqlValue, SqlAccessError> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Int(i),
        ValueRef::Real(f) => SqlValue::Float(f),
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => SqlValue::Text(text.to_owned()),
            Err(_) => SqlValue::Blob(bytes.to_vec()),
        },
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    })
}

pub(crate) fn read_row(
    row: &rusqlite::Row<'_>,
    width: usize,
    out: &mut Vec<SqlValue>,
) -> Result<(), SqlAccessError> {
    for idx in 0..width {
        out.push(sqlite_extract_value(row, idx)?);
    }
    Ok(())
}

/// Run a row-producing statement and hand its cursor to `consume`.
///
/// The prepared statement and its cursor are dropped before this returns, on
/// every path.
pub(crate) fn query<R, F>(
    conn: &rusqlite::Connection,
    bound: &BoundStatement<'_>,
    consume: F,
) -> Result<R, SqlAccessError>
where
    F: FnOnce(&mut RowSet<'_>) -> Result<R, SqlAccessError>,
{
    let params = Params::convert(&bound.values)?;
    let mut stmt = conn.prepare(&bound.sql)?;
    let columns = Columns::new(
        stmt.column_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    );
    let rows = stmt.query(&params.as_refs()[..]).map_err(classify)?;
    let mut row_set = RowSet::new(columns, Cursor::Sqlite(rows));
    consume(&mut row_set)
}

pub(crate) fn execute(
    conn: &rusqlite::Connection,
    bound: &BoundStatement<'_>,
) -> Result<usize, SqlAccessError> {
    let params = Params::convert(&bound.values)?;
    let mut stmt = conn.prepare(&bound.sql)?;
    stmt.execute(&params.as_refs()[..]).map_err(classify)
}

/// Run an insert whose SQL carries a RETURNING clause and collect the first
/// produced row as keys.
pub(crate) fn insert(
    conn: &rusqlite::Connection,
    bound: &BoundStatement<'_>,
) -> Result<GeneratedKeys, SqlAccessError> {
    query(conn, bound, |rows| {
        let mut keys = GeneratedKeys::new();
        if let Some(row) = rows.next_row()? {
            for (idx, name) in row.column_names().iter().enumerate() {
                if let Some(value) = row.value_at(idx) {
                    keys.insert(name.clone(), value.clone());
                }
            }
        }
        // step the remaining rows so every inserted row is written
        while rows.next_row()?.is_some() {}
        Ok(keys)
    })
}

pub(crate) fn execute_batch(conn: &rusqlite::Connection, sql: &str) -> Result<(), SqlAccessError> {
    conn.execute_batch(sql).map_err(classify)
}
