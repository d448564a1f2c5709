//! Query and mutation paths shared by standalone calls and transactions.
//!
//! Everything here runs on one borrowed connection; the caller decides where
//! that connection comes from and when it is released.

mod dispatch;

use crate::connection::DbConnection;
use crate::error::SqlAccessError;
use crate::results::{Row, RowSet};
use crate::statement::Statement;
use crate::types::GeneratedKeys;

pub(crate) fn find_one<T, F>(
    conn: &mut DbConnection,
    stmt: &Statement,
    extractor: F,
) -> Result<Option<T>, SqlAccessError>
where
    F: Fn(&Row<'_>) -> Result<T, SqlAccessError>,
{
    // only the first row is read; the rest are dropped with the cursor
    conn.query(stmt, |rows| match rows.next_row()? {
        Some(row) => extractor(&row).map(Some),
        None => Ok(None),
    })
}

pub(crate) fn find_all<T, F>(
    conn: &mut DbConnection,
    stmt: &Statement,
    extractor: F,
) -> Result<Vec<T>, SqlAccessError>
where
    F: Fn(&Row<'_>) -> Result<T, SqlAccessError>,
{
    conn.query(stmt, |rows| {
        let mut out = Vec::new();
        while let Some(row) = rows.next_row()? {
            out.push(extractor(&row)?);
        }
        Ok(out)
    })
}

pub(crate) fn find_with<T, F>(
    conn: &mut DbConnection,
    stmt: &Statement,
    consume: F,
) -> Result<T, SqlAccessError>
where
    F: FnOnce(&mut RowSet<'_>) -> Result<T, SqlAccessError>,
{
    conn.query(stmt, consume)
}

pub(crate) fn update(conn: &mut DbConnection, stmt: &Statement) -> Result<usize, SqlAccessError> {
    conn.execute(stmt)
}

pub(crate) fn insert(
    conn: &mut DbConnection,
    stmt: &Statement,
    key_columns: &[&str],
) -> Result<GeneratedKeys, SqlAccessError> {
    conn.insert(stmt, key_columns)
}

pub(crate) fn execute_batch(conn: &mut DbConnection, sql: &str) -> Result<(), SqlAccessError> {
    conn.execute_batch(sql)
}
