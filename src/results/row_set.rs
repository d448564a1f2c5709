use super::{Columns, Row};
use crate::error::SqlAccessError;
use crate::types::SqlValue;

/// Driver cursor behind a [`RowSet`].
pub(crate) enum Cursor<'c> {
    #[cfg(feature = "sqlite")]
    Sqlite(rusqlite::Rows<'c>),
    #[cfg(feature = "postgres")]
    Postgres(std::slice::Iter<'c, postgres::Row>),
}

/// Caller-advanced cursor over a query result.
///
/// Each call to [`RowSet::next_row`] reads one row from the driver; the
/// returned [`Row`] borrows the set, so it is gone before the cursor moves.
///
/// ```rust,no_run
/// # fn demo(db: &sql_access::Database) -> Result<(), sql_access::SqlAccessError> {
/// let total = db.find_with("SELECT amount FROM payments", |rows| {
///     let mut total = 0_i64;
///     while let Some(row) = rows.next_row()? {
///         total += row.long("amount")?;
///     }
///     Ok(total)
/// })?;
/// # let _ = total;
/// # Ok(())
/// # }
/// ```
pub struct RowSet<'c> {
    columns: Columns,
    cursor: Cursor<'c>,
    current: Vec<SqlValue>,
    done: bool,
}

impl<'c> RowSet<'c> {
    pub(crate) fn new(columns: Columns, cursor: Cursor<'c>) -> Self {
        let width = columns.len();
        Self {
            columns,
            cursor,
            current: Vec::with_capacity(width),
            done: false,
        }
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.columns.names()
    }

    /// Advance to the next row. `Ok(None)` once the result is exhausted.
    ///
    /// # Errors
    ///
    /// Driver failures while stepping, or values the backend cannot represent.
    pub fn next_row(&mut self) -> Result<Option<Row<'_>>, SqlAccessError> {
        if self.done {
            return Ok(None);
        }
        self.current.clear();
        let width = self.columns.len();
        let advanced = match &mut self.cursor {
            #[cfg(feature = "sqlite")]
            Cursor::Sqlite(rows) => match rows.next()? {
                Some(row) => {
                    crate::sqlite::read_row(row, width, &mut self.current)?;
                    true
                }
                None => false,
            },
            #[cfg(feature = "postgres")]
            Cursor::Postgres(rows) => match rows.next() {
                Some(row) => {
                    crate::postgres::read_row(row, width, &mut self.current)?;
                    true
                }
                None => false,
            },
        };
        if !advanced {
            self.done = true;
            return Ok(None);
        }
        Ok(Some(Row::new(&self.columns, &self.current)))
    }
}

impl std::fmt::Debug for RowSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowSet")
            .field("columns", &self.columns.names())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
