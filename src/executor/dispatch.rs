use std::borrow::Cow;

use tracing::debug;

use crate::binding::{BoundStatement, bind, has_returning_clause, with_returning_clause};
use crate::connection::DbConnection;
use crate::error::SqlAccessError;
use crate::results::RowSet;
use crate::statement::Statement;
use crate::types::{GeneratedKeys, IsolationLevel};

#[cfg(feature = "postgres")]
use crate::postgres;
#[cfg(feature = "sqlite")]
use crate::sqlite;

impl DbConnection {
    fn bind<'s>(&self, stmt: &'s Statement) -> Result<BoundStatement<'s>, SqlAccessError> {
        let bound = bind(stmt, self.placeholder_style())?;
        debug!(
            backend = ?self.database_type(),
            sql = %bound.sql,
            params = bound.values.len(),
            "executing statement"
        );
        Ok(bound)
    }

    /// Run a row-producing statement, handing the open cursor to `consume`.
    pub(crate) fn query<R, F>(&mut self, stmt: &Statement, consume: F) -> Result<R, SqlAccessError>
    where
        F: FnOnce(&mut RowSet<'_>) -> Result<R, SqlAccessError>,
    {
        let bound = self.bind(stmt)?;
        match self {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => sqlite::query::query(conn, &bound, consume),
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(client) => postgres::query::query(client, &bound, consume),
        }
    }

    pub(crate) fn execute(&mut self, stmt: &Statement) -> Result<usize, SqlAccessError> {
        let bound = self.bind(stmt)?;
        match self {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => sqlite::query::execute(conn, &bound),
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(client) => postgres::query::execute(client, &bound),
        }
    }

    /// Run an insert and capture what it generated.
    ///
    /// A RETURNING clause already in the SQL is used as written; otherwise one
    /// naming `key_columns` (or `*`) is appended.
    pub(crate) fn insert(
        &mut self,
        stmt: &Statement,
        key_columns: &[&str],
    ) -> Result<GeneratedKeys, SqlAccessError> {
        let mut bound = bind(stmt, self.placeholder_style())?;
        if !has_returning_clause(&bound.sql) {
            bound.sql = Cow::Owned(with_returning_clause(&bound.sql, key_columns));
        }
        debug!(
            backend = ?self.database_type(),
            sql = %bound.sql,
            params = bound.values.len(),
            "executing insert"
        );
        match self {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => sqlite::query::insert(conn, &bound),
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(client) => postgres::query::insert(client, &bound),
        }
    }

    pub(crate) fn execute_batch(&mut self, sql: &str) -> Result<(), SqlAccessError> {
        debug!(backend = ?self.database_type(), sql, "executing batch");
        match self {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => sqlite::query::execute_batch(conn, sql),
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(client) => postgres::query::execute_batch(client, sql),
        }
    }

    pub(crate) fn begin(&mut self, isolation: IsolationLevel) -> Result<(), SqlAccessError> {
        debug!(backend = ?self.database_type(), ?isolation, "begin transaction");
        match self {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => sqlite::transaction::begin(conn, isolation),
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(client) => postgres::transaction::begin(client, isolation),
        }
    }

    pub(crate) fn commit(&mut self, isolation: IsolationLevel) -> Result<(), SqlAccessError> {
        debug!(backend = ?self.database_type(), "commit transaction");
        match self {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => sqlite::transaction::commit(conn, isolation),
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(client) => postgres::transaction::commit(client),
        }
    }

    pub(crate) fn rollback(&mut self, isolation: IsolationLevel) -> Result<(), SqlAccessError> {
        debug!(backend = ?self.database_type(), "rollback transaction");
        match self {
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => sqlite::transaction::rollback(conn, isolation),
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(client) => postgres::transaction::rollback(client),
        }
    }
}
