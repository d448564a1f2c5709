use tracing::warn;

use crate::connection::DbConnection;
use crate::error::SqlAccessError;
use crate::executor;
use crate::results::{Row, RowSet};
use crate::statement::Statement;
use crate::types::{GeneratedKeys, IsolationLevel};

/// An open transaction that owns its connection until commit or rollback.
///
/// Every call made through it runs on that one connection, in order. Dropping
/// a transaction that was neither committed nor rolled back rolls it back.
///
/// Inside [`Database::transaction`](crate::Database::transaction) the same type
/// doubles as the status handle: [`Transaction::set_rollback_only`] asks the
/// controller to roll back instead of committing without raising an error.
pub struct Transaction {
    conn: Option<DbConnection>,
    isolation: IsolationLevel,
    rollback_only: bool,
}

impl Transaction {
    pub(crate) fn begin(
        mut conn: DbConnection,
        isolation: IsolationLevel,
    ) -> Result<Self, SqlAccessError> {
        conn.begin(isolation)?;
        Ok(Self {
            conn: Some(conn),
            isolation,
            rollback_only: false,
        })
    }

    fn conn_mut(&mut self) -> Result<&mut DbConnection, SqlAccessError> {
        self.conn
            .as_mut()
            .ok_or_else(|| SqlAccessError::ExecutionError("transaction already completed".into()))
    }

    #[must_use]
    pub fn isolation_level(&self) -> IsolationLevel {
        self.isolation
    }

    /// Mark the transaction so that it ends in a rollback.
    pub fn set_rollback_only(&mut self) {
        self.rollback_only = true;
    }

    #[must_use]
    pub fn is_rollback_only(&self) -> bool {
        self.rollback_only
    }

    /// First row through `extractor`, or `None` if the query matched nothing.
    ///
    /// # Errors
    ///
    /// Binding, driver and extractor failures, unchanged.
    pub fn find_one<T, F>(
        &mut self,
        stmt: impl Into<Statement>,
        extractor: F,
    ) -> Result<Option<T>, SqlAccessError>
    where
        F: Fn(&Row<'_>) -> Result<T, SqlAccessError>,
    {
        executor::find_one(self.conn_mut()?, &stmt.into(), extractor)
    }

    /// Every row through `extractor`, in result order.
    ///
    /// # Errors
    ///
    /// Binding, driver and extractor failures, unchanged.
    pub fn find_all<T, F>(
        &mut self,
        stmt: impl Into<Statement>,
        extractor: F,
    ) -> Result<Vec<T>, SqlAccessError>
    where
        F: Fn(&Row<'_>) -> Result<T, SqlAccessError>,
    {
        executor::find_all(self.conn_mut()?, &stmt.into(), extractor)
    }

    /// # Errors
    ///
    /// Binding, driver and `consume` failures, unchanged.
    pub fn find_with<T, F>(&mut self, stmt: impl Into<Statement>, consume: F) -> Result<T, SqlAccessError>
    where
        F: FnOnce(&mut RowSet<'_>) -> Result<T, SqlAccessError>,
    {
        executor::find_with(self.conn_mut()?, &stmt.into(), consume)
    }

    /// # Errors
    ///
    /// Binding and driver failures.
    pub fn update(&mut self, stmt: impl Into<Statement>) -> Result<usize, SqlAccessError> {
        executor::update(self.conn_mut()?, &stmt.into())
    }

    /// # Errors
    ///
    /// Binding and driver failures.
    pub fn insert(&mut self, stmt: impl Into<Statement>) -> Result<GeneratedKeys, SqlAccessError> {
        executor::insert(self.conn_mut()?, &stmt.into(), &[])
    }

    /// # Errors
    ///
    /// Binding and driver failures.
    pub fn insert_returning(
        &mut self,
        stmt: impl Into<Statement>,
        key_columns: &[&str],
    ) -> Result<GeneratedKeys, SqlAccessError> {
        executor::insert(self.conn_mut()?, &stmt.into(), key_columns)
    }

    /// # Errors
    ///
    /// Driver failures.
    pub fn execute_batch(&mut self, sql: &str) -> Result<(), SqlAccessError> {
        executor::execute_batch(self.conn_mut()?, sql)
    }

    /// Commit and release the connection.
    ///
    /// A transaction marked rollback-only is rolled back instead and reported
    /// as an `ExecutionError`. If COMMIT itself fails the transaction is rolled
    /// back before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the driver error from COMMIT, or `ExecutionError` as above.
    pub fn commit(mut self) -> Result<(), SqlAccessError> {
        let mut conn = self
            .conn
            .take()
            .ok_or_else(|| SqlAccessError::ExecutionError("transaction already completed".into()))?;
        if self.rollback_only {
            conn.rollback(self.isolation)?;
            return Err(SqlAccessError::ExecutionError(
                "transaction was marked rollback-only and has been rolled back".into(),
            ));
        }
        if let Err(err) = conn.commit(self.isolation) {
            if let Err(rollback_err) = conn.rollback(self.isolation) {
                warn!(error = %rollback_err, "rollback after failed commit also failed");
            }
            return Err(err);
        }
        Ok(())
    }

    /// Roll back and release the connection.
    ///
    /// # Errors
    ///
    /// Returns the driver error from ROLLBACK.
    pub fn rollback(mut self) -> Result<(), SqlAccessError> {
        let mut conn = self
            .conn
            .take()
            .ok_or_else(|| SqlAccessError::ExecutionError("transaction already completed".into()))?;
        conn.rollback(self.isolation)
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            warn!("transaction dropped without commit or rollback; rolling back");
            if let Err(err) = conn.rollback(self.isolation) {
                warn!(error = %err, "implicit rollback of dropped transaction failed");
            }
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("conn", &self.conn)
            .field("isolation", &self.isolation)
            .field("rollback_only", &self.rollback_only)
            .finish()
    }
}
