use std::thread;
use std::time::Duration;

use crate::error::SqlAccessError;
use crate::types::IsolationLevel;

const ROLLBACK_BUSY_RETRIES: &[Duration] = &[
    Duration::from_millis(10),
    Duration::from_millis(25),
    Duration::from_millis(50),
];

/// `SQLite` transactions are always serializable; the level only changes how
/// eagerly the write lock is taken and whether dirty reads are allowed.
pub(crate) fn begin(
    conn: &rusqlite::Connection,
    isolation: IsolationLevel,
) -> Result<(), SqlAccessError> {
    let sql = match isolation {
        IsolationLevel::Serializable => "BEGIN IMMEDIATE",
        IsolationLevel::ReadUncommitted => "PRAGMA read_uncommitted = 1; BEGIN",
        IsolationLevel::Default
        | IsolationLevel::ReadCommitted
        | IsolationLevel::RepeatableRead => "BEGIN",
    };
    conn.execute_batch(sql)?;
    Ok(())
}

pub(crate) fn commit(
    conn: &rusqlite::Connection,
    isolation: IsolationLevel,
) -> Result<(), SqlAccessError> {
    let result = conn.execute_batch("COMMIT").map_err(SqlAccessError::from);
    restore_isolation(conn, isolation, result)
}

pub(crate) fn rollback(
    conn: &rusqlite::Connection,
    isolation: IsolationLevel,
) -> Result<(), SqlAccessError> {
    let result = rollback_with_busy_retries(conn);
    restore_isolation(conn, isolation, result)
}

/// Dirty reads end with the transaction that asked for them, whether or not
/// it ended cleanly.
fn restore_isolation(
    conn: &rusqlite::Connection,
    isolation: IsolationLevel,
    result: Result<(), SqlAccessError>,
) -> Result<(), SqlAccessError> {
    if isolation != IsolationLevel::ReadUncommitted {
        return result;
    }
    let reset = conn.execute_batch("PRAGMA read_uncommitted = 0");
    result?;
    reset?;
    Ok(())
}

pub(crate) fn rollback_with_busy_retries(
    conn: &rusqlite::Connection,
) -> Result<(), SqlAccessError> {
    for (idx, delay) in ROLLBACK_BUSY_RETRIES.iter().copied().enumerate() {
        match conn.execute_batch("ROLLBACK") {
            Ok(()) => return Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::DatabaseBusy
                    && idx + 1 < ROLLBACK_BUSY_RETRIES.len() =>
            {
                thread::sleep(delay);
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(SqlAccessError::ExecutionError(
        "rollback retries exhausted".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_uncommitted_sets_pragma() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        begin(&conn, IsolationLevel::ReadUncommitted).unwrap();
        let flag: i64 = conn
            .query_row("PRAGMA read_uncommitted", [], |row| row.get(0))
            .unwrap();
        assert_eq!(flag, 1);
        assert!(!conn.is_autocommit());
        rollback(&conn, IsolationLevel::ReadUncommitted).unwrap();
        assert!(conn.is_autocommit());
    }

    #[test]
    fn dirty_reads_do_not_outlive_the_transaction() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let flag = |conn: &rusqlite::Connection| -> i64 {
            conn.query_row("PRAGMA read_uncommitted", [], |row| row.get(0))
                .unwrap()
        };

        begin(&conn, IsolationLevel::ReadUncommitted).unwrap();
        rollback(&conn, IsolationLevel::ReadUncommitted).unwrap();
        assert_eq!(flag(&conn), 0);

        begin(&conn, IsolationLevel::ReadUncommitted).unwrap();
        commit(&conn, IsolationLevel::ReadUncommitted).unwrap();
        assert_eq!(flag(&conn), 0);

        // a failed end still resets the pragma
        conn.execute_batch("PRAGMA read_uncommitted = 1").unwrap();
        assert!(commit(&conn, IsolationLevel::ReadUncommitted).is_err());
        assert_eq!(flag(&conn), 0);
    }

    #[test]
    fn rollback_without_transaction_fails() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        assert!(rollback_with_busy_retries(&conn).is_err());
    }
}
