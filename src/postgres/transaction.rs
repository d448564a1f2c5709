use postgres::Client;

use crate::error::SqlAccessError;
use crate::types::IsolationLevel;

pub(crate) fn begin(client: &mut Client, isolation: IsolationLevel) -> Result<(), SqlAccessError> {
    match isolation.as_sql() {
        Some(level) => client.batch_execute(&format!("BEGIN ISOLATION LEVEL {level}"))?,
        None => client.batch_execute("BEGIN")?,
    }
    Ok(())
}

pub(crate) fn commit(client: &mut Client) -> Result<(), SqlAccessError> {
    client.batch_execute("COMMIT")?;
    Ok(())
}

pub(crate) fn rollback(client: &mut Client) -> Result<(), SqlAccessError> {
    client.batch_execute("ROLLBACK")?;
    Ok(())
}
