#![cfg(feature = "sqlite")]

use std::error::Error;
use std::thread;
use std::time::Duration;

use sql_access::prelude::*;

#[test]
fn concurrent_standalone_writes_do_not_interfere() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let db = Database::new(
        SqliteSource::builder(dir.path().join("concurrent.db"))
            .busy_timeout(Duration::from_secs(10))
            .build(),
    );
    db.execute_batch("CREATE TABLE events (id INTEGER PRIMARY KEY, worker INTEGER NOT NULL, seq INTEGER NOT NULL);")?;

    let workers: Vec<_> = (0..2_i64)
        .map(|worker| {
            let db = db.clone();
            thread::spawn(move || -> Result<(), SqlAccessError> {
                for seq in 0..50_i64 {
                    db.update(named!(
                        "INSERT INTO events (id, worker, seq) VALUES (:id, :worker, :seq)",
                        id => worker * 1_000 + seq,
                        worker => worker,
                        seq => seq,
                    ))?;
                }
                Ok(())
            })
        })
        .collect();

    for handle in workers {
        handle.join().map_err(|_| "worker panicked")??;
    }

    let per_worker = db.find_all(
        "SELECT worker, COUNT(*) AS n FROM events GROUP BY worker ORDER BY worker",
        |row| Ok((row.long("worker")?, row.long("n")?)),
    )?;
    assert_eq!(per_worker, vec![(0, 50), (1, 50)]);
    Ok(())
}

#[test]
fn concurrent_transactions_commit_independently() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let db = Database::new(
        SqliteSource::builder(dir.path().join("concurrent_tx.db"))
            .busy_timeout(Duration::from_secs(10))
            .build(),
    );
    db.execute_batch("CREATE TABLE accounts (id INTEGER PRIMARY KEY, balance INTEGER NOT NULL);")?;

    let workers: Vec<_> = (0..4_i64)
        .map(|worker| {
            let db = db.clone();
            thread::spawn(move || {
                db.transaction(IsolationLevel::Serializable, |tx| {
                    tx.update("INSERT INTO accounts (id, balance) VALUES (?, 100)".params_list([worker]))?;
                    tx.update(
                        "UPDATE accounts SET balance = balance - ? WHERE id = ?"
                            .params_list([worker, worker]),
                    )
                })
            })
        })
        .collect();

    for handle in workers {
        let updated = handle.join().map_err(|_| "worker panicked")??;
        assert_eq!(updated, 1);
    }

    let total = db.find_one("SELECT SUM(balance) AS total FROM accounts", |row| row.long("total"))?;
    assert_eq!(total, Some(400 - (1 + 2 + 3)));
    Ok(())
}
