#![cfg(feature = "sqlite")]

use std::error::Error;
use std::io::Read;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use sql_access::prelude::*;
use tempfile::TempDir;

fn open_db() -> Result<(TempDir, Database), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let db = Database::connect(&format!("sqlite:{}", dir.path().join("keys.db").display()))?;
    db.execute_batch(
        "CREATE TABLE people (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            created TEXT DEFAULT '2024-05-01 08:00:00'
        );
        CREATE TABLE tags (label TEXT NOT NULL);
        CREATE TABLE samples (
            id INTEGER PRIMARY KEY,
            flag INTEGER,
            price TEXT,
            ratio REAL,
            created TEXT,
            born TEXT,
            payload BLOB,
            doc TEXT,
            labels TEXT
        );",
    )?;
    Ok((dir, db))
}

#[test]
fn insert_round_trips_through_generated_key() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = open_db()?;

    let keys = db.insert("INSERT INTO people (name) VALUES (:name)".params([("name", "Kasia")]))?;
    let id = keys.get("id").and_then(SqlValue::as_int).ok_or("no generated id")?;

    let name = db.find_one(
        "SELECT name FROM people WHERE id = ?".params_list([id]),
        |row| row.string("name"),
    )?;
    assert_eq!(name.as_deref(), Some("Kasia"));

    // defaults filled in by the database come back too
    assert_eq!(
        keys.get("created"),
        Some(&SqlValue::Text("2024-05-01 08:00:00".into()))
    );
    Ok(())
}

#[test]
fn trailing_line_comment_keeps_generated_keys() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = open_db()?;

    let keys = db.insert("INSERT INTO people (name) VALUES ('Kasia') -- add Kasia")?;
    let id = keys.get("id").and_then(SqlValue::as_int).ok_or("no generated id")?;
    assert_eq!(id, 1);

    let keys = db.insert_returning("INSERT INTO people (name) VALUES ('Ola'); -- and Ola", &["id"])?;
    assert_eq!(keys.get("id"), Some(&SqlValue::Int(2)));
    Ok(())
}

#[test]
fn generated_keys_increase() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = open_db()?;
    let first = db.insert("INSERT INTO people (name) VALUES (?)".params_list(["Michal"]))?;
    let second = db.insert("INSERT INTO people (name) VALUES (?)".params_list(["Kasia"]))?;
    assert_eq!(first.get("id"), Some(&SqlValue::Int(1)));
    assert_eq!(second.get("id"), Some(&SqlValue::Int(2)));
    Ok(())
}

#[test]
fn insert_returning_limits_the_keys() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = open_db()?;
    let keys = db.insert_returning(
        "INSERT INTO people (name) VALUES (:name);".params([("name", "Ola")]),
        &["id"],
    )?;
    assert_eq!(keys.len(), 1);
    assert_eq!(keys.get("id"), Some(&SqlValue::Int(1)));

    // an explicit RETURNING clause is used as written
    let keys = db.insert("INSERT INTO people (name) VALUES ('Ewa') RETURNING name AS who")?;
    assert_eq!(keys.get("who"), Some(&SqlValue::Text("Ewa".into())));
    assert_eq!(keys.len(), 1);
    Ok(())
}

#[test]
fn insert_without_produced_row_gives_empty_keys() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = open_db()?;
    let keys = db.insert("INSERT INTO people (name) SELECT 'nobody' WHERE 0")?;
    assert!(keys.is_empty());

    let count = db.find_one("SELECT COUNT(*) AS n FROM people", |row| row.long("n"))?;
    assert_eq!(count, Some(0));
    Ok(())
}

#[test]
fn update_never_returns_keys() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = open_db()?;
    let affected = db.update("INSERT INTO tags (label) VALUES (?), (?)".params_list(["a", "b"]))?;
    assert_eq!(affected, 2);
    Ok(())
}

#[test]
fn typed_values_round_trip() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = open_db()?;
    let created = NaiveDate::from_ymd_opt(2024, 2, 29)
        .ok_or("bad date")?
        .and_hms_milli_opt(13, 45, 10, 125)
        .ok_or("bad time")?;
    let born = NaiveDate::from_ymd_opt(1990, 7, 14).ok_or("bad date")?;
    let price: Decimal = "1234.50".parse()?;

    db.update(named!(
        "INSERT INTO samples (id, flag, price, ratio, created, born, payload, doc, labels)
         VALUES (:id, :flag, :price, :ratio, :created, :born, :payload, :doc, :labels)",
        id => 1,
        flag => true,
        price => price,
        ratio => 0.25,
        created => created,
        born => born,
        payload => vec![0_u8, 159, 146, 150],
        doc => json!({ "kind": "sample", "size": 3 }),
        labels => json!(["red", "green"]),
    ))?;

    let got = db
        .find_one("SELECT * FROM samples WHERE id = 1", |row| {
            Ok((
                row.boolean("flag")?,
                row.decimal("price")?,
                row.double("ratio")?,
                row.timestamp("created")?,
                row.date("born")?,
                row.bytes("payload")?,
                row.json("doc")?,
                row.array::<String>("labels")?,
            ))
        })?
        .ok_or("row missing")?;

    assert!(got.0);
    assert_eq!(got.1, price);
    assert!((got.2 - 0.25).abs() < f64::EPSILON);
    assert_eq!(got.3, created);
    assert_eq!(got.4, born);
    assert_eq!(got.5, vec![0, 159, 146, 150]);
    assert_eq!(got.6["kind"], "sample");
    assert_eq!(got.7, vec!["red", "green"]);
    Ok(())
}

#[test]
fn streams_read_column_contents() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = open_db()?;
    db.update(positional!(
        "INSERT INTO samples (id, doc, payload) VALUES (?, ?, ?)",
        7,
        "long text body",
        b"\x01\x02\x03".as_slice(),
    ))?;

    let (text, bytes) = db
        .find_one("SELECT doc, payload FROM samples WHERE id = 7", |row| {
            let mut text = String::new();
            row.character_stream("doc")?
                .read_to_string(&mut text)
                .map_err(|e| SqlAccessError::ExecutionError(e.to_string()))?;
            let mut bytes = Vec::new();
            row.binary_stream("payload")?
                .read_to_end(&mut bytes)
                .map_err(|e| SqlAccessError::ExecutionError(e.to_string()))?;
            Ok((text, bytes))
        })?
        .ok_or("row missing")?;
    assert_eq!(text, "long text body");
    assert_eq!(bytes, vec![1, 2, 3]);
    Ok(())
}

// A NULL array column is reported like any other NULL: `None` from the
// nullable accessor and `MissingValue` from the strict one, never an empty list.
#[test]
fn null_array_column_is_not_an_empty_list() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = open_db()?;
    db.update("INSERT INTO samples (id, labels) VALUES (2, NULL)")?;

    let nullable = db.find_one("SELECT labels FROM samples WHERE id = 2", |row| {
        row.array_or_null::<String>("labels")
    })?;
    assert_eq!(nullable, Some(None));

    let err = db
        .find_one("SELECT labels FROM samples WHERE id = 2", |row| {
            row.array::<String>("labels")
        })
        .unwrap_err();
    assert!(matches!(err, SqlAccessError::MissingValue { ref column } if column == "labels"));
    Ok(())
}

#[test]
fn arrays_cannot_bind_to_sqlite() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = open_db()?;
    let err = db
        .update(
            "INSERT INTO samples (id, labels) VALUES (?, ?)"
                .params_list([SqlValue::Int(3), SqlValue::Array(vec![SqlValue::Int(1)])]),
        )
        .unwrap_err();
    assert!(matches!(err, SqlAccessError::BindingError(_)));
    Ok(())
}
