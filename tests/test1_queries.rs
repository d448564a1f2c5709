#![cfg(feature = "sqlite")]

use std::error::Error;

use sql_access::prelude::*;
use tempfile::TempDir;

fn people_db() -> Result<(TempDir, Database), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let db = Database::new(SqliteSource::builder(dir.path().join("people.db")).build());
    db.execute_batch(
        "CREATE TABLE people (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            nickname TEXT,
            age INTEGER
        );
        INSERT INTO people (id, name, nickname, age) VALUES (1, 'Michal', 'Misiek', 34);
        INSERT INTO people (id, name, nickname, age) VALUES (2, 'Kasia', NULL, 0);
        INSERT INTO people (id, name, nickname, age) VALUES (3, 'Tomek', 'Tom', NULL);",
    )?;
    Ok((dir, db))
}

#[test]
fn zero_rows_is_none_and_empty() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = people_db()?;

    let one = db.find_one(
        "SELECT name FROM people WHERE id = ?".params_list([42]),
        |row| row.string("name"),
    )?;
    assert_eq!(one, None);

    let all = db.find_all(
        "SELECT name FROM people WHERE age > :age".params([("age", 100)]),
        |row| row.string("name"),
    )?;
    assert!(all.is_empty());
    Ok(())
}

#[test]
fn positional_and_named_give_same_results() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = people_db()?;
    let name = |row: &Row<'_>| row.string("name");

    let by_position = db.find_all(
        "SELECT name FROM people WHERE id >= ? AND id <= ? ORDER BY id".params_list([1, 2]),
        name,
    )?;
    let by_name = db.find_all(
        "SELECT name FROM people WHERE id >= :lo AND id <= :hi ORDER BY id"
            .params([("lo", 1), ("hi", 2)]),
        name,
    )?;
    assert_eq!(by_position, vec!["Michal", "Kasia"]);
    assert_eq!(by_position, by_name);

    let one_pos = db.find_one(
        positional!("SELECT name FROM people WHERE name = ? AND id = ?", "Kasia", 2),
        name,
    )?;
    let one_named = db.find_one(
        named!("SELECT name FROM people WHERE name = :n AND id = :id", n => "Kasia", id => 2),
        name,
    )?;
    assert_eq!(one_pos, Some("Kasia".to_string()));
    assert_eq!(one_pos, one_named);
    Ok(())
}

#[test]
fn find_all_keeps_result_order() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = people_db()?;
    let ids = db.find_all("SELECT id FROM people ORDER BY id", |row| row.long("id"))?;
    assert_eq!(ids, vec![1, 2, 3]);

    let desc = db.find_all("SELECT id FROM people ORDER BY id DESC", |row| row.long("id"))?;
    assert_eq!(desc, vec![3, 2, 1]);
    Ok(())
}

#[test]
fn find_one_reads_only_the_first_row() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = people_db()?;
    let first = db.find_one("SELECT name FROM people ORDER BY id", |row| row.string("name"))?;
    assert_eq!(first.as_deref(), Some("Michal"));
    Ok(())
}

#[test]
fn nulls_are_explicit() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = people_db()?;
    let q = "SELECT nickname, age FROM people WHERE id = :id";

    let nickname = db.find_one(q.params([("id", 2)]), |row| row.string_or_null("nickname"))?;
    assert_eq!(nickname, Some(None));

    let err = db
        .find_one(q.params([("id", 2)]), |row| row.string("nickname"))
        .unwrap_err();
    assert!(matches!(err, SqlAccessError::MissingValue { ref column } if column == "nickname"));

    // zero is a value, NULL is not
    let age = db.find_one(q.params([("id", 2)]), |row| row.int("age"))?;
    assert_eq!(age, Some(0));
    let age = db.find_one(q.params([("id", 3)]), |row| row.int_or_null("age"))?;
    assert_eq!(age, Some(None));
    Ok(())
}

#[test]
fn null_parameters_bind_as_null() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = people_db()?;
    db.update(named!(
        "INSERT INTO people (id, name, nickname, age) VALUES (:id, :name, :nick, :age)",
        id => 4,
        name => "Ola",
        nick => None::<String>,
        age => None::<i32>,
    ))?;
    let row = db.find_one("SELECT nickname, age FROM people WHERE id = 4", |row| {
        Ok((row.string_or_null("nickname")?, row.long_or_null("age")?))
    })?;
    assert_eq!(row, Some((None, None)));
    Ok(())
}

#[test]
fn column_lookup_ignores_case() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = people_db()?;
    let name = db.find_one("SELECT name AS Name FROM people WHERE id = 1", |row| {
        row.string("NAME")
    })?;
    assert_eq!(name.as_deref(), Some("Michal"));

    let err = db
        .find_one("SELECT name FROM people WHERE id = 1", |row| row.string("surname"))
        .unwrap_err();
    assert!(matches!(err, SqlAccessError::ColumnNotFound(_)));
    Ok(())
}

#[test]
fn update_reports_affected_rows() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = people_db()?;
    let changed = db.update("UPDATE people SET age = age + 1 WHERE age IS NOT NULL")?;
    assert_eq!(changed, 2);

    let deleted = db.update("DELETE FROM people WHERE id = ?".params_list([99]))?;
    assert_eq!(deleted, 0);
    Ok(())
}

#[test]
fn statements_can_be_reused() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = people_db()?;
    let stmt = "SELECT COUNT(*) AS n FROM people WHERE age >= :min".params([("min", 0)]);
    let first = db.find_one(&stmt, |row| row.long("n"))?;
    let second = db.find_one(&stmt, |row| row.long("n"))?;
    assert_eq!(first, Some(2));
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn find_with_walks_the_cursor() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = people_db()?;
    let (count, names) = db.find_with("SELECT name FROM people ORDER BY id", |rows| {
        assert_eq!(rows.column_names(), ["name"]);
        let mut names = Vec::new();
        while let Some(row) = rows.next_row()? {
            names.push(row.string("name")?);
        }
        // exhausted cursors stay exhausted
        assert!(rows.next_row()?.is_none());
        Ok((names.len(), names))
    })?;
    assert_eq!(count, 3);
    assert_eq!(names, vec!["Michal", "Kasia", "Tomek"]);
    Ok(())
}

#[test]
fn stored_extractors_are_reusable() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = people_db()?;
    let person = extractor(|row: &Row<'_>| Ok((row.long("id")?, row.string("name")?)));

    let one = db.find_one("SELECT id, name FROM people WHERE id = 3", &person)?;
    let all = db.find_all("SELECT id, name FROM people ORDER BY id", &person)?;
    assert_eq!(one, Some((3, "Tomek".to_string())));
    assert_eq!(all.len(), 3);
    Ok(())
}

#[test]
fn extractor_errors_propagate() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = people_db()?;
    let err = db
        .find_all("SELECT name FROM people ORDER BY id", |row| row.int("name"))
        .unwrap_err();
    assert!(matches!(err, SqlAccessError::ConversionError { expected: "int", .. }));
    Ok(())
}

#[test]
fn missing_named_parameter_is_binding_error() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = people_db()?;
    let err = db
        .find_one(
            "SELECT name FROM people WHERE id = :id AND name = :name".params([("id", 1)]),
            |row| row.string("name"),
        )
        .unwrap_err();
    assert!(matches!(err, SqlAccessError::BindingError(ref msg) if msg.contains("name")));
    Ok(())
}

#[test]
fn positional_count_mismatch_is_binding_error() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = people_db()?;
    let err = db
        .find_one(
            "SELECT name FROM people WHERE id = ? AND age = ?".params_list([1]),
            |row| row.string("name"),
        )
        .unwrap_err();
    assert!(matches!(err, SqlAccessError::BindingError(_)));
    Ok(())
}

#[test]
fn driver_errors_pass_through() -> Result<(), Box<dyn Error>> {
    let (_dir, db) = people_db()?;
    let err = db.update("UPDATE nowhere SET x = 1").unwrap_err();
    assert!(err.is_driver_error());
    assert!(matches!(err, SqlAccessError::SqliteError(_)));
    Ok(())
}
