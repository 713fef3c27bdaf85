#![cfg(feature = "sqlite")]

use std::time::Duration;

use odbc_middleware::prelude::*;
use odbc_middleware::registry;
use odbc_middleware::sqlite::{SqliteMode, SqliteOptionsBuilder};
use tempfile::tempdir;

#[test]
fn global_registry_opens_registered_drivers() -> Result<(), Box<dyn std::error::Error>> {
    let name = "sqlite-registry-fixture";
    registry::global().register(name, OdbcDriver::new(SqliteConnectivity::new()))?;
    assert!(registry::global().drivers().contains(&name.to_string()));

    let conn = registry::global().open(name, "Database=:memory:")?;
    let mut stmt = conn.prepare("SELECT 41 + 1")?;
    let mut rows = stmt.query(&[])?;
    assert_eq!(rows.next_row()?, Some(vec![RowValues::Int(42)]));

    assert!(registry::global().unregister(name).is_some());
    assert!(matches!(
        registry::global().open(name, "Database=:memory:"),
        Err(OdbcMiddlewareError::UnknownDriver(_))
    ));
    Ok(())
}

#[test]
fn committed_rows_are_visible_to_other_connections() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("shared.db");
    let path = path.to_string_lossy().into_owned();
    let driver = OdbcDriver::new(SqliteConnectivity::new());

    let writer = driver.open(
        &SqliteOptionsBuilder::new(path.clone())
            .busy_timeout(Duration::from_millis(500))
            .descriptor(),
    )?;
    writer
        .prepare("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")?
        .exec(&[])?;
    let tx = writer.begin()?;
    tx.connection()
        .prepare("INSERT INTO t (name) VALUES (?)")?
        .exec(&[RowValues::Text("persisted".into())])?;
    tx.commit().map_err(OdbcMiddlewareError::from)?;

    let reader = driver.open(
        &SqliteOptionsBuilder::new(path)
            .mode(SqliteMode::ReadOnly)
            .descriptor(),
    )?;
    let mut select = reader.prepare("SELECT name FROM t")?;
    let result_set = select.query(&[])?.collect_result_set()?;
    assert_eq!(result_set.len(), 1);
    assert_eq!(
        result_set.results[0].get("name"),
        Some(&RowValues::Text("persisted".into()))
    );

    let err = reader
        .prepare("INSERT INTO t (name) VALUES ('nope')")?
        .exec(&[])
        .unwrap_err();
    assert!(matches!(err, OdbcMiddlewareError::ExecError(_)));
    Ok(())
}

#[test]
fn read_only_mode_requires_an_existing_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let missing = dir.path().join("missing.db");
    let descriptor = SqliteOptionsBuilder::new(missing.to_string_lossy())
        .mode(SqliteMode::ReadOnly)
        .descriptor();
    let err = OdbcDriver::new(SqliteConnectivity::new())
        .open(&descriptor)
        .unwrap_err();
    assert!(matches!(err, OdbcMiddlewareError::ConnectError(_)));
    Ok(())
}

fn count(conn: &Connection) -> Result<Option<Vec<RowValues>>, OdbcMiddlewareError> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM t")?;
    let mut rows = stmt.query(&[])?;
    rows.next_row()
}

#[test]
fn commit_blocked_by_a_reader_can_be_retried() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("busy.db");
    // no busy handler: a blocked commit fails at once
    let descriptor = SqliteOptionsBuilder::new(path.to_string_lossy())
        .busy_timeout(Duration::ZERO)
        .descriptor();
    let driver = OdbcDriver::new(SqliteConnectivity::new());

    let writer = driver.open(&descriptor)?;
    writer
        .prepare("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")?
        .exec(&[])?;
    let reader = driver.open(&descriptor)?;

    // the reader's open transaction keeps its shared lock
    let read_tx = reader.begin()?;
    assert_eq!(count(read_tx.connection())?, Some(vec![RowValues::Int(0)]));

    let tx = writer.begin()?;
    tx.connection()
        .prepare("INSERT INTO t (name) VALUES (?)")?
        .exec(&[RowValues::Text("kept".into())])?;
    let failed = tx.commit().unwrap_err();
    assert!(matches!(failed.error(), OdbcMiddlewareError::CommitError(_)));
    assert_eq!(writer.transaction_state(), TxState::Open);

    read_tx.rollback()?;
    let outcome = failed
        .into_transaction()
        .commit()
        .map_err(OdbcMiddlewareError::from)?;
    assert!(outcome.is_committed());
    assert_eq!(count(&reader)?, Some(vec![RowValues::Int(1)]));
    Ok(())
}
