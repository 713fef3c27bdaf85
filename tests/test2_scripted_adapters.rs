use odbc_middleware::prelude::*;
use odbc_middleware::test_utils::{Call, Fault, ScriptedConnectivity, ScriptedResult, text_row};

const SELECT: &str = "select name from t";

fn scripted() -> ScriptedConnectivity {
    ScriptedConnectivity::new()
        .with_result(
            SELECT,
            ScriptedResult::rows(&["name"], vec![text_row("a"), text_row("b"), text_row("c")]),
        )
        .with_result("select id, name from t", ScriptedResult::rows(&["id", "name"], vec![]))
        .with_result("insert into t values (?)", ScriptedResult::affected(1))
}

fn open(connectivity: &ScriptedConnectivity) -> Result<Connection, OdbcMiddlewareError> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    OdbcDriver::new(connectivity.clone()).open("DSN=test;UID=user;PWD=secret")
}

#[test]
fn descriptor_reaches_the_primitive_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let connectivity = scripted();
    let _conn = open(&connectivity)?;
    assert_eq!(
        connectivity.descriptors(),
        vec!["DSN=test;UID=user;PWD=secret".to_string()]
    );
    Ok(())
}

#[test]
fn connect_failure_carries_the_diagnostic() {
    let connectivity = scripted();
    connectivity.fail(Fault::Connect);
    let err = open(&connectivity).unwrap_err();
    assert!(matches!(err, OdbcMiddlewareError::ConnectError(_)));
    assert_eq!(err.driver_error().and_then(DriverError::sqlstate), Some("HY000"));
}

#[test]
fn scan_stops_at_end_of_data_and_stays_there() -> Result<(), Box<dyn std::error::Error>> {
    let connectivity = scripted();
    let conn = open(&connectivity)?;
    let mut stmt = conn.prepare(SELECT)?;
    let mut rows = stmt.query(&[])?;
    assert_eq!(rows.columns(), vec!["name".to_string()]);

    let mut buf = vec![RowValues::Null];
    for expected in ["a", "b", "c"] {
        assert_eq!(rows.next(&mut buf)?, Fetch::Row);
        assert_eq!(buf[0].as_text(), Some(expected));
    }
    assert_eq!(rows.next(&mut buf)?, Fetch::Exhausted);
    // buffer untouched at end of data
    assert_eq!(buf[0].as_text(), Some("c"));
    assert_eq!(rows.next(&mut buf)?, Fetch::Exhausted);
    assert_eq!(connectivity.count(|c| *c == Call::Fetch), 4);
    Ok(())
}

#[test]
fn failed_metadata_lookup_yields_no_columns_at_all() -> Result<(), Box<dyn std::error::Error>> {
    let connectivity = scripted();
    let conn = open(&connectivity)?;
    let mut stmt = conn.prepare("select id, name from t")?;
    let rows = stmt.query(&[])?;

    connectivity.fail(Fault::FieldMetadata(2));
    assert!(rows.columns().is_empty());
    assert!(matches!(
        rows.try_columns(),
        Err(OdbcMiddlewareError::MetadataUnavailable(_))
    ));
    assert!(connectivity.journal().contains(&Call::FieldMetadata(1)));

    connectivity.heal(Fault::FieldMetadata(2));
    connectivity.fail(Fault::NumFields);
    assert!(rows.columns().is_empty());

    connectivity.heal(Fault::NumFields);
    assert_eq!(rows.columns(), vec!["id".to_string(), "name".to_string()]);
    Ok(())
}

#[test]
fn closing_the_cursor_releases_the_statement_once() -> Result<(), Box<dyn std::error::Error>> {
    let connectivity = scripted();
    let conn = open(&connectivity)?;
    let mut stmt = conn.prepare(SELECT)?;
    let rows = stmt.query(&[])?;
    rows.close()?;
    assert!(stmt.is_closed());
    stmt.close()?;
    drop(stmt);
    assert_eq!(
        connectivity.count(|c| matches!(c, Call::CloseStatement(_))),
        1
    );
    Ok(())
}

#[test]
fn dropping_a_statement_releases_its_handle() -> Result<(), Box<dyn std::error::Error>> {
    let connectivity = scripted();
    let conn = open(&connectivity)?;
    {
        let mut stmt = conn.prepare(SELECT)?;
        let mut rows = stmt.query(&[])?;
        assert_eq!(rows.next_row()?, Some(text_row("a")));
    }
    assert_eq!(
        connectivity.journal().last(),
        Some(&Call::CloseStatement(SELECT.to_string()))
    );
    Ok(())
}

#[test]
fn statement_close_never_fails() -> Result<(), Box<dyn std::error::Error>> {
    let connectivity = scripted();
    let conn = open(&connectivity)?;
    let mut stmt = conn.prepare(SELECT)?;
    connectivity.fail(Fault::CloseStatement);
    stmt.close()?;
    assert!(stmt.is_closed());
    Ok(())
}

#[test]
fn fetch_failure_surfaces_as_fetch_error() -> Result<(), Box<dyn std::error::Error>> {
    let connectivity = scripted();
    let conn = open(&connectivity)?;
    let mut stmt = conn.prepare(SELECT)?;
    let mut rows = stmt.query(&[])?;
    connectivity.fail(Fault::Fetch);
    let mut buf = vec![RowValues::Null];
    assert!(matches!(
        rows.next(&mut buf),
        Err(OdbcMiddlewareError::FetchError(_))
    ));
    assert!(!rows.is_exhausted());
    Ok(())
}

#[test]
fn exec_binds_arguments_and_reports_affected_rows() -> Result<(), Box<dyn std::error::Error>> {
    let connectivity = scripted();
    let conn = open(&connectivity)?;
    let mut stmt = conn.prepare("insert into t values (?)")?;
    assert_eq!(stmt.num_input(), Some(1));

    let result = stmt.exec(&[RowValues::Int(7)])?;
    assert_eq!(result.rows_affected(), 1);
    assert!(connectivity.journal().contains(&Call::Execute {
        sql: "insert into t values (?)".to_string(),
        args: 1,
    }));

    let err = stmt.exec(&[]).unwrap_err();
    assert_eq!(err.driver_error().and_then(DriverError::sqlstate), Some("07002"));

    connectivity.fail(Fault::RowsAffected);
    assert!(matches!(
        stmt.exec(&[RowValues::Int(8)]),
        Err(OdbcMiddlewareError::ExecError(_))
    ));
    Ok(())
}

#[test]
fn execute_failure_on_query_is_a_query_error() -> Result<(), Box<dyn std::error::Error>> {
    let connectivity = scripted();
    let conn = open(&connectivity)?;
    let mut stmt = conn.prepare(SELECT)?;
    connectivity.fail(Fault::Execute);
    assert!(matches!(
        stmt.query(&[]),
        Err(OdbcMiddlewareError::QueryError(_))
    ));
    Ok(())
}

#[test]
fn argument_count_mismatch_on_query_is_a_query_error() -> Result<(), Box<dyn std::error::Error>> {
    let connectivity = scripted();
    let conn = open(&connectivity)?;
    let mut stmt = conn.prepare("insert into t values (?)")?;
    let err = stmt.query(&[]).unwrap_err();
    assert!(matches!(err, OdbcMiddlewareError::QueryError(_)));
    assert_eq!(err.driver_error().and_then(DriverError::sqlstate), Some("07002"));
    Ok(())
}

#[test]
fn unknown_parameter_count_is_none() -> Result<(), Box<dyn std::error::Error>> {
    let connectivity = scripted();
    let conn = open(&connectivity)?;
    let stmt = conn.prepare("insert into t values (?)")?;
    connectivity.fail(Fault::NumParams);
    assert_eq!(stmt.num_input(), None);
    Ok(())
}

#[test]
fn prepare_failure_is_a_prepare_error() -> Result<(), Box<dyn std::error::Error>> {
    let connectivity = scripted();
    let conn = open(&connectivity)?;
    connectivity.fail(Fault::Prepare);
    assert!(matches!(
        conn.prepare(SELECT),
        Err(OdbcMiddlewareError::PrepareError(_))
    ));
    Ok(())
}

#[test]
fn closed_connection_rejects_work_and_closes_once() -> Result<(), Box<dyn std::error::Error>> {
    let connectivity = scripted();
    let mut conn = open(&connectivity)?;
    conn.close()?;
    conn.close()?;
    assert!(conn.is_closed());
    assert!(matches!(
        conn.prepare(SELECT),
        Err(OdbcMiddlewareError::ConnectionClosed)
    ));
    drop(conn);
    assert_eq!(connectivity.count(|c| *c == Call::CloseConnection), 1);
    Ok(())
}

#[test]
fn disconnect_failure_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let connectivity = scripted();
    let mut conn = open(&connectivity)?;
    connectivity.fail(Fault::CloseConnection);
    assert!(matches!(
        conn.close(),
        Err(OdbcMiddlewareError::ConnectError(_))
    ));
    assert!(conn.is_closed());
    Ok(())
}
