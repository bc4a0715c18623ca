//! Integration tests for the PostgreSQL session
//!
//! These tests require a running server; see `tests/integration.rs`.

use crate::common::admin_params;
use pgmonitor::DbError;
use pgmonitor::db::{Executor, Session};

#[tokio::test]
async fn test_connect_reads_server_version() {
    let params = admin_params();
    let (session, _) = match Session::connect(&params).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!(
                "Skipping test: Database not available at {}:{} - {}",
                params.host, params.port, e
            );
            return;
        }
    };

    let version = session.server_version().unwrap();
    assert!(version >= 90000, "unexpected server_version_num {}", version);
}

#[tokio::test]
async fn test_values_arrive_as_text() {
    let (session, _) = match Session::connect(&admin_params()).await {
        Ok(s) => s,
        Err(_) => {
            eprintln!("Skipping test: Database not available");
            return;
        }
    };

    let result = session
        .execute("SELECT 1 AS num, 'hello' AS msg, NULL::text AS nothing, true AS flag")
        .await
        .unwrap();
    assert_eq!(result.columns.len(), 4);
    assert_eq!(result.row_count(), 1);

    let row = result.first().unwrap();
    assert_eq!(row.get("num"), Some("1"));
    assert_eq!(row.get("msg"), Some("hello"));
    assert_eq!(row.get("nothing"), None);
    assert_eq!(row.get("flag"), Some("t"));
}

#[tokio::test]
async fn test_empty_result_keeps_columns() {
    let (session, _) = match Session::connect(&admin_params()).await {
        Ok(s) => s,
        Err(_) => {
            eprintln!("Skipping test: Database not available");
            return;
        }
    };

    let result = session
        .execute("SELECT datname FROM pg_database WHERE false")
        .await
        .unwrap();
    assert!(result.is_empty());
    assert_eq!(&result.columns[..], &["datname".to_string()]);
}

#[tokio::test]
async fn test_query_error_reports_query_failed() {
    let (session, _) = match Session::connect(&admin_params()).await {
        Ok(s) => s,
        Err(_) => {
            eprintln!("Skipping test: Database not available");
            return;
        }
    };

    let err = session
        .execute("SELECT * FROM nonexistent_table_xyz")
        .await
        .unwrap_err();
    match err {
        DbError::QueryFailed { message, sqlstate } => {
            assert!(message.contains("nonexistent_table_xyz"), "got {}", message);
            assert_eq!(sqlstate.as_deref(), Some("42P01"));
        }
        other => panic!("Expected QueryFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_closed_session_rejects_statements() {
    let (mut session, _) = match Session::connect(&admin_params()).await {
        Ok(s) => s,
        Err(_) => {
            eprintln!("Skipping test: Database not available");
            return;
        }
    };

    session.close();
    session.close();
    assert!(session.is_closed());
    assert!(matches!(
        session.execute("SELECT 1").await,
        Err(DbError::SessionClosed)
    ));
    assert!(matches!(session.server_version(), Err(DbError::SessionClosed)));
}

#[tokio::test]
async fn test_connect_to_closed_port_fails() {
    let mut params = admin_params();
    params.host = "127.0.0.1".to_string();
    params.port = 1;

    match Session::connect(&params).await {
        Err(DbError::ConnectionFailed(_)) => {}
        Err(other) => panic!("Expected ConnectionFailed, got {:?}", other),
        Ok(_) => panic!("Connecting to port 1 should fail"),
    }
}
