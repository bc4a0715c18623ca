//! End-to-end diagnostics against the scratch database
//!
//! The fixture holds one table `t` with a single row and one index.

use crate::common::{FIXTURE_DB, fixture_monitor};
use pgmonitor::DbError;
use pgmonitor::catalog::{Diagnostic, PG_STAT_STATEMENTS};
use pgmonitor::monitor::Availability;

#[tokio::test]
async fn test_version_row() {
    let Some(mut monitor) = fixture_monitor().await else {
        return;
    };

    let result = monitor.database_version().await.unwrap();
    let version = result.first().and_then(|r| r.get("version")).unwrap();
    assert!(version.starts_with("PostgreSQL"), "got {}", version);
}

#[tokio::test]
async fn test_records_rank_lists_fixture_table() {
    let Some(mut monitor) = fixture_monitor().await else {
        return;
    };

    let result = monitor.records_rank().await.unwrap();
    let first = result.first().expect("records_rank returned no rows");
    assert_eq!(first.get("name"), Some("t"));
    assert_eq!(first.get("estimated_count"), Some("1"));
}

#[tokio::test]
async fn test_size_reports_see_fixture() {
    let Some(mut monitor) = fixture_monitor().await else {
        return;
    };

    let tables = monitor.table_size().await.unwrap();
    assert_eq!(tables.first().and_then(|r| r.get("name")), Some("t"));

    let indexes = monitor.index_size().await.unwrap();
    assert!(indexes.rows.iter().any(|r| r.get("name") == Some("test_column_idx")));

    let databases = monitor.list_databases().await.unwrap();
    assert!(databases.rows.iter().any(|r| r.get("datname") == Some(FIXTURE_DB)));

    let stats = monitor.database_stats().await.unwrap();
    assert_eq!(stats.row_count(), 1);
    assert_eq!(stats.first().and_then(|r| r.get("datname")), Some(FIXTURE_DB));
}

#[tokio::test]
async fn test_modern_server_groups_by_state() {
    let Some(mut monitor) = fixture_monitor().await else {
        return;
    };

    assert!(monitor.is_modern_era().unwrap());
    let result = monitor.connection_counts().await.unwrap();
    assert_eq!(&result.columns[..], &["state".to_string(), "count".to_string()]);
    assert!(!result.is_empty());

    let active = monitor.active_connections().await.unwrap();
    assert_eq!(active.row_count(), 1);
    assert!(active.first().and_then(|r| r.get("active_sessions")).is_some());
}

#[tokio::test]
async fn test_dialect_reports_run() {
    let Some(mut monitor) = fixture_monitor().await else {
        return;
    };

    // Nothing is blocked or slow in the fixture, but the statements must parse
    monitor.blocking().await.unwrap();
    monitor.locks().await.unwrap();
    monitor.long_running_queries().await.unwrap();
}

#[tokio::test]
async fn test_every_diagnostic_runs() {
    let Some(mut monitor) = fixture_monitor().await else {
        return;
    };

    let installed = monitor.has_extension(PG_STAT_STATEMENTS).await.unwrap();
    for diagnostic in Diagnostic::ALL {
        // Resetting would wipe statistics other users of the server rely on
        if diagnostic == Diagnostic::ResetStatementStats {
            continue;
        }
        match monitor.run(diagnostic).await {
            Ok(Availability::Available(_)) => {}
            Ok(Availability::Unavailable { extension }) => {
                assert!(!installed, "{} unavailable although installed", diagnostic);
                assert_eq!(extension, PG_STAT_STATEMENTS);
            }
            Err(e) => panic!("{} failed: {}", diagnostic, e),
        }
    }
}

#[tokio::test]
async fn test_outliers_without_extension_is_unavailable() {
    let Some(mut monitor) = fixture_monitor().await else {
        return;
    };

    let installed = monitor.has_extension(PG_STAT_STATEMENTS).await.unwrap();
    let outcome = monitor.outliers().await.unwrap();
    if installed {
        assert!(outcome.is_available());
    } else {
        assert_eq!(
            outcome,
            Availability::Unavailable {
                extension: PG_STAT_STATEMENTS
            }
        );
    }
}

#[tokio::test]
async fn test_operations_fail_after_close() {
    let Some(mut monitor) = fixture_monitor().await else {
        return;
    };

    monitor.records_rank().await.unwrap();
    monitor.close();
    assert!(monitor.is_closed());
    assert!(matches!(
        monitor.records_rank().await,
        Err(DbError::SessionClosed)
    ));
    assert!(matches!(
        monitor.connection_counts().await,
        Err(DbError::SessionClosed)
    ));
    assert!(matches!(monitor.outliers().await, Err(DbError::SessionClosed)));
}
