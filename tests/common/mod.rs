//! Shared fixtures for the integration tests

use pgmonitor::config::{ConnectionParameters, SslMode};
use pgmonitor::db::{Executor, Session};
use pgmonitor::monitor::Monitor;
use tokio::sync::OnceCell;

/// Scratch database the fixture tables live in
pub const FIXTURE_DB: &str = "pgmonitor_fixture";

static FIXTURE: OnceCell<bool> = OnceCell::const_new();

/// Parameters for the admin database named by the TEST_DB_* variables
pub fn admin_params() -> ConnectionParameters {
    let mut params = ConnectionParameters::new(
        std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
        std::env::var("TEST_DB_USER").unwrap_or_else(|_| "test_user".to_string()),
        std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "test_db".to_string()),
    );
    params.name = "integration-test".to_string();
    params.port = std::env::var("TEST_DB_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5433);
    params.password = Some(
        std::env::var("TEST_DB_PASSWORD").unwrap_or_else(|_| "test_password".to_string()),
    );
    params.ssl_mode = SslMode::Disable;
    params
}

/// Parameters for the scratch database
pub fn fixture_params() -> ConnectionParameters {
    let mut params = admin_params();
    params.dbname = FIXTURE_DB.to_string();
    params
}

/// Recreate the scratch database once per test binary: a single table `t`
/// with one row, an index on it, and fresh statistics.
///
/// Returns false when the server is unreachable or refuses the setup.
pub async fn fixture_ready() -> bool {
    *FIXTURE.get_or_init(build_fixture).await
}

async fn build_fixture() -> bool {
    let admin = admin_params();
    let (mut session, _) = match Session::connect(&admin).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!(
                "Skipping: database not available at {}:{} - {}",
                admin.host, admin.port, e
            );
            return false;
        }
    };

    for sql in [
        format!("DROP DATABASE IF EXISTS {}", FIXTURE_DB),
        format!("CREATE DATABASE {}", FIXTURE_DB),
    ] {
        if let Err(e) = session.execute(&sql).await {
            eprintln!("Skipping: could not prepare {} - {}", FIXTURE_DB, e);
            return false;
        }
    }
    session.close();

    let (mut session, _) = match Session::connect(&fixture_params()).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Skipping: could not open {} - {}", FIXTURE_DB, e);
            return false;
        }
    };
    let setup = "CREATE TABLE t (test_column integer);
                 INSERT INTO t VALUES (1);
                 CREATE INDEX test_column_idx ON t (test_column);
                 ANALYZE t;";
    let ok = match session.execute(setup).await {
        Ok(_) => true,
        Err(e) => {
            eprintln!("Skipping: fixture setup failed - {}", e);
            false
        }
    };
    session.close();
    ok
}

/// Open a monitor on the scratch database, or `None` to skip the test
pub async fn fixture_monitor() -> Option<Monitor> {
    if !fixture_ready().await {
        return None;
    }
    match Monitor::connect(&fixture_params()).await {
        Ok(monitor) => Some(monitor),
        Err(e) => {
            eprintln!("Skipping: {}", e);
            None
        }
    }
}
