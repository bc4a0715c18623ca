//! PostgreSQL session
//!
//! Concrete executor using tokio-postgres. Statements go through the
//! simple query protocol so every value comes back in the server's own
//! text representation.

use crate::config::{ConnectionParameters, SslMode};
use crate::db::Executor;
use crate::db::types::DiagnosticResult;
use crate::error::{DbError, DbResult};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_postgres::{Client, SimpleQueryMessage};

/// One live connection to a target server
pub struct Session {
    /// The tokio-postgres client; `None` once closed
    client: Option<Client>,
    /// `server_version_num` read right after the handshake
    server_version: i32,
}

impl Session {
    /// Connect to a PostgreSQL server.
    ///
    /// Returns the session and a receiver that fires if the background
    /// connection is lost (e.g. server restart, idle timeout).
    pub async fn connect(
        params: &ConnectionParameters,
    ) -> DbResult<(Self, mpsc::UnboundedReceiver<String>)> {
        let conn_string = params.connection_string_with_password();
        let (conn_err_tx, conn_err_rx) = mpsc::unbounded_channel();

        let client = match params.ssl_mode {
            SslMode::Disable => {
                let (client, connection) =
                    tokio_postgres::connect(&conn_string, tokio_postgres::NoTls)
                        .await
                        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        let _ = conn_err_tx.send(format!("Connection lost: {}", e));
                    }
                });
                client
            }
            SslMode::Prefer | SslMode::Require => {
                let tls = tokio_postgres_rustls::MakeRustlsConnect::new(make_tls_config());
                let (client, connection) = tokio_postgres::connect(&conn_string, tls)
                    .await
                    .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        let _ = conn_err_tx.send(format!("Connection lost: {}", e));
                    }
                });
                client
            }
        };

        let server_version = fetch_server_version(&client).await?;
        tracing::info!(
            host = %params.host,
            port = params.port,
            dbname = %params.dbname,
            server_version,
            "Session connected"
        );

        Ok((
            Self {
                client: Some(client),
                server_version,
            },
            conn_err_rx,
        ))
    }

    fn client(&self) -> DbResult<&Client> {
        self.client.as_ref().ok_or(DbError::SessionClosed)
    }
}

impl Executor for Session {
    async fn execute(&self, sql: &str) -> DbResult<DiagnosticResult> {
        let client = self.client()?;
        let start = Instant::now();

        let messages = client
            .simple_query(sql)
            .await
            .map_err(query_failed)?;

        let result = collect_rows(messages, start);
        tracing::debug!(
            rows = result.row_count(),
            elapsed_ms = result.execution_time.as_millis() as u64,
            "Statement completed"
        );
        Ok(result)
    }

    fn server_version(&self) -> DbResult<i32> {
        self.client()?;
        Ok(self.server_version)
    }

    fn close(&mut self) {
        if self.client.take().is_some() {
            tracing::info!("Session closed");
        }
    }

    fn is_closed(&self) -> bool {
        self.client.is_none()
    }
}

/// Server rejections carry their SQLSTATE; client-side failures have none.
fn query_failed(e: tokio_postgres::Error) -> DbError {
    let sqlstate = e.code().map(|code| code.code().to_string());
    let message = match e.as_db_error() {
        Some(db) => db.message().to_string(),
        None => e.to_string(),
    };
    DbError::QueryFailed { message, sqlstate }
}

async fn fetch_server_version(client: &Client) -> DbResult<i32> {
    let messages = client
        .simple_query("SHOW server_version_num")
        .await
        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

    let raw = messages
        .iter()
        .find_map(|m| match m {
            SimpleQueryMessage::Row(row) => row.get(0).map(str::to_string),
            _ => None,
        })
        .ok_or_else(|| DbError::UnexpectedResult("server_version_num returned no rows".into()))?;

    parse_server_version(&raw)
}

fn parse_server_version(raw: &str) -> DbResult<i32> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| DbError::UnexpectedResult(format!("Invalid server_version_num: {}", raw)))
}

/// Fold simple-query messages into one result. Column names come from the
/// row description, so a statement with zero rows still reports its columns.
/// With several statements in one string the last row set wins.
fn collect_rows(messages: Vec<SimpleQueryMessage>, start: Instant) -> DiagnosticResult {
    let mut columns: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(cols) => {
                columns = cols.iter().map(|c| c.name().to_string()).collect();
                rows.clear();
            }
            SimpleQueryMessage::Row(row) => {
                if columns.is_empty() {
                    columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                }
                rows.push((0..row.len()).map(|i| row.get(i).map(str::to_string)).collect());
            }
            _ => {}
        }
    }

    DiagnosticResult::new(columns, rows, start.elapsed())
}

/// Build a rustls ClientConfig that trusts OS certificates (with Mozilla roots as fallback)
fn make_tls_config() -> rustls::ClientConfig {
    let mut root_store = rustls::RootCertStore::empty();

    let native_certs = rustls_native_certs::load_native_certs();
    let mut loaded = 0;
    for cert in native_certs.certs {
        if root_store.add(cert).is_ok() {
            loaded += 1;
        }
    }
    if loaded == 0 {
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }

    rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}
