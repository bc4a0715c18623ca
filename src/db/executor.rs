//! Statement executor trait
//!
//! The seam between diagnostic dispatch and a live connection. The
//! production implementation is [`crate::db::postgres::Session`]; tests
//! drive the dispatcher with scripted in-memory executors.

use crate::db::types::DiagnosticResult;
use crate::error::DbResult;

/// One sequential connection to a server
///
/// Implementations are not expected to support concurrent calls: a
/// statement and its result must complete before the next is submitted.
#[allow(async_fn_in_trait)]
pub trait Executor {
    /// Submit `sql` verbatim and collect every row as text
    ///
    /// # Errors
    /// Returns `DbError::QueryFailed` if the server rejects the statement
    /// Returns `DbError::SessionClosed` after `close()`
    async fn execute(&self, sql: &str) -> DbResult<DiagnosticResult>;

    /// Server version number (e.g. 160002) captured when the session connected
    ///
    /// # Errors
    /// Returns `DbError::SessionClosed` after `close()`
    fn server_version(&self) -> DbResult<i32>;

    /// Release the connection. Later calls fail with `DbError::SessionClosed`.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}
