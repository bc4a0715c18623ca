//! In-memory executor for unit tests
//!
//! Records every statement it receives and answers from a script keyed on
//! statement fragments. Extension probes are answered from the configured
//! extension list.

use crate::db::{DiagnosticResult, Executor};
use crate::error::{DbError, DbResult};
use std::cell::{Cell, RefCell};
use std::time::Duration;

pub struct ScriptedSession {
    version: i32,
    extensions: Vec<String>,
    responses: Vec<(String, DiagnosticResult)>,
    failures: Vec<String>,
    statements: RefCell<Vec<String>>,
    version_reads: Cell<usize>,
    closed: bool,
}

impl ScriptedSession {
    pub fn new(version: i32) -> Self {
        Self {
            version,
            extensions: Vec::new(),
            responses: Vec::new(),
            failures: Vec::new(),
            statements: RefCell::new(Vec::new()),
            version_reads: Cell::new(0),
            closed: false,
        }
    }

    pub fn with_extension(mut self, name: &str) -> Self {
        self.extensions.push(name.to_string());
        self
    }

    /// Answer statements containing `fragment` with `result`
    pub fn with_response(mut self, fragment: &str, result: DiagnosticResult) -> Self {
        self.responses.push((fragment.to_string(), result));
        self
    }

    /// Reject statements containing `fragment`
    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.failures.push(fragment.to_string());
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    pub fn statement_count(&self) -> usize {
        self.statements.borrow().len()
    }

    /// Statements other than extension probes
    pub fn diagnostic_statements(&self) -> Vec<String> {
        self.statements
            .borrow()
            .iter()
            .filter(|s| !s.contains("FROM pg_extension"))
            .cloned()
            .collect()
    }

    pub fn version_reads(&self) -> usize {
        self.version_reads.get()
    }
}

/// Build a result from string literals; `""` stays an empty string, not NULL
pub fn rows(columns: &[&str], values: &[&[&str]]) -> DiagnosticResult {
    DiagnosticResult::new(
        columns.iter().map(|c| c.to_string()).collect(),
        values
            .iter()
            .map(|row| row.iter().map(|v| Some(v.to_string())).collect())
            .collect(),
        Duration::ZERO,
    )
}

impl Executor for ScriptedSession {
    async fn execute(&self, sql: &str) -> DbResult<DiagnosticResult> {
        if self.closed {
            return Err(DbError::SessionClosed);
        }
        self.statements.borrow_mut().push(sql.to_string());

        if let Some(fragment) = self.failures.iter().find(|f| sql.contains(f.as_str())) {
            return Err(DbError::QueryFailed {
                message: format!("rejected: {}", fragment),
                sqlstate: Some("42501".to_string()),
            });
        }

        if sql.contains("FROM pg_extension") {
            let present = self
                .extensions
                .iter()
                .any(|name| sql.contains(&format!("extname = '{}'", name)));
            return Ok(rows(&["count"], &[&[if present { "1" } else { "0" }]]));
        }

        Ok(self
            .responses
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_else(|| DiagnosticResult::empty(Duration::ZERO)))
    }

    fn server_version(&self) -> DbResult<i32> {
        if self.closed {
            return Err(DbError::SessionClosed);
        }
        self.version_reads.set(self.version_reads.get() + 1);
        Ok(self.version)
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
