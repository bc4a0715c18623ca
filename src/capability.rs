//! Capability resolution
//!
//! Facts about the target server that cannot change while a session is
//! open: its era and which extensions are installed. Each fact is probed
//! on first use and cached for the lifetime of the owning dispatcher.

use crate::db::Executor;
use crate::dialect::Era;
use crate::error::{DbError, DbResult};
use std::collections::HashMap;

/// Per-session cache of capability facts
///
/// Owned by exactly one dispatcher; never shared between sessions.
#[derive(Debug, Default)]
pub struct Capabilities {
    server_version: Option<i32>,
    era: Option<Era>,
    extensions: HashMap<String, bool>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Server version number, read from the session once
    pub fn server_version<E: Executor>(&mut self, session: &E) -> DbResult<i32> {
        if let Some(version) = self.server_version {
            return Ok(version);
        }
        let version = session.server_version()?;
        self.server_version = Some(version);
        Ok(version)
    }

    /// Era of the server behind `session`, resolved once
    pub fn era<E: Executor>(&mut self, session: &E) -> DbResult<Era> {
        if let Some(era) = self.era {
            return Ok(era);
        }
        let version = self.server_version(session)?;
        let era = Era::from_server_version(version);
        tracing::debug!(version, ?era, "Resolved server era");
        self.era = Some(era);
        Ok(era)
    }

    pub fn is_modern_era<E: Executor>(&mut self, session: &E) -> DbResult<bool> {
        Ok(self.era(session)?.is_modern())
    }

    /// Whether `name` is installed in the current database, probed once per name
    pub async fn has_extension<E: Executor>(&mut self, session: &E, name: &str) -> DbResult<bool> {
        if let Some(&present) = self.extensions.get(name) {
            tracing::trace!(extension = name, present, "Extension fact cached");
            return Ok(present);
        }

        let sql = format!(
            "SELECT count(*) AS count FROM pg_extension WHERE extname = {}",
            quote_literal(name)
        );
        let result = session.execute(&sql).await?;
        let count = result
            .first()
            .and_then(|row| row.get("count"))
            .ok_or_else(|| DbError::UnexpectedResult("extension probe returned no count".into()))?;
        let present = count == "1";

        tracing::debug!(extension = name, present, "Probed extension");
        self.extensions.insert(name.to_string(), present);
        Ok(present)
    }

    /// Forget every cached fact. Callers do this after a timeout or reconnect,
    /// when the facts may describe a different server.
    pub fn clear(&mut self) {
        self.server_version = None;
        self.era = None;
        self.extensions.clear();
    }
}

/// Render `value` as a SQL string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
