//! Diagnostic dispatcher
//!
//! [`Monitor`] is the public operation surface. Each operation picks its
//! template, fills in database name or era-dependent column names, and
//! sends the statement through the owned session. Operations that need
//! `pg_stat_statements` check for it first and return
//! [`Availability::Unavailable`] without sending anything when it is
//! missing.
//!
//! All operations take `&mut self`: one monitor drives one connection, one
//! statement at a time.

use crate::capability::{Capabilities, quote_literal};
use crate::catalog::{Diagnostic, PG_STAT_STATEMENTS};
use crate::config::ConnectionParameters;
use crate::db::{DiagnosticResult, Executor, Session};
use crate::dialect::{DialectFragments, Era, StatementColumns};
use crate::error::{DbError, DbResult};
use crate::notice::{NoticeSink, TracingNotices};
use crate::queries::{self, render};
use std::time::Duration;

/// Outcome of an extension-gated diagnostic
#[derive(Debug, Clone, PartialEq)]
pub enum Availability {
    /// The statement ran
    Available(DiagnosticResult),
    /// A required extension is not installed; nothing was sent
    Unavailable { extension: &'static str },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }

    pub fn as_result(&self) -> Option<&DiagnosticResult> {
        match self {
            Availability::Available(result) => Some(result),
            Availability::Unavailable { .. } => None,
        }
    }

    pub fn into_result(self) -> Option<DiagnosticResult> {
        match self {
            Availability::Available(result) => Some(result),
            Availability::Unavailable { .. } => None,
        }
    }
}

/// Runs diagnostics against one server
pub struct Monitor<E: Executor = Session, N: NoticeSink = TracingNotices> {
    session: E,
    capabilities: Capabilities,
    notices: N,
    dbname: String,
    long_query_threshold: Duration,
}

impl Monitor<Session, TracingNotices> {
    /// Open a session described by `params`.
    ///
    /// # Errors
    /// Returns `DbError::ConnectionFailed` if the handshake fails
    pub async fn connect(params: &ConnectionParameters) -> DbResult<Self> {
        let (session, mut conn_err_rx) = Session::connect(params).await?;
        tokio::spawn(async move {
            if let Some(msg) = conn_err_rx.recv().await {
                tracing::warn!("{}", msg);
            }
        });
        Ok(Monitor::new(
            session,
            params.dbname.clone(),
            params.long_query_threshold,
        ))
    }
}

impl<E: Executor> Monitor<E, TracingNotices> {
    pub fn new(session: E, dbname: impl Into<String>, long_query_threshold: Duration) -> Self {
        Self {
            session,
            capabilities: Capabilities::new(),
            notices: TracingNotices,
            dbname: dbname.into(),
            long_query_threshold,
        }
    }
}

impl<E: Executor, N: NoticeSink> Monitor<E, N> {
    /// Replace the sink that receives deprecation notices
    pub fn with_notices<M: NoticeSink>(self, notices: M) -> Monitor<E, M> {
        Monitor {
            session: self.session,
            capabilities: self.capabilities,
            notices,
            dbname: self.dbname,
            long_query_threshold: self.long_query_threshold,
        }
    }

    pub fn session(&self) -> &E {
        &self.session
    }

    pub fn dbname(&self) -> &str {
        &self.dbname
    }

    /// Close the session and drop every cached capability fact
    pub fn close(&mut self) {
        self.session.close();
        self.capabilities.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    pub fn is_modern_era(&mut self) -> DbResult<bool> {
        Ok(self.era()?.is_modern())
    }

    /// Whether `name` is installed; probed once, then served from the cache
    pub async fn has_extension(&mut self, name: &str) -> DbResult<bool> {
        self.extension_available(name).await
    }

    /// Column names to use against this server's `pg_stat_activity`
    pub fn fragments(&mut self) -> DbResult<DialectFragments> {
        Ok(self.era()?.fragments())
    }

    fn era(&mut self) -> DbResult<Era> {
        self.ensure_open()?;
        self.capabilities.era(&self.session)
    }

    fn ensure_open(&self) -> DbResult<()> {
        if self.session.is_closed() {
            return Err(DbError::SessionClosed);
        }
        Ok(())
    }

    async fn execute(&self, diagnostic: Diagnostic, sql: &str) -> DbResult<DiagnosticResult> {
        let result = self.session.execute(sql).await?;
        tracing::debug!(
            diagnostic = diagnostic.name(),
            rows = result.row_count(),
            elapsed_ms = result.execution_time.as_millis() as u64,
            "Diagnostic completed"
        );
        Ok(result)
    }

    async fn unconditional(&self, diagnostic: Diagnostic, sql: &str) -> DbResult<DiagnosticResult> {
        self.execute(diagnostic, sql).await
    }

    /// Whether a gated diagnostic may run. Checks the session first so a
    /// cached fact never hides a closed session.
    async fn extension_available(&mut self, extension: &str) -> DbResult<bool> {
        self.ensure_open()?;
        self.capabilities
            .has_extension(&self.session, extension)
            .await
    }

    fn unavailable(diagnostic: Diagnostic, extension: &'static str) -> Availability {
        tracing::info!(
            diagnostic = diagnostic.name(),
            extension,
            "Diagnostic unavailable: extension not installed"
        );
        Availability::Unavailable { extension }
    }

    async fn statement_report(
        &mut self,
        diagnostic: Diagnostic,
        template: &str,
    ) -> DbResult<Availability> {
        if !self.extension_available(PG_STAT_STATEMENTS).await? {
            return Ok(Self::unavailable(diagnostic, PG_STAT_STATEMENTS));
        }
        let version = self.capabilities.server_version(&self.session)?;
        let cols = StatementColumns::for_server_version(version);
        let sql = render(
            template,
            &[
                ("total_time", cols.total_time),
                ("blk_read_time", cols.blk_read_time),
                ("blk_write_time", cols.blk_write_time),
            ],
        );
        Ok(Availability::Available(self.execute(diagnostic, &sql).await?))
    }

    /// Run any diagnostic by catalog entry
    pub async fn run(&mut self, diagnostic: Diagnostic) -> DbResult<Availability> {
        let result = match diagnostic {
            Diagnostic::Version => self.database_version().await?,
            Diagnostic::DatabaseStats => self.database_stats().await?,
            Diagnostic::Bgwriter => self.bgwriter_stats().await?,
            Diagnostic::IndexCount => self.index_count().await?,
            Diagnostic::IndexSizeRaw => self.index_size_raw().await?,
            Diagnostic::SeqScans => self.seq_scans().await?,
            Diagnostic::RecordsRank => self.records_rank().await?,
            Diagnostic::Databases => self.list_databases().await?,
            Diagnostic::DatabaseSizes => self.database_sizes().await?,
            Diagnostic::CacheHit => self.cache_hit().await?,
            Diagnostic::Bloat => self.database_bloat().await?,
            Diagnostic::VacuumStats => self.vacuum_stats().await?,
            Diagnostic::IndexUsage => self.index_usage().await?,
            Diagnostic::TotalIndexSize => self.total_index_size().await?,
            Diagnostic::IndexSize => self.index_size().await?,
            Diagnostic::UnusedIndexes => self.unused_indexes().await?,
            Diagnostic::TableSize => self.table_size().await?,
            Diagnostic::TableIndexesSize => self.table_indexes_size().await?,
            Diagnostic::TotalTableSize => self.total_table_size().await?,
            Diagnostic::ConnectionCounts => self.connection_counts().await?,
            Diagnostic::ActiveConnections => self.active_connections().await?,
            Diagnostic::Blocking => self.blocking().await?,
            Diagnostic::Locks => self.locks().await?,
            Diagnostic::LongRunningQueries => self.long_running_queries().await?,
            Diagnostic::BackendQuery => self.backend_query().await?,
            Diagnostic::ResetStatementStats => return self.reset_statement_stats().await,
            Diagnostic::Outliers => return self.outliers().await,
            Diagnostic::Calls => return self.calls().await,
        };
        Ok(Availability::Available(result))
    }

    // Unconditional diagnostics

    pub async fn database_version(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::Version, queries::VERSION).await
    }

    /// `pg_stat_database` row for the configured database
    pub async fn database_stats(&mut self) -> DbResult<DiagnosticResult> {
        let dbname = quote_literal(&self.dbname);
        let sql = render(queries::DATABASE_STATS, &[("dbname", dbname.as_str())]);
        self.unconditional(Diagnostic::DatabaseStats, &sql).await
    }

    pub async fn bgwriter_stats(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::Bgwriter, queries::BGWRITER).await
    }

    pub async fn index_count(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::IndexCount, queries::INDEX_COUNT).await
    }

    pub async fn index_size_raw(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::IndexSizeRaw, queries::INDEX_SIZE_RAW)
            .await
    }

    pub async fn seq_scans(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::SeqScans, queries::SEQ_SCANS).await
    }

    /// Tables by estimated live row count, largest first
    pub async fn records_rank(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::RecordsRank, queries::RECORDS_RANK)
            .await
    }

    pub async fn list_databases(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::Databases, queries::LIST_DATABASES)
            .await
    }

    pub async fn database_sizes(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::DatabaseSizes, queries::DATABASE_SIZES)
            .await
    }

    /// Index and table hit rates; healthy databases sit at 0.99 and up
    pub async fn cache_hit(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::CacheHit, queries::CACHE_HIT).await
    }

    pub async fn database_bloat(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::Bloat, queries::DATABASE_BLOAT).await
    }

    pub async fn vacuum_stats(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::VacuumStats, queries::VACUUM_STATS)
            .await
    }

    pub async fn index_usage(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::IndexUsage, queries::INDEX_USAGE).await
    }

    pub async fn total_index_size(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::TotalIndexSize, queries::TOTAL_INDEX_SIZE)
            .await
    }

    pub async fn index_size(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::IndexSize, queries::INDEX_SIZE).await
    }

    /// Non-unique indexes with fewer than 50 scans on tables over 5 pages
    pub async fn unused_indexes(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::UnusedIndexes, queries::UNUSED_INDEXES)
            .await
    }

    pub async fn table_size(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::TableSize, queries::TABLE_SIZE).await
    }

    pub async fn table_indexes_size(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::TableIndexesSize, queries::TABLE_INDEXES_SIZE)
            .await
    }

    pub async fn total_table_size(&mut self) -> DbResult<DiagnosticResult> {
        self.unconditional(Diagnostic::TotalTableSize, queries::TOTAL_TABLE_SIZE)
            .await
    }

    // Dialect-sensitive diagnostics

    /// Connection count per state. On legacy servers the grouping key is
    /// the query text, so idle backends collapse into one `<IDLE>` row.
    pub async fn connection_counts(&mut self) -> DbResult<DiagnosticResult> {
        let f = self.fragments()?;
        let sql = render(queries::CONNECTION_COUNTS, &[("state_column", f.state_column)]);
        self.execute(Diagnostic::ConnectionCounts, &sql).await
    }

    /// Number of non-idle sessions other than this one
    pub async fn active_connections(&mut self) -> DbResult<DiagnosticResult> {
        let era = self.era()?;
        let f = era.fragments();
        let busy = era.busy_predicate();
        let sql = render(
            queries::ACTIVE_CONNECTIONS,
            &[
                ("busy_predicate", busy.as_str()),
                ("pid_column", f.process_id_column),
            ],
        );
        self.execute(Diagnostic::ActiveConnections, &sql).await
    }

    pub async fn blocking(&mut self) -> DbResult<DiagnosticResult> {
        let f = self.fragments()?;
        let sql = render(
            queries::BLOCKING,
            &[
                ("query_column", f.active_query_column),
                ("pid_column", f.process_id_column),
            ],
        );
        self.execute(Diagnostic::Blocking, &sql).await
    }

    pub async fn locks(&mut self) -> DbResult<DiagnosticResult> {
        let f = self.fragments()?;
        let sql = render(
            queries::LOCKS,
            &[
                ("query_column", f.active_query_column),
                ("pid_column", f.process_id_column),
            ],
        );
        self.execute(Diagnostic::Locks, &sql).await
    }

    /// Non-idle queries running longer than the configured threshold
    pub async fn long_running_queries(&mut self) -> DbResult<DiagnosticResult> {
        let era = self.era()?;
        let f = era.fragments();
        let busy = era.busy_predicate();
        let threshold = format!("{} milliseconds", self.long_query_threshold.as_millis());
        let sql = render(
            queries::LONG_RUNNING_QUERIES,
            &[
                ("query_column", f.active_query_column),
                ("pid_column", f.process_id_column),
                ("busy_predicate", busy.as_str()),
                ("threshold", threshold.as_str()),
            ],
        );
        self.execute(Diagnostic::LongRunningQueries, &sql).await
    }

    /// Deprecated: use [`Monitor::connection_counts`]
    pub async fn backend_query(&mut self) -> DbResult<DiagnosticResult> {
        self.notices.deprecated("backend_query", "connection_counts");
        self.connection_counts().await
    }

    // pg_stat_statements diagnostics

    pub async fn reset_statement_stats(&mut self) -> DbResult<Availability> {
        if !self.extension_available(PG_STAT_STATEMENTS).await? {
            return Ok(Self::unavailable(
                Diagnostic::ResetStatementStats,
                PG_STAT_STATEMENTS,
            ));
        }
        let result = self
            .execute(Diagnostic::ResetStatementStats, queries::RESET_STATEMENT_STATS)
            .await?;
        Ok(Availability::Available(result))
    }

    /// Ten statements with the longest total execution time
    pub async fn outliers(&mut self) -> DbResult<Availability> {
        self.statement_report(Diagnostic::Outliers, queries::OUTLIERS)
            .await
    }

    /// Ten most frequently called statements
    pub async fn calls(&mut self) -> DbResult<Availability> {
        self.statement_report(Diagnostic::Calls, queries::CALLS).await
    }
}
