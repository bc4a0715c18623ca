//! Diagnostic catalog
//!
//! Every diagnostic the monitor can run, addressable by a stable
//! kebab-case name.

use crate::error::MonitorError;
use std::fmt;

/// How a diagnostic decides what to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Fixed text, optionally with the database name substituted
    Unconditional,
    /// Column names depend on the server era
    DialectSensitive,
    /// Runs only when the named extension is installed
    ExtensionGated(&'static str),
    /// Alias kept for compatibility; logs a notice and delegates
    Deprecated(Diagnostic),
}

/// Extension required by the statement-statistics reports
pub const PG_STAT_STATEMENTS: &str = "pg_stat_statements";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Diagnostic {
    Version,
    DatabaseStats,
    Bgwriter,
    IndexCount,
    IndexSizeRaw,
    SeqScans,
    RecordsRank,
    Databases,
    DatabaseSizes,
    CacheHit,
    Bloat,
    VacuumStats,
    IndexUsage,
    TotalIndexSize,
    IndexSize,
    UnusedIndexes,
    TableSize,
    TableIndexesSize,
    TotalTableSize,
    ConnectionCounts,
    ActiveConnections,
    Blocking,
    Locks,
    LongRunningQueries,
    BackendQuery,
    ResetStatementStats,
    Outliers,
    Calls,
}

impl Diagnostic {
    pub const ALL: [Diagnostic; 28] = [
        Diagnostic::Version,
        Diagnostic::DatabaseStats,
        Diagnostic::Bgwriter,
        Diagnostic::IndexCount,
        Diagnostic::IndexSizeRaw,
        Diagnostic::SeqScans,
        Diagnostic::RecordsRank,
        Diagnostic::Databases,
        Diagnostic::DatabaseSizes,
        Diagnostic::CacheHit,
        Diagnostic::Bloat,
        Diagnostic::VacuumStats,
        Diagnostic::IndexUsage,
        Diagnostic::TotalIndexSize,
        Diagnostic::IndexSize,
        Diagnostic::UnusedIndexes,
        Diagnostic::TableSize,
        Diagnostic::TableIndexesSize,
        Diagnostic::TotalTableSize,
        Diagnostic::ConnectionCounts,
        Diagnostic::ActiveConnections,
        Diagnostic::Blocking,
        Diagnostic::Locks,
        Diagnostic::LongRunningQueries,
        Diagnostic::BackendQuery,
        Diagnostic::ResetStatementStats,
        Diagnostic::Outliers,
        Diagnostic::Calls,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Diagnostic::Version => "version",
            Diagnostic::DatabaseStats => "database-stats",
            Diagnostic::Bgwriter => "bgwriter",
            Diagnostic::IndexCount => "index-count",
            Diagnostic::IndexSizeRaw => "index-size-raw",
            Diagnostic::SeqScans => "seq-scans",
            Diagnostic::RecordsRank => "records-rank",
            Diagnostic::Databases => "databases",
            Diagnostic::DatabaseSizes => "database-sizes",
            Diagnostic::CacheHit => "cache-hit",
            Diagnostic::Bloat => "bloat",
            Diagnostic::VacuumStats => "vacuum-stats",
            Diagnostic::IndexUsage => "index-usage",
            Diagnostic::TotalIndexSize => "total-index-size",
            Diagnostic::IndexSize => "index-size",
            Diagnostic::UnusedIndexes => "unused-indexes",
            Diagnostic::TableSize => "table-size",
            Diagnostic::TableIndexesSize => "table-indexes-size",
            Diagnostic::TotalTableSize => "total-table-size",
            Diagnostic::ConnectionCounts => "connection-counts",
            Diagnostic::ActiveConnections => "active-connections",
            Diagnostic::Blocking => "blocking",
            Diagnostic::Locks => "locks",
            Diagnostic::LongRunningQueries => "long-running-queries",
            Diagnostic::BackendQuery => "backend-query",
            Diagnostic::ResetStatementStats => "reset-statement-stats",
            Diagnostic::Outliers => "outliers",
            Diagnostic::Calls => "calls",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Diagnostic::Version => "Server version string",
            Diagnostic::DatabaseStats => "Transaction and row activity for the target database",
            Diagnostic::Bgwriter => "Scheduled and requested checkpoints",
            Diagnostic::IndexCount => "Number of indexes",
            Diagnostic::IndexSizeRaw => "Size of all indexes in bytes",
            Diagnostic::SeqScans => "Sequential scans per table",
            Diagnostic::RecordsRank => "Estimated row count per table",
            Diagnostic::Databases => "Non-template databases",
            Diagnostic::DatabaseSizes => "Size of each database",
            Diagnostic::CacheHit => "Index and table cache hit ratios",
            Diagnostic::Bloat => "Table and index bloat, most wasteful first",
            Diagnostic::VacuumStats => "Dead rows and whether autovacuum should trigger",
            Diagnostic::IndexUsage => "How often each table is read through an index",
            Diagnostic::TotalIndexSize => "Total size of all indexes",
            Diagnostic::IndexSize => "Size of each index",
            Diagnostic::UnusedIndexes => "Unused and almost unused indexes",
            Diagnostic::TableSize => "Table sizes excluding indexes",
            Diagnostic::TableIndexesSize => "Total index size per table",
            Diagnostic::TotalTableSize => "Table sizes including indexes",
            Diagnostic::ConnectionCounts => "Connections grouped by state",
            Diagnostic::ActiveConnections => "Number of non-idle sessions",
            Diagnostic::Blocking => "Queries holding locks others are waiting on",
            Diagnostic::Locks => "Queries holding exclusive locks",
            Diagnostic::LongRunningQueries => "Queries running longer than the threshold",
            Diagnostic::BackendQuery => "Deprecated alias of connection-counts",
            Diagnostic::ResetStatementStats => "Reset pg_stat_statements counters",
            Diagnostic::Outliers => "Ten queries with the longest total execution time",
            Diagnostic::Calls => "Ten most frequently called queries",
        }
    }

    pub fn kind(self) -> DiagnosticKind {
        match self {
            Diagnostic::ConnectionCounts
            | Diagnostic::ActiveConnections
            | Diagnostic::Blocking
            | Diagnostic::Locks
            | Diagnostic::LongRunningQueries => DiagnosticKind::DialectSensitive,
            Diagnostic::BackendQuery => DiagnosticKind::Deprecated(Diagnostic::ConnectionCounts),
            Diagnostic::ResetStatementStats | Diagnostic::Outliers | Diagnostic::Calls => {
                DiagnosticKind::ExtensionGated(PG_STAT_STATEMENTS)
            }
            _ => DiagnosticKind::Unconditional,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Diagnostic {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Diagnostic::ALL
            .into_iter()
            .find(|d| d.name() == wanted)
            .ok_or_else(|| MonitorError::UnknownDiagnostic(s.to_string()))
    }
}
