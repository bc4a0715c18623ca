//! Version-dependent SQL fragments
//!
//! `pg_stat_activity` renamed several columns in 9.2 and
//! `pg_stat_statements` renamed its timing columns in 13 and 17. Both
//! mappings here are pure functions of the server version; no I/O.

/// First server version with `pg_stat_activity.pid`, `.query` and `.state`
pub const MODERN_ERA_VERSION: i32 = 90200;

/// Server version band that decides which activity columns exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Era {
    /// 9.2 and later
    Modern,
    /// Before 9.2
    Legacy,
}

impl Era {
    pub fn from_server_version(version: i32) -> Self {
        if version >= MODERN_ERA_VERSION {
            Era::Modern
        } else {
            Era::Legacy
        }
    }

    pub fn is_modern(self) -> bool {
        self == Era::Modern
    }

    pub fn fragments(self) -> DialectFragments {
        match self {
            Era::Modern => DialectFragments {
                active_query_column: "query",
                process_id_column: "pid",
                state_column: "state",
            },
            Era::Legacy => DialectFragments {
                active_query_column: "current_query",
                process_id_column: "procpid",
                state_column: "current_query",
            },
        }
    }

    /// Value of the state column that marks an idle backend.
    ///
    /// Legacy servers have no state column; an idle backend shows the
    /// literal `<IDLE>` in place of its query text.
    pub fn idle_marker(self) -> &'static str {
        match self {
            Era::Modern => "idle",
            Era::Legacy => "<IDLE>",
        }
    }

    /// Predicate matching backends that are not idle
    pub fn busy_predicate(self) -> String {
        format!("{} <> '{}'", self.fragments().state_column, self.idle_marker())
    }
}

/// Column names in `pg_stat_activity` that differ between eras
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectFragments {
    pub active_query_column: &'static str,
    pub process_id_column: &'static str,
    pub state_column: &'static str,
}

/// Timing column names in `pg_stat_statements`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementColumns {
    pub total_time: &'static str,
    pub blk_read_time: &'static str,
    pub blk_write_time: &'static str,
}

impl StatementColumns {
    pub fn for_server_version(version: i32) -> Self {
        let total_time = if version >= 130000 {
            "total_exec_time"
        } else {
            "total_time"
        };
        let (blk_read_time, blk_write_time) = if version >= 170000 {
            ("shared_blk_read_time", "shared_blk_write_time")
        } else {
            ("blk_read_time", "blk_write_time")
        };
        Self {
            total_time,
            blk_read_time,
            blk_write_time,
        }
    }
}
