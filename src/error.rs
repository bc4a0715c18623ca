//! Error types for pgmonitor
//!
//! This module defines the error hierarchy used throughout the crate.
//! We use `thiserror` for library-style errors with clear error chains.
//!
//! A missing extension is deliberately *not* an error: gated diagnostics
//! return [`crate::monitor::Availability::Unavailable`] instead.

use std::io;

/// Main error type for the pgmonitor crate
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Unknown diagnostic name
    #[error("Unknown diagnostic: {0}")]
    UnknownDiagnostic(String),
}

/// Session and query errors
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Network, TLS or authentication handshake failed. Not retried.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The server rejected a statement. `sqlstate` is the five-character
    /// error code when the rejection came from the server itself.
    #[error("Query execution failed: {message}")]
    QueryFailed {
        message: String,
        sqlstate: Option<String>,
    },

    /// The session was used after `close()`
    #[error("Session is closed")]
    SessionClosed,

    /// The server answered with something we could not interpret
    #[error("Unexpected result: {0}")]
    UnexpectedResult(String),
}

/// Configuration loading/parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Home directory not found
    #[error("Could not determine home directory")]
    NoHomeDir,

    /// Config file not found or unreadable
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Connection profile not found
    #[error("Connection profile '{0}' not found")]
    ProfileNotFound(String),
}

impl DbError {
    /// SQLSTATE of a server-side rejection, e.g. `42P01` for a missing relation
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            DbError::QueryFailed { sqlstate, .. } => sqlstate.as_deref(),
            _ => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::NotFound(e.to_string())
    }
}

/// Specialized Result type for pgmonitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Specialized Result type for database operations
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Specialized Result type for config operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
