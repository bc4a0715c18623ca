//! Structured logging setup
//!
//! Diagnostics go to stdout, so logs go to stderr. The filter comes from
//! `PGMONITOR_LOG`, then `RUST_LOG`, then the configured default.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init_logging(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(default_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Build the environment filter (PGMONITOR_LOG > RUST_LOG > default)
fn build_env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_env("PGMONITOR_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter()))
}

pub fn default_log_filter() -> &'static str {
    "warn,tokio_postgres=warn,rustls=warn"
}
