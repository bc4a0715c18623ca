//! Database session layer
//!
//! This module provides a trait-based abstraction over statement execution,
//! so the dispatcher can be driven by a live session or by test doubles.

pub mod executor;
pub mod postgres;
pub mod types;

// Re-export main types
pub use executor::Executor;
pub use postgres::Session;
pub use types::{DiagnosticResult, Row};
