//! Configuration management
//!
//! Handles connection parameters, connection profiles and user settings.

pub mod connections;
pub mod settings;

pub use connections::{ConnectionParameters, SslMode, find_connection, parse_threshold};
pub use settings::{OutputFormat, Settings, load_settings};
