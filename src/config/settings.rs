//! User settings and preferences
//!
//! Manages settings stored in ~/.pgmonitor/config.toml

use crate::config::ConnectionParameters;
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Output format used when `--format` is not given
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Tracing filter directive, overridden by PGMONITOR_LOG / RUST_LOG
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Profile used when neither `--url` nor `--profile` is given
    #[serde(default)]
    pub default_profile: Option<String>,
}

/// How diagnostic rows are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(ConfigError::Invalid(format!("Unknown output format: {}", other))),
        }
    }
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            log_filter: default_log_filter(),
            default_profile: None,
        }
    }
}

/// Load settings from config file
pub fn load_settings() -> ConfigResult<Settings> {
    let path = ConnectionParameters::config_dir()?.join("config.toml");
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(&path)?;
    let settings: Settings = toml::from_str(&content)?;
    Ok(settings)
}
