//! Runtime configuration.
//!
//! Defaults can be overridden from the environment (or a `.env` file loaded
//! by the CLI), and command-line flags override both.
//!
//! | Variable                 | Default            |
//! |--------------------------|--------------------|
//! | `FOOTFALL_DELIMITER`     | `,`                |
//! | `FOOTFALL_REDUCED_FILE`  | `customers.csv`    |
//! | `FOOTFALL_SUMMARY_FILE`  | `timePlotData.csv` |
//! | `FOOTFALL_AVERAGES_FILE` | `avgPlotData.csv`  |
//! | `FOOTFALL_QUIET`         | `false`            |

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Input field delimiter.
pub const DEFAULT_DELIMITER: char = ',';

/// Reduced, deduplicated visit table.
pub const DEFAULT_REDUCED_FILE: &str = "customers.csv";

/// Run summary table.
pub const DEFAULT_SUMMARY_FILE: &str = "timePlotData.csv";

/// Global averages table.
pub const DEFAULT_AVERAGES_FILE: &str = "avgPlotData.csv";

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: &'static str, message: String },
}

/// Settings resolved before a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub delimiter: char,
    pub reduced_file: PathBuf,
    pub summary_file: PathBuf,
    pub averages_file: PathBuf,
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            reduced_file: PathBuf::from(DEFAULT_REDUCED_FILE),
            summary_file: PathBuf::from(DEFAULT_SUMMARY_FILE),
            averages_file: PathBuf::from(DEFAULT_AVERAGES_FILE),
            quiet: false,
        }
    }
}

impl Config {
    /// Read settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("FOOTFALL_DELIMITER") {
            config.delimiter = parse_delimiter(&value).map_err(|message| {
                ConfigError::InvalidValue {
                    var: "FOOTFALL_DELIMITER",
                    message,
                }
            })?;
        }
        if let Some(value) = lookup("FOOTFALL_REDUCED_FILE") {
            config.reduced_file = PathBuf::from(value);
        }
        if let Some(value) = lookup("FOOTFALL_SUMMARY_FILE") {
            config.summary_file = PathBuf::from(value);
        }
        if let Some(value) = lookup("FOOTFALL_AVERAGES_FILE") {
            config.averages_file = PathBuf::from(value);
        }
        if let Some(value) = lookup("FOOTFALL_QUIET") {
            config.quiet = parse_bool(&value).ok_or_else(|| ConfigError::InvalidValue {
                var: "FOOTFALL_QUIET",
                message: format!("expected true/false, got '{}'", value),
            })?;
        }

        Ok(config)
    }
}

/// A single ASCII character, or `\t` / `tab`.
pub fn parse_delimiter(value: &str) -> Result<char, String> {
    match value {
        "\\t" | "tab" | "TAB" => return Ok('\t'),
        _ => {}
    }

    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && c != '\n' && c != '\r' => Ok(c),
        _ => Err(format!("expected a single ASCII character, got '{}'", value)),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
