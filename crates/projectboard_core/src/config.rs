//! Runtime configuration for hosts embedding the article store.
//!
//! # Responsibility
//! - Resolve database location and logging options from the environment.
//! - Reject malformed values instead of silently falling back.
//!
//! # Invariants
//! - Missing optional keys fall back to documented defaults.
//! - Logging stays disabled when no log directory is configured.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "PROJECTBOARD_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "PROJECTBOARD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PROJECTBOARD_LOG_DIR";
pub const ENV_LOG_MAX_FILE_BYTES: &str = "PROJECTBOARD_LOG_MAX_FILE_BYTES";
pub const ENV_LOG_MAX_FILES: &str = "PROJECTBOARD_LOG_MAX_FILES";

const DEFAULT_DB_FILE_NAME: &str = "projectboard.sqlite3";
const DEFAULT_LOG_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_LOG_MAX_FILES: usize = 5;

/// Configuration value that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {}

/// File logging options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rolling log files. `None` disables logging.
    pub dir: Option<PathBuf>,
    pub max_file_size_bytes: u64,
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
            max_file_size_bytes: DEFAULT_LOG_MAX_FILE_BYTES,
            max_files: DEFAULT_LOG_MAX_FILES,
        }
    }
}

/// Top-level configuration for the core crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log: LogConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log: LogConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let db_path = get(ENV_DB_PATH).map_or(defaults.db_path, PathBuf::from);
        let level = get(ENV_LOG_LEVEL).unwrap_or(defaults.log.level);
        let dir = get(ENV_LOG_DIR).map(PathBuf::from);
        let max_file_size_bytes = match get(ENV_LOG_MAX_FILE_BYTES) {
            Some(raw) => parse_positive(ENV_LOG_MAX_FILE_BYTES, &raw)?,
            None => defaults.log.max_file_size_bytes,
        };
        let max_files = match get(ENV_LOG_MAX_FILES) {
            Some(raw) => parse_positive(ENV_LOG_MAX_FILES, &raw)?,
            None => defaults.log.max_files,
        };

        Ok(Self {
            db_path,
            log: LogConfig {
                level,
                dir,
                max_file_size_bytes,
                max_files,
            },
        })
    }
}

fn parse_positive<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match raw.parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        }),
    }
}
