//! Runtime configuration resolved from environment variables.
//!
//! # Invariants
//! - `OPENAI_API_KEY` is required and non-blank.
//! - Temperature is within `0.0..=2.0`; timeout is at least one second.
//! - Relative paths are resolved against the supplied base directory, so
//!   `db_path` and `log_dir` are always absolute.

use crate::ai::chat::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::ai::GenerationSettings;
use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_MODEL: &str = "STYLEMIRROR_MODEL";
pub const ENV_TEMPERATURE: &str = "STYLEMIRROR_TEMPERATURE";
pub const ENV_TIMEOUT_SECS: &str = "STYLEMIRROR_TIMEOUT_SECS";
pub const ENV_DB_PATH: &str = "STYLEMIRROR_DB";
pub const ENV_LOG_LEVEL: &str = "STYLEMIRROR_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "STYLEMIRROR_LOG_DIR";

const DEFAULT_DB_FILE: &str = "style_mirror.db";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const MAX_TEMPERATURE: f32 = 2.0;

#[derive(Debug)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
    CurrentDir(std::io::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingVar(key) => write!(f, "environment variable {key} is not set"),
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
            Self::CurrentDir(err) => write!(f, "cannot resolve current directory: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CurrentDir(err) => Some(err),
            Self::MissingVar(_) | Self::InvalidValue { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_key: String,
    /// OpenAI-compatible API root, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub generation: GenerationSettings,
    pub request_timeout: Duration,
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl AppConfig {
    /// Reads the process environment, resolving paths against the cwd.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
        Self::from_lookup(|key| std::env::var(key).ok(), &cwd)
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        base_dir: &Path,
    ) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = read(ENV_API_KEY).ok_or(ConfigError::MissingVar(ENV_API_KEY))?;
        let base_url = read(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = read(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let temperature = match read(ENV_TEMPERATURE) {
            Some(value) => parse_temperature(&value)?,
            None => DEFAULT_TEMPERATURE,
        };

        let timeout_secs = match read(ENV_TIMEOUT_SECS) {
            Some(value) => parse_timeout_secs(&value)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let db_path = resolve_path(
            base_dir,
            read(ENV_DB_PATH).unwrap_or_else(|| DEFAULT_DB_FILE.to_string()),
        );
        let log_dir = resolve_path(
            base_dir,
            read(ENV_LOG_DIR).unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()),
        );
        let log_level = read(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string());

        Ok(Self {
            api_key,
            base_url,
            generation: GenerationSettings { model, temperature },
            request_timeout: Duration::from_secs(timeout_secs),
            db_path,
            log_level,
            log_dir,
        })
    }
}

fn parse_temperature(value: &str) -> Result<f32, ConfigError> {
    let invalid = |reason| ConfigError::InvalidValue {
        key: ENV_TEMPERATURE,
        value: value.to_string(),
        reason,
    };
    let parsed: f32 = value.parse().map_err(|_| invalid("not a number"))?;
    if !(0.0..=MAX_TEMPERATURE).contains(&parsed) {
        return Err(invalid("must be within 0.0..=2.0"));
    }
    Ok(parsed)
}

fn parse_timeout_secs(value: &str) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidValue {
            key: ENV_TIMEOUT_SECS,
            value: value.to_string(),
            reason: "must be a positive integer",
        }),
    }
}

fn resolve_path(base_dir: &Path, value: String) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}
