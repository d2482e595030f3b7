//! Precedence resolution for settings.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. Environment variables
//! 2. config.kdl (`$SALESIQ_CONFIG`, or `~/.config/salesiq/config.kdl`)
//! 3. Built-in defaults
//!
//! The API key is only ever read from the environment.

use crate::config::SalesIqConfig;
use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable holding the campaign database path.
pub const DB_PATH_ENV: &str = "SALESIQ_DB_PATH";

/// Environment variable overriding the Gemini model.
pub const MODEL_ENV: &str = "GEMINI_MODEL";

/// Environment variable overriding the request timeout in seconds.
pub const TIMEOUT_ENV: &str = "SALESIQ_TIMEOUT_SECS";

/// Environment variable pointing at an explicit config.kdl.
pub const CONFIG_PATH_ENV: &str = "SALESIQ_CONFIG";

pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_QUERIES: usize = 5;

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from a config.kdl file
    ConfigFile(PathBuf),
    /// Built-in default value
    Default,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile(path) => write!(f, "file:{}", path.display()),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// A required setting that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSetting {
    /// Environment variable that would provide it
    pub name: &'static str,
    /// What the setting is for
    pub description: &'static str,
}

impl fmt::Display for MissingSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.description)
    }
}

/// Settings for one process, built once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Gemini API key (always from the environment)
    pub api_key: String,
    /// Campaign database path
    pub database: Resolved<PathBuf>,
    /// Gemini model name
    pub model: Resolved<String>,
    /// Generative request timeout in seconds
    pub timeout_secs: Resolved<u64>,
    /// SQL statement budget per investigation
    pub max_queries: Resolved<usize>,
}

/// Location of config.kdl: `$SALESIQ_CONFIG`, else the user config directory.
pub fn config_file_path(lookup: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    match non_empty(lookup, CONFIG_PATH_ENV) {
        Some(path) => Some(PathBuf::from(path)),
        None => dirs::config_dir().map(|dir| dir.join("salesiq").join("config.kdl")),
    }
}

/// Resolve settings from the process environment and config file.
pub fn resolve_settings() -> Result<Settings> {
    resolve_settings_with(&|name| std::env::var(name).ok())
}

/// Resolve settings using `lookup` for environment variables.
pub fn resolve_settings_with(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Settings> {
    let config_path = config_file_path(lookup);
    let file = match &config_path {
        Some(path) => SalesIqConfig::load(path)?,
        None => SalesIqConfig::new(),
    };
    resolve(lookup, &file, config_path.as_deref())
}

/// Resolve settings from an environment lookup and an already loaded config file.
///
/// All missing required settings are reported together.
pub fn resolve(
    lookup: &dyn Fn(&str) -> Option<String>,
    file: &SalesIqConfig,
    file_path: Option<&Path>,
) -> Result<Settings> {
    let file_source = || {
        file_path
            .map(|p| ValueSource::ConfigFile(p.to_path_buf()))
            .unwrap_or(ValueSource::Default)
    };
    let env_source = |name: &str| ValueSource::EnvVar(name.to_string());

    let mut missing = Vec::new();

    let api_key = non_empty(lookup, API_KEY_ENV);
    if api_key.is_none() {
        missing.push(MissingSetting {
            name: API_KEY_ENV,
            description: "API key for Google Gemini",
        });
    }

    let database = match (non_empty(lookup, DB_PATH_ENV), &file.database) {
        (Some(path), _) => Some(Resolved::new(PathBuf::from(path), env_source(DB_PATH_ENV))),
        (None, Some(path)) => Some(Resolved::new(path.clone(), file_source())),
        (None, None) => None,
    };
    if database.is_none() {
        missing.push(MissingSetting {
            name: DB_PATH_ENV,
            description: "Path to the campaign SQLite database",
        });
    }

    let (Some(api_key), Some(database)) = (api_key, database) else {
        return Err(Error::Configuration(missing));
    };

    let model = match (non_empty(lookup, MODEL_ENV), &file.model) {
        (Some(model), _) => Resolved::new(model, env_source(MODEL_ENV)),
        (None, Some(model)) => Resolved::new(model.clone(), file_source()),
        (None, None) => Resolved::new(DEFAULT_MODEL.to_string(), ValueSource::Default),
    };

    let timeout_secs = match (non_empty(lookup, TIMEOUT_ENV), file.timeout_secs) {
        (Some(raw), _) => {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|&s| s > 0)
                .ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "{} must be a positive number of seconds, got '{}'",
                        TIMEOUT_ENV, raw
                    ))
                })?;
            Resolved::new(secs, env_source(TIMEOUT_ENV))
        }
        (None, Some(secs)) => Resolved::new(secs, file_source()),
        (None, None) => Resolved::new(DEFAULT_TIMEOUT_SECS, ValueSource::Default),
    };

    let max_queries = match file.max_queries {
        Some(n) => Resolved::new(n, file_source()),
        None => Resolved::new(DEFAULT_MAX_QUERIES, ValueSource::Default),
    };

    Ok(Settings {
        api_key,
        database,
        model,
        timeout_secs,
        max_queries,
    })
}

fn non_empty(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.trim().is_empty())
}
