//! Configuration for SalesIQ.
//!
//! ## config.kdl - User preferences
//!
//! Located at `$SALESIQ_CONFIG`, or `~/.config/salesiq/config.kdl`.
//!
//! Contains:
//! - `database` - Path to the campaign SQLite database
//! - `model` - Gemini model name
//! - `timeout-secs` - Generative request timeout
//! - `max-queries` - SQL statement budget per investigation
//!
//! ## Secrets
//!
//! The Gemini API key is read from `GEMINI_API_KEY` only and never written
//! to disk.
//!
//! ## Precedence
//!
//! env var > config.kdl > defaults
//!
//! Use the [`resolver`] module for unified precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    API_KEY_ENV, CONFIG_PATH_ENV, DB_PATH_ENV, MODEL_ENV, MissingSetting, Resolved, Settings,
    TIMEOUT_ENV, ValueSource, resolve_settings, resolve_settings_with,
};
pub use schema::SalesIqConfig;
