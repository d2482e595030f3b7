//! SalesIQ - An agent-driven investigator for marketing campaign anomalies.
//!
//! This library provides the core functionality for the `salesiq` CLI tool,
//! including the investigation scratchpad, finding extraction, and the
//! database and generative-text collaborators the agent crew works with.

pub mod cli;
pub mod config;
pub mod crew;
pub mod db;
pub mod extract;
pub mod gemini;
pub mod investigation;
pub mod models;
pub mod scratchpad;
pub mod tools;

use config::MissingSetting;
use gemini::GenerativeError;
use std::path::PathBuf;


/// Library-level error type for SalesIQ operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Missing required configuration: {}", join_missing(.0))]
    Configuration(Vec<MissingSetting>),

    #[error("Failed to connect to the database at {}: {reason}", path.display())]
    Connection { path: PathBuf, reason: String },

    #[error("Generative service error: {0}")]
    Generative(#[from] GenerativeError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Failed to write {}: {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

fn join_missing(missing: &[MissingSetting]) -> String {
    missing
        .iter()
        .map(|m| m.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for SalesIQ operations.
pub type Result<T> = std::result::Result<T, Error>;
