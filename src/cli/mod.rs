//! CLI argument definitions for SalesIQ.

use crate::models::Details;
use clap::Parser;
use serde_json::Value;
use std::path::Path;

/// Version string shown by `--version`: package version, commit and build time.
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SALESIQ_GIT_COMMIT"),
    " ",
    env!("SALESIQ_BUILD_TIMESTAMP"),
    ")"
);

/// SalesIQ - AI-powered marketing data anomaly investigator.
///
/// Requires GEMINI_API_KEY and SALESIQ_DB_PATH in the environment.
#[derive(Parser, Debug)]
#[command(name = "salesiq")]
#[command(author, version = VERSION, about = "SalesIQ Agent - AI-powered marketing data anomaly investigator", long_about = None)]
pub struct Cli {
    /// The investigation query (e.g., 'Investigate CTR drop for Campaign 5')
    pub query: Option<String>,

    /// Save investigation results to this file (.json for a snapshot, anything else for a text report)
    #[arg(short = 'o', long)]
    pub output: Option<std::path::PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Test database connection and exit
    #[arg(long)]
    pub test_connection: bool,

    /// Additional context for the investigation (format: key1=value1,key2=value2)
    #[arg(short = 'c', long)]
    pub context: Option<String>,
}

/// Parse `key1=value1,key2=value2` into an ordered string map.
///
/// Pairs split on the first `=`; keys and values are trimmed; pairs without
/// `=` are skipped. A later duplicate key overwrites the earlier value.
pub fn parse_context(raw: &str) -> Details {
    let mut context = Details::new();
    for pair in raw.split(',') {
        if let Some((key, value)) = pair.split_once('=') {
            context.insert(key.trim().to_string(), Value::String(value.trim().to_string()));
        }
    }
    context
}

/// How `--output` files are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Full scratchpad snapshot
    Json,
    /// Rendered text report with the detailed result
    Text,
}

impl OutputFormat {
    /// `.json` (any case) selects the snapshot; every other path gets a text report.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}
