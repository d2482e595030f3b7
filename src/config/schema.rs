//! KDL schema for config.kdl.
//!
//! This module provides:
//! - A Rust struct representing the KDL schema
//! - Parsing from KDL documents and files
//! - Validation

use crate::{Error, Result};
use kdl::KdlDocument;
use std::path::{Path, PathBuf};

/// User preferences stored in config.kdl.
///
/// The API key is a secret and is never read from this file.
///
/// # KDL Schema
///
/// ```kdl
/// // SalesIQ preferences
/// database "/var/lib/salesiq/campaigns.db"
/// model "gemini-1.5-pro"
/// timeout-secs 60
/// max-queries 5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesIqConfig {
    /// Path to the campaign database
    pub database: Option<PathBuf>,

    /// Gemini model name
    pub model: Option<String>,

    /// Generative request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Maximum SQL statements the SQL expert may run per investigation
    pub max_queries: Option<usize>,
}

impl SalesIqConfig {
    /// Create an empty config with no values set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.timeout_secs == Some(0) {
            return Err("timeout-secs must be greater than 0".to_string());
        }
        if self.max_queries == Some(0) {
            return Err("max-queries must be greater than 0".to_string());
        }
        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err("model must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document.
    ///
    /// Unknown nodes and values of the wrong type are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        if let Some(s) = first_string(doc, "database") {
            config.database = Some(PathBuf::from(s));
        }

        if let Some(s) = first_string(doc, "model") {
            config.model = Some(s.to_string());
        }

        if let Some(i) = first_integer(doc, "timeout-secs") {
            config.timeout_secs = u64::try_from(i).ok();
        }

        if let Some(i) = first_integer(doc, "max-queries") {
            config.max_queries = usize::try_from(i).ok();
        }

        config
    }

    /// Load config from a KDL file.
    ///
    /// Returns an empty config if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Other(format!("Failed to read {}: {}", path.display(), e)))?;

        let doc: KdlDocument = content.parse().map_err(|e| {
            Error::Other(format!("Failed to parse KDL in {}: {}", path.display(), e))
        })?;

        let config = Self::from_kdl(&doc);
        config
            .validate()
            .map_err(|e| Error::InvalidInput(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }
}

fn first_string<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a str> {
    doc.get(name)?.entries().first()?.value().as_string()
}

fn first_integer(doc: &KdlDocument, name: &str) -> Option<i128> {
    doc.get(name)?.entries().first()?.value().as_integer()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_all_fields() {
        let kdl = r#"
            database "/tmp/campaigns.db"
            model "gemini-1.5-flash"
            timeout-secs 30
            max-queries 3
        "#;
        let doc: KdlDocument = kdl.parse().unwrap();
        let config = SalesIqConfig::from_kdl(&doc);

        assert_eq!(config.database, Some(PathBuf::from("/tmp/campaigns.db")));
        assert_eq!(config.model.as_deref(), Some("gemini-1.5-flash"));
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(config.max_queries, Some(3));
    }

    #[test]
    fn test_wrong_types_are_ignored() {
        let doc: KdlDocument = "timeout-secs \"soon\"\nmodel 7\nmax-queries -2".parse().unwrap();
        let config = SalesIqConfig::from_kdl(&doc);
        assert_eq!(config, SalesIqConfig::new());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = SalesIqConfig {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SalesIqConfig {
            max_queries: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(SalesIqConfig::new().validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let config = SalesIqConfig::load(&dir.path().join("config.kdl")).unwrap();
        assert_eq!(config, SalesIqConfig::new());
    }

    #[test]
    fn test_load_invalid_kdl() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.kdl");
        std::fs::write(&path, "model \"unterminated").unwrap();
        assert!(matches!(SalesIqConfig::load(&path), Err(Error::Other(_))));

        std::fs::write(&path, "timeout-secs 0").unwrap();
        assert!(matches!(SalesIqConfig::load(&path), Err(Error::InvalidInput(_))));
    }
}
