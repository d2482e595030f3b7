//! Common test utilities for SalesIQ integration tests.
//!
//! Provides `TestEnv` for isolated test environments that never read the
//! user's `~/.config/salesiq/config.kdl` or real credentials.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// Environment variables the binary reads, cleared for every command.
const SALESIQ_VARS: &[&str] = &[
    "GEMINI_API_KEY",
    "GEMINI_MODEL",
    "SALESIQ_DB_PATH",
    "SALESIQ_TIMEOUT_SECS",
    "SALESIQ_CONFIG",
    "RUST_LOG",
];

/// Campaign schema and rows used by integration tests.
pub const CAMPAIGN_FIXTURE: &str = "
    CREATE TABLE campaigns (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        budget REAL NOT NULL DEFAULT 0
    );
    CREATE TABLE daily_metrics (
        id INTEGER PRIMARY KEY,
        campaign_id INTEGER NOT NULL REFERENCES campaigns(id),
        day TEXT NOT NULL,
        impressions INTEGER NOT NULL,
        clicks INTEGER NOT NULL
    );
    INSERT INTO campaigns (id, name, budget) VALUES (5, 'Spring Sale', 1500.0);
    INSERT INTO daily_metrics (campaign_id, day, impressions, clicks) VALUES
        (5, '2024-03-01', 10000, 400),
        (5, '2024-03-02', 10000, 380),
        (5, '2024-03-03', 10000, 120);
";

/// A test environment with an isolated temp directory.
///
/// `salesiq()` returns a `Command` whose environment only carries what the
/// test sets, with the config file pointed into the temp directory.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with an empty temp directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Get the path to the temp directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path the binary reads config.kdl from.
    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.kdl")
    }

    /// Write config.kdl with `contents`.
    pub fn write_config(&self, contents: &str) {
        std::fs::write(self.config_path(), contents).unwrap();
    }

    /// Create the seeded campaign database (once) and return its path.
    pub fn seed_db(&self) -> PathBuf {
        let path = self.path().join("campaigns.db");
        if path.exists() {
            return path;
        }
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(CAMPAIGN_FIXTURE).unwrap();
        path
    }

    /// Get a Command for the salesiq binary with no SalesIQ settings.
    pub fn salesiq(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_salesiq"));
        cmd.current_dir(self.path());
        for var in SALESIQ_VARS {
            cmd.env_remove(var);
        }
        cmd.env("SALESIQ_CONFIG", self.config_path());
        cmd.env("HOME", self.path());
        cmd.env("XDG_CONFIG_HOME", self.path().join(".config"));
        cmd
    }

    /// Get a Command with an API key and the seeded database configured.
    pub fn configured(&self) -> Command {
        let db = self.seed_db();
        let mut cmd = self.salesiq();
        cmd.env("GEMINI_API_KEY", "test-key");
        cmd.env("SALESIQ_DB_PATH", db);
        cmd
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
