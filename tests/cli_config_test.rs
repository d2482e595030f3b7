//! CLI tests for startup: settings validation, connection test, arguments.
//!
//! None of these reach the generative service.

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_help_flag() {
    let env = TestEnv::new();
    env.salesiq()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--test-connection"))
        .stdout(predicate::str::contains("--context"));
}

#[test]
fn test_version_flag() {
    let env = TestEnv::new();
    env.salesiq()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("salesiq"))
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_missing_settings_are_all_reported() {
    let env = TestEnv::new();
    env.salesiq()
        .arg("Investigate CTR drop")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "ERROR: Missing required environment variables:",
        ))
        .stderr(predicate::str::contains("  - GEMINI_API_KEY: API key for Google Gemini"))
        .stderr(predicate::str::contains("  - SALESIQ_DB_PATH:"));
}

#[test]
fn test_database_from_config_file() {
    let env = TestEnv::new();
    let db = env.seed_db();
    env.write_config(&format!("database \"{}\"\n", db.display()));

    env.salesiq()
        .env("GEMINI_API_KEY", "test-key")
        .arg("--test-connection")
        .assert()
        .success()
        .stdout(predicate::str::contains("Testing database connection..."))
        .stdout(predicate::str::contains("Success! Connected to the database."));
}

#[test]
fn test_invalid_config_file_fails() {
    let env = TestEnv::new();
    env.write_config("max-queries 0\n");

    env.salesiq()
        .env("GEMINI_API_KEY", "test-key")
        .env("SALESIQ_DB_PATH", "/nonexistent/campaigns.db")
        .arg("--test-connection")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ERROR: Invalid input"));
}

#[test]
fn test_connection_success() {
    let env = TestEnv::new();
    env.configured()
        .arg("--test-connection")
        .assert()
        .success()
        .stdout(predicate::str::contains("Success! Connected to the database."));
}

#[test]
fn test_connection_failure() {
    let env = TestEnv::new();
    env.salesiq()
        .env("GEMINI_API_KEY", "test-key")
        .env("SALESIQ_DB_PATH", env.path().join("missing.db"))
        .arg("--test-connection")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Testing database connection..."))
        .stderr(predicate::str::contains(
            "Failed to connect to the database. Check your connection settings.",
        ));

    assert!(!env.path().join("missing.db").exists());
}

#[test]
fn test_query_required() {
    let env = TestEnv::new();
    env.configured()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "ERROR: Please provide an investigation query.",
        ))
        .stderr(predicate::str::contains("Example: salesiq"));
}

#[test]
fn test_unreachable_database_fails_run() {
    let env = TestEnv::new();
    env.salesiq()
        .env("GEMINI_API_KEY", "test-key")
        .env("SALESIQ_DB_PATH", env.path().join("missing.db"))
        .arg("Investigate CTR drop")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("ERROR: Failed to connect to the database"));
}
