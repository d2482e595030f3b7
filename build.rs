//! Stamps `salesiq --version` with when and from which commit it was built.
//!
//! Exposes `SALESIQ_BUILD_TIMESTAMP` (UTC) and `SALESIQ_GIT_COMMIT`
//! (short hash, "unknown" outside a checkout) to `env!`.

use std::process::Command;

fn main() {
    // New commits or staged changes refresh the stamp.
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    println!("cargo:rustc-env=SALESIQ_BUILD_TIMESTAMP={}", timestamp);

    let commit = short_commit().unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=SALESIQ_GIT_COMMIT={}", commit);
}

fn short_commit() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string()).filter(|h| !h.is_empty())
}
