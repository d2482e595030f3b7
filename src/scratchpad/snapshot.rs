//! JSON snapshots of a scratchpad.
//!
//! A snapshot holds `actions`, `findings`, `context`, `start_time` and an
//! informational `summary`. Loading ignores `summary`; it is recomputed.

use super::{Scratchpad, Summary};
use crate::models::{ActionEntry, Details, FindingEntry, iso8601};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    actions: &'a [ActionEntry],
    findings: &'a [FindingEntry],
    context: &'a Details,
    #[serde(with = "iso8601")]
    start_time: DateTime<Utc>,
    summary: Summary,
}

#[derive(Deserialize)]
struct SnapshotOwned {
    #[serde(default)]
    actions: Vec<ActionEntry>,
    #[serde(default)]
    findings: Vec<FindingEntry>,
    #[serde(default)]
    context: Details,
    #[serde(default)]
    start_time: Option<String>,
}

impl Scratchpad {
    fn snapshot(&self) -> SnapshotRef<'_> {
        SnapshotRef {
            actions: &self.actions,
            findings: &self.findings,
            context: &self.context,
            start_time: self.start_time,
            summary: self.summary(),
        }
    }

    /// Snapshot as a JSON value.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.snapshot())?)
    }

    /// Snapshot as JSON text, indented with two spaces when `pretty`.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let snapshot = self.snapshot();
        let json = if pretty {
            serde_json::to_string_pretty(&snapshot)?
        } else {
            serde_json::to_string(&snapshot)?
        };
        Ok(json)
    }

    /// Rebuild a scratchpad from [`Scratchpad::to_json`] output.
    ///
    /// Missing sections default to empty; a missing `start_time` defaults to now.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::Parse(format!("invalid JSON: {}", e)))?;
        if !value.is_object() {
            return Err(Error::Parse("snapshot must be a JSON object".to_string()));
        }

        let data: SnapshotOwned =
            serde_json::from_value(value).map_err(|e| Error::Parse(e.to_string()))?;

        let start_time = match data.start_time.as_deref() {
            Some(s) => iso8601::parse(s)
                .ok_or_else(|| Error::Parse(format!("invalid start_time: {}", s)))?,
            None => Utc::now(),
        };

        Ok(Self {
            start_time,
            actions: data.actions,
            findings: data.findings,
            context: data.context,
        })
    }

    /// Write a pretty JSON snapshot to `path`, replacing any existing file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = self.to_json(true)?;
        write_atomic(path, json.as_bytes())
    }
}

/// Write `contents` to a temp file next to `path`, then rename it into place.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let to_error = |source: std::io::Error| Error::Serialization {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(to_error)?;
    file.write_all(contents).map_err(to_error)?;
    file.as_file().sync_all().map_err(to_error)?;
    file.persist(path).map_err(|e| to_error(e.error))?;

    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}
