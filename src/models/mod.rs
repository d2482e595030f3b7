//! Data models for investigation records.
//!
//! This module defines the core data structures:
//! - `ImportanceLevel` - Ordinal severity of a finding (low < medium < high < critical)
//! - `ActionEntry` - A timestamped step taken during an investigation
//! - `FindingEntry` - A timestamped, severity-tagged discovery
//! - `Details` - The JSON-compatible payload attached to actions and findings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Free-form structured payload for action details, finding evidence and context.
///
/// Keys keep their insertion order (serde_json is built with `preserve_order`).
pub type Details = serde_json::Map<String, serde_json::Value>;

/// Severity of a finding.
///
/// Levels compare by their ordinal: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportanceLevel {
    Low = 0,
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl ImportanceLevel {
    /// All levels, lowest first.
    pub const ALL: [ImportanceLevel; 4] = [
        ImportanceLevel::Low,
        ImportanceLevel::Medium,
        ImportanceLevel::High,
        ImportanceLevel::Critical,
    ];

    /// Level assumed for any string that does not name a known level.
    pub const FALLBACK: ImportanceLevel = ImportanceLevel::Low;

    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(ImportanceLevel::Low),
            "medium" => Some(ImportanceLevel::Medium),
            "high" => Some(ImportanceLevel::High),
            "critical" => Some(ImportanceLevel::Critical),
            _ => None,
        }
    }

    /// Parse from string, resolving unknown values to [`ImportanceLevel::FALLBACK`].
    pub fn parse_lenient(s: &str) -> Self {
        Self::parse(s).unwrap_or(Self::FALLBACK)
    }

    /// Numeric rank used for comparisons.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportanceLevel::Low => "low",
            ImportanceLevel::Medium => "medium",
            ImportanceLevel::High => "high",
            ImportanceLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for ImportanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ImportanceLevel {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            crate::Error::InvalidInput(format!(
                "Invalid importance: '{}'. Expected low, medium, high, or critical.",
                s
            ))
        })
    }
}

impl From<ImportanceLevel> for String {
    fn from(level: ImportanceLevel) -> Self {
        level.as_str().to_string()
    }
}

/// A step taken during an investigation (tool call, lifecycle event, ...).
///
/// Entries are identified by their position in the action log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEntry {
    /// When the action was logged
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,

    /// Caller-defined label (e.g., "sql_query", "agent_start")
    #[serde(rename = "type")]
    pub action_type: String,

    /// Short description of the action
    #[serde(default)]
    pub description: String,

    /// Parameters or results of the action
    #[serde(default)]
    pub details: Details,
}

/// A discovery surfaced during an investigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingEntry {
    /// When the finding was logged
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,

    /// Brief title
    pub title: String,

    /// Detailed description
    #[serde(default)]
    pub description: String,

    /// Importance exactly as it was given; see [`FindingEntry::level`]
    pub importance: String,

    /// Indices into the action log. Not validated, may dangle.
    #[serde(rename = "related_actions", default)]
    pub related_action_indices: Vec<usize>,

    /// Supporting evidence
    #[serde(default)]
    pub evidence: Details,
}

impl FindingEntry {
    /// Resolved importance level; unknown strings count as `low`.
    pub fn level(&self) -> ImportanceLevel {
        ImportanceLevel::parse_lenient(&self.importance)
    }
}

/// Serde adapter for ISO-8601 timestamps.
///
/// Writes RFC 3339 in UTC with full sub-second precision. Reads RFC 3339 with
/// any offset, or a naive ISO-8601 date-time which is taken as local time.
pub mod iso8601 {
    use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Format a timestamp the way snapshots store it.
    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// Parse an RFC 3339 or naive ISO-8601 timestamp.
    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s)))
    }
}
