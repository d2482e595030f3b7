//! In-memory scratchpad for an investigation run.
//!
//! A [`Scratchpad`] holds the chronological trail of one run:
//! - an append-only action log ([`ActionEntry`])
//! - an append-only list of findings ([`FindingEntry`])
//! - a key/value context map (last write wins)
//! - the instant the run started
//!
//! Rendering lives in [`report`], JSON persistence in [`snapshot`].
//!
//! The scratchpad has a single owner. Callers that fan agents out across
//! threads must funnel appends through one lock so the logs keep their order.

pub mod report;
pub mod snapshot;

use crate::models::{ActionEntry, Details, FindingEntry, ImportanceLevel, iso8601};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Investigation log: actions, findings and context for a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct Scratchpad {
    start_time: DateTime<Utc>,
    actions: Vec<ActionEntry>,
    findings: Vec<FindingEntry>,
    context: Details,
}

/// Derived overview of a scratchpad, computed at call time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    #[serde(with = "iso8601")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "iso8601")]
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
    pub action_count: usize,
    pub finding_count: usize,
    pub context_keys: Vec<String>,
    /// Titles of high and critical findings, in log order
    pub high_importance_findings: Vec<String>,
}

impl Scratchpad {
    /// Create an empty scratchpad starting now.
    pub fn new() -> Self {
        Self::with_start_time(Utc::now())
    }

    /// Create an empty scratchpad with an explicit start instant.
    pub fn with_start_time(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            actions: Vec::new(),
            findings: Vec::new(),
            context: Details::new(),
        }
    }

    /// When this run started.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Append an action and return its index in the action log.
    pub fn log_action(
        &mut self,
        action_type: impl Into<String>,
        description: impl Into<String>,
        details: Option<Details>,
    ) -> usize {
        self.actions.push(ActionEntry {
            timestamp: Utc::now(),
            action_type: action_type.into(),
            description: description.into(),
            details: details.unwrap_or_default(),
        });
        self.actions.len() - 1
    }

    /// Append a finding with no related actions or evidence.
    ///
    /// `importance` is stored verbatim; accepts an [`ImportanceLevel`] or any string.
    pub fn log_finding(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        importance: impl Into<String>,
    ) {
        self.log_finding_with(title, description, importance, Vec::new(), Details::new());
    }

    /// Append a finding that cross-references actions and carries evidence.
    ///
    /// `related_actions` are not checked against the current log length.
    pub fn log_finding_with(
        &mut self,
        title: impl Into<String>,
        description: impl Into<String>,
        importance: impl Into<String>,
        related_actions: Vec<usize>,
        evidence: Details,
    ) {
        self.findings.push(FindingEntry {
            timestamp: Utc::now(),
            title: title.into(),
            description: description.into(),
            importance: importance.into(),
            related_action_indices: related_actions,
            evidence,
        });
    }

    /// Set a context value, replacing any previous value for `key`.
    pub fn add_context(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.context.insert(key.into(), value.into());
    }

    /// The full action log in insertion order.
    pub fn action_history(&self) -> &[ActionEntry] {
        &self.actions
    }

    /// All findings in insertion order.
    pub fn all_findings(&self) -> &[FindingEntry] {
        &self.findings
    }

    /// Findings at or above `min_importance`, in insertion order.
    pub fn findings(&self, min_importance: ImportanceLevel) -> Vec<&FindingEntry> {
        self.findings
            .iter()
            .filter(|f| f.level() >= min_importance)
            .collect()
    }

    /// Findings whose resolved level is exactly `level`, in insertion order.
    pub fn findings_at(&self, level: ImportanceLevel) -> Vec<&FindingEntry> {
        self.findings.iter().filter(|f| f.level() == level).collect()
    }

    /// The whole context map.
    pub fn context(&self) -> &Details {
        &self.context
    }

    /// A single context value.
    pub fn get_context(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    /// Summarize the scratchpad as of now.
    pub fn summary(&self) -> Summary {
        self.summary_at(Utc::now())
    }

    /// Summarize the scratchpad as of `end_time`.
    pub fn summary_at(&self, end_time: DateTime<Utc>) -> Summary {
        let elapsed = end_time - self.start_time;
        let duration_seconds = elapsed
            .num_microseconds()
            .map(|us| us as f64 / 1_000_000.0)
            .unwrap_or_else(|| elapsed.num_milliseconds() as f64 / 1_000.0);

        Summary {
            start_time: self.start_time,
            end_time,
            duration_seconds,
            action_count: self.actions.len(),
            finding_count: self.findings.len(),
            context_keys: self.context.keys().cloned().collect(),
            high_importance_findings: self
                .findings(ImportanceLevel::High)
                .into_iter()
                .map(|f| f.title.clone())
                .collect(),
        }
    }
}

impl Default for Scratchpad {
    fn default() -> Self {
        Self::new()
    }
}
