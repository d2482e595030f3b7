//! Human-readable reports.

use super::Scratchpad;
use crate::Result;
use crate::models::{FindingEntry, ImportanceLevel};
use chrono::Local;
use std::fmt::Write;
use std::path::Path;

const RULE_WIDTH: usize = 60;

impl Scratchpad {
    /// Render the console report.
    ///
    /// Sections: header, summary, key findings (critical, then high), other
    /// findings (medium only), action log. Low findings are not shown.
    pub fn render_report(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let summary = self.summary();
        let mut out = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "\n{}", rule);
        let _ = writeln!(out, "## SALESIQ AGENT INVESTIGATION REPORT");
        let _ = writeln!(out, "{}", rule);

        let _ = writeln!(out, "\n## SUMMARY");
        let _ = writeln!(
            out,
            "Start time: {}",
            summary.start_time.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "Duration: {:.2} seconds", summary.duration_seconds);
        let _ = writeln!(out, "Actions taken: {}", summary.action_count);
        let _ = writeln!(out, "Findings: {}", summary.finding_count);

        let _ = writeln!(out, "\n## KEY FINDINGS");
        let critical = self.findings_at(ImportanceLevel::Critical);
        let high = self.findings_at(ImportanceLevel::High);

        if !critical.is_empty() {
            let _ = writeln!(out, "\n### CRITICAL FINDINGS");
            write_detailed(&mut out, &critical);
        }
        if !high.is_empty() {
            let _ = writeln!(out, "\n### HIGH IMPORTANCE FINDINGS");
            write_detailed(&mut out, &high);
        }
        if critical.is_empty() && high.is_empty() {
            let _ = writeln!(out, "\nNo high or critical findings identified.");
        }

        let medium = self.findings_at(ImportanceLevel::Medium);
        if !medium.is_empty() {
            let _ = writeln!(out, "\n### OTHER FINDINGS");
            for (i, finding) in medium.iter().enumerate() {
                let _ = writeln!(out, "\n{}. {}", i + 1, finding.title);
            }
        }

        let _ = writeln!(out, "\n## ACTION LOG");
        for (i, action) in self.actions.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}. [{}] {}: {}",
                i + 1,
                action.timestamp.with_timezone(&Local).format("%H:%M:%S"),
                action.action_type,
                action.description
            );
        }

        let _ = writeln!(out, "\n{}", rule);
        out
    }

    /// Print the console report to stdout.
    pub fn print_report(&self) {
        print!("{}", self.render_report());
    }

    /// Render the markdown report written for non-JSON output files.
    pub fn render_text_report(&self, query: &str, result: &str) -> String {
        let summary = self.summary();
        let mut out = String::new();

        let _ = writeln!(out, "# SalesIQ Investigation Report: {}", query);
        let _ = writeln!(out, "Generated: {}\n", Local::now().format("%Y-%m-%d %H:%M:%S"));

        let _ = writeln!(out, "## Summary");
        let _ = writeln!(out, "- Duration: {:.2} seconds", summary.duration_seconds);
        let _ = writeln!(out, "- Actions: {}", summary.action_count);
        let _ = writeln!(out, "- Findings: {}\n", summary.finding_count);

        let _ = writeln!(out, "## Key Findings\n");
        for (i, finding) in self.findings(ImportanceLevel::High).iter().enumerate() {
            let _ = writeln!(out, "### {}. {}", i + 1, finding.title);
            let _ = writeln!(out, "{}\n", finding.description);
        }

        let _ = writeln!(out, "## Detailed Results\n");
        out.push_str(result);
        out
    }

    /// Write [`Scratchpad::render_text_report`] to `path`, replacing any existing file.
    pub fn save_text_report(&self, path: &Path, query: &str, result: &str) -> Result<()> {
        let report = self.render_text_report(query, result);
        super::snapshot::write_atomic(path, report.as_bytes())
    }
}

fn write_detailed(out: &mut String, findings: &[&FindingEntry]) {
    for (i, finding) in findings.iter().enumerate() {
        let _ = writeln!(out, "\n{}. {}", i + 1, finding.title);
        let _ = writeln!(out, "   {}", finding.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(haystack: &str, needle: &str) -> usize {
        haystack
            .find(needle)
            .unwrap_or_else(|| panic!("missing {:?} in report:\n{}", needle, haystack))
    }

    #[test]
    fn test_report_sections_in_order() {
        let mut pad = Scratchpad::new();
        pad.log_action("investigation_start", "Starting investigation: CTR", None);
        pad.log_finding("Tracking gap", "Pixel missing on day 21", "high");
        pad.log_finding("CTR Drop", "50% drop after day 20", "critical");
        pad.log_finding("Creative fatigue", "Same ad for 30 days", "medium");
        pad.log_finding("Minor blip", "Noise", "low");

        let report = pad.render_report();
        let header = position(&report, "## SALESIQ AGENT INVESTIGATION REPORT");
        let summary = position(&report, "## SUMMARY");
        let critical = position(&report, "### CRITICAL FINDINGS");
        let high = position(&report, "### HIGH IMPORTANCE FINDINGS");
        let other = position(&report, "### OTHER FINDINGS");
        let log = position(&report, "## ACTION LOG");
        assert!(header < summary && summary < critical && critical < high);
        assert!(high < other && other < log);

        assert!(report.contains("1. CTR Drop\n   50% drop after day 20"));
        assert!(report.contains("1. Creative fatigue"));
        assert!(!report.contains("Same ad for 30 days"));
        assert!(!report.contains("Minor blip"));
        assert!(!report.contains("No high or critical findings identified."));
        assert!(report.contains("] investigation_start: Starting investigation: CTR"));
        assert!(report.contains("Actions taken: 1"));
        assert!(report.contains("Findings: 4"));
    }

    #[test]
    fn test_report_without_key_findings() {
        let mut pad = Scratchpad::new();
        pad.log_finding("Investigation Results", "raw text", "medium");

        let report = pad.render_report();
        assert!(report.contains("No high or critical findings identified."));
        assert!(!report.contains("### CRITICAL FINDINGS"));
        assert!(report.contains("### OTHER FINDINGS"));
    }

    #[test]
    fn test_text_report_lists_high_and_above() {
        let mut pad = Scratchpad::new();
        pad.log_finding("Finding: CTR Drop", "Impressions flat, clicks halved", "high");
        pad.log_finding("Background", "Context only", "medium");

        let report = pad.render_text_report("Investigate CTR drop", "## Finding: CTR Drop\n...");
        assert!(report.starts_with("# SalesIQ Investigation Report: Investigate CTR drop\n"));
        assert!(report.contains("### 1. Finding: CTR Drop\nImpressions flat, clicks halved\n"));
        assert!(!report.contains("Background"));
        assert!(report.ends_with("## Detailed Results\n\n## Finding: CTR Drop\n..."));
    }
}
