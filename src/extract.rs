//! Finding extraction from free-text investigation output.
//!
//! The agents answer in markdown prose. Extraction turns that prose into
//! findings through a swappable [`FindingExtractor`] strategy, wrapped by
//! [`extract_findings`], which always yields at least one finding.

use crate::models::ImportanceLevel;
use thiserror::Error;

/// Title of the finding produced when no section qualifies.
pub const FALLBACK_TITLE: &str = "Investigation Results";

/// Description given to findings lifted from heading lines of agent output.
pub const HEADING_PLACEHOLDER: &str = "(Extracted from agent output)";

/// Heading prefixes that mark a section as a finding (lowercase).
const FINDING_PREFIXES: [&str; 4] = ["finding", "anomal", "cause", "result"];

const SECTION_MARKER: &str = "\n## ";

/// A finding pulled out of text, ready to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFinding {
    pub title: String,
    pub description: String,
    pub importance: ImportanceLevel,
}

/// Errors an extraction strategy may report. Never surfaced to users.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The text did not have the structure the strategy expects
    #[error("Malformed investigation output: {0}")]
    Malformed(String),
}

/// Strategy that converts free text into findings.
pub trait FindingExtractor {
    /// Extract findings. An empty result means "nothing recognised".
    fn extract(&self, text: &str) -> Result<Vec<ExtractedFinding>, ExtractionError>;
}

/// Emits a HIGH finding for every section whose heading starts with
/// "finding", "anomal", "cause" or "result" (case-insensitive).
///
/// Sections are the pieces between level-2 heading markers, including the
/// leading text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionHeadingExtractor;

impl FindingExtractor for SectionHeadingExtractor {
    fn extract(&self, text: &str) -> Result<Vec<ExtractedFinding>, ExtractionError> {
        let findings = sections(text)
            .filter_map(|section| {
                let (heading, body) = section.split_once('\n').unwrap_or((section, ""));
                let heading = heading.trim();
                let lowered = heading.to_lowercase();
                if !FINDING_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
                    return None;
                }
                Some(ExtractedFinding {
                    title: heading.to_string(),
                    description: body.trim().to_string(),
                    importance: ImportanceLevel::High,
                })
            })
            .collect();
        Ok(findings)
    }
}

/// Pieces of `text` split on level-2 heading markers, heading line first.
///
/// The text before the first marker is a section too; its first line acts as
/// the heading, with a leading `## ` removed.
fn sections(text: &str) -> impl Iterator<Item = &str> {
    let mut parts = text.split(SECTION_MARKER);
    let leading = parts.next().map(|first| first.strip_prefix("## ").unwrap_or(first));
    leading.into_iter().chain(parts)
}

/// Run `extractor` over `text`, falling back to a single MEDIUM finding that
/// carries the whole text when the extractor finds nothing or fails.
pub fn extract_findings(extractor: &dyn FindingExtractor, text: &str) -> Vec<ExtractedFinding> {
    match extractor.extract(text) {
        Ok(findings) if !findings.is_empty() => findings,
        Ok(_) => vec![fallback(text)],
        Err(e) => {
            tracing::warn!(error = %e, "finding extraction failed, keeping raw result");
            vec![fallback(text)]
        }
    }
}

fn fallback(text: &str) -> ExtractedFinding {
    ExtractedFinding {
        title: FALLBACK_TITLE.to_string(),
        description: text.to_string(),
        importance: ImportanceLevel::Medium,
    }
}

/// Whether intermediate agent output is worth scanning for heading findings.
pub fn mentions_findings(text: &str) -> bool {
    let lowered = text.to_lowercase();
    lowered.contains("finding") || lowered.contains("anomaly")
}

/// Titles of markdown heading lines (1-3 `#`) longer than two characters.
pub fn heading_titles(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| line.len() > 2)
        .filter_map(|line| {
            let trimmed = line.trim();
            let hashes = trimmed.chars().take_while(|&c| c == '#').count();
            if !(1..=3).contains(&hashes) {
                return None;
            }
            let title = trimmed.trim_matches('#').trim();
            (!title.is_empty()).then(|| title.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingExtractor;

    impl FindingExtractor for FailingExtractor {
        fn extract(&self, _text: &str) -> Result<Vec<ExtractedFinding>, ExtractionError> {
            Err(ExtractionError::Malformed("truncated response".to_string()))
        }
    }

    #[test]
    fn test_section_heading_becomes_high_finding() {
        let text = "Summary of work.\n## Finding: CTR Drop\nClicks halved after day 20.\n\n";
        let findings = extract_findings(&SectionHeadingExtractor, text);
        assert_eq!(
            findings,
            vec![ExtractedFinding {
                title: "Finding: CTR Drop".to_string(),
                description: "Clicks halved after day 20.".to_string(),
                importance: ImportanceLevel::High,
            }]
        );
    }

    #[test]
    fn test_heading_at_start_of_text() {
        let findings = extract_findings(&SectionHeadingExtractor, "## Finding: CTR Drop\n body ");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "Finding: CTR Drop");
        assert_eq!(findings[0].description, "body");
    }

    #[test]
    fn test_only_matching_sections_are_kept() {
        let text = "\
Intro
## Summary
Overview.
## Anomalies Detected
CTR fell.
## Root Cause
Tracking pixel removed.
## Causes considered
Seasonality ruled out.
## RESULTS
Fix the pixel.
### Finding nested
Not a level-2 section.";
        let titles: Vec<_> = extract_findings(&SectionHeadingExtractor, text)
            .into_iter()
            .map(|f| f.title)
            .collect();
        assert_eq!(titles, ["Anomalies Detected", "Causes considered", "RESULTS"]);
    }

    #[test]
    fn test_leading_text_is_checked_like_a_section() {
        let text = "Results: CTR fell 50% after day 20 because the pixel was removed.";
        assert_eq!(
            extract_findings(&SectionHeadingExtractor, text),
            vec![ExtractedFinding {
                title: text.to_string(),
                description: String::new(),
                importance: ImportanceLevel::High,
            }]
        );

        let text = "Findings so far
Clicks halved.
## Cause: pixel removed
Deployed on day 20.";
        let findings = extract_findings(&SectionHeadingExtractor, text);
        let titles: Vec<_> = findings.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, ["Findings so far", "Cause: pixel removed"]);
        assert_eq!(findings[0].description, "Clicks halved.");
    }

    #[test]
    fn test_unmatched_leading_text_falls_back() {
        let findings = extract_findings(&SectionHeadingExtractor, "Overall the campaign looks healthy.");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, FALLBACK_TITLE);
    }

    #[test]
    fn test_fallback_without_headings() {
        let text = "no structured headings here";
        let findings = extract_findings(&SectionHeadingExtractor, text);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "Investigation Results");
        assert_eq!(findings[0].description, text);
        assert_eq!(findings[0].importance, ImportanceLevel::Medium);
    }

    #[test]
    fn test_empty_text_still_yields_a_finding() {
        let findings = extract_findings(&SectionHeadingExtractor, "");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].description, "");
    }

    #[test]
    fn test_extractor_error_degrades_to_fallback() {
        let findings = extract_findings(&FailingExtractor, "## Finding: X\nbody");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, FALLBACK_TITLE);
        assert_eq!(findings[0].description, "## Finding: X\nbody");
    }

    #[test]
    fn test_heading_titles() {
        let text = "# Overview\n##\n## Anomaly in CTR\nbody\n#### Too deep\n  ### Indented cause\n#";
        assert_eq!(
            heading_titles(text),
            ["Overview", "Anomaly in CTR", "Indented cause"]
        );
    }

    #[test]
    fn test_heading_titles_skip_bare_markers() {
        assert!(heading_titles("###\n  ##  \n### \n").is_empty());
    }

    #[test]
    fn test_mentions_findings() {
        assert!(mentions_findings("Key FINDINGS below"));
        assert!(mentions_findings("an anomaly was seen"));
        assert!(!mentions_findings("all metrics nominal"));
    }
}
