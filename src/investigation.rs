//! Investigation pipeline.
//!
//! Records one crew run into a [`Scratchpad`]: the query and context, every
//! tool call the agents make, optionally the agents' lifecycle, and finally
//! the findings extracted from the crew's answer.

use crate::Result;
use crate::crew::{AgentProfile, Crew, CrewObserver};
use crate::extract::{
    FindingExtractor, HEADING_PLACEHOLDER, SectionHeadingExtractor, extract_findings,
    heading_titles, mentions_findings,
};
use crate::models::{Details, ImportanceLevel};
use crate::scratchpad::Scratchpad;
use serde_json::{Value, json};

/// Characters of agent output kept in `agent_end` actions.
const AGENT_PREVIEW_CHARS: usize = 100;

/// Characters of the final result kept in the `investigation_complete` action.
const RESULT_PREVIEW_CHARS: usize = 200;

/// Outcome of a finished investigation.
#[derive(Debug, Clone)]
pub struct Investigation {
    pub scratchpad: Scratchpad,
    /// The crew's final free-text answer
    pub result: String,
}

/// Run `crew` for `query` using section-heading extraction.
pub fn run_investigation(
    crew: &mut dyn Crew,
    query: &str,
    context: &Details,
    verbose: bool,
) -> Result<Investigation> {
    run_investigation_with(crew, &SectionHeadingExtractor, query, context, verbose)
}

/// Run `crew` for `query`, turning its answer into findings with `extractor`.
pub fn run_investigation_with(
    crew: &mut dyn Crew,
    extractor: &dyn FindingExtractor,
    query: &str,
    context: &Details,
    verbose: bool,
) -> Result<Investigation> {
    let mut scratchpad = Scratchpad::new();
    scratchpad.add_context("query", query);
    for (key, value) in context {
        scratchpad.add_context(key.clone(), value.clone());
    }

    scratchpad.log_action(
        "investigation_start",
        format!("Starting investigation: {}", query),
        Some(details(json!({ "context": context }))),
    );
    tracing::info!(query, context_keys = context.len(), "investigation started");

    let result = {
        let mut recorder = InvestigationRecorder::new(&mut scratchpad, verbose);
        crew.kickoff(&mut recorder)?
    };

    scratchpad.log_action(
        "investigation_complete",
        "Investigation completed",
        Some(details(json!({
            "result_preview": preview(&result, RESULT_PREVIEW_CHARS)
        }))),
    );

    for finding in extract_findings(extractor, &result) {
        scratchpad.log_finding(finding.title, finding.description, finding.importance);
    }

    tracing::info!(
        actions = scratchpad.action_history().len(),
        findings = scratchpad.all_findings().len(),
        "investigation finished"
    );

    Ok(Investigation { scratchpad, result })
}

/// [`CrewObserver`] that writes crew events into a scratchpad.
///
/// Tool calls are always recorded. Agent start/end events are printed and
/// recorded only in verbose mode, where headings in agent output that
/// mentions findings are also logged as medium findings.
pub struct InvestigationRecorder<'a> {
    scratchpad: &'a mut Scratchpad,
    verbose: bool,
}

impl<'a> InvestigationRecorder<'a> {
    pub fn new(scratchpad: &'a mut Scratchpad, verbose: bool) -> Self {
        Self {
            scratchpad,
            verbose,
        }
    }
}

impl CrewObserver for InvestigationRecorder<'_> {
    fn on_agent_start(&mut self, agent: &AgentProfile) {
        if !self.verbose {
            return;
        }
        println!("\n[{}] Starting work...", agent.role);
        self.scratchpad.log_action(
            "agent_start",
            format!("Agent {} starting work", agent.role),
            Some(details(json!({ "agent": agent.role }))),
        );
    }

    fn on_agent_end(&mut self, agent: &AgentProfile, output: &str) {
        if !self.verbose {
            return;
        }
        println!("\n[{}] Completed work", agent.role);
        self.scratchpad.log_action(
            "agent_end",
            format!("Agent {} completed work", agent.role),
            Some(details(json!({
                "agent": agent.role,
                "result_preview": preview(output, AGENT_PREVIEW_CHARS),
            }))),
        );

        if mentions_findings(output) {
            for title in heading_titles(output) {
                self.scratchpad
                    .log_finding(title, HEADING_PLACEHOLDER, ImportanceLevel::Medium);
            }
        }
    }

    fn on_tool_use(&mut self, agent: &AgentProfile, tool: &str, input: &str, success: bool) {
        self.scratchpad.log_action(
            tool,
            format!("Agent {} used {}", agent.role, tool),
            Some(details(json!({
                "agent": agent.role,
                "input": input,
                "success": success,
            }))),
        );
    }
}

fn details(value: Value) -> Details {
    match value {
        Value::Object(map) => map,
        _ => Details::new(),
    }
}

/// First `max_chars` characters of `text`, with "..." appended when cut.
fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::crew::AgentRole;
    use crate::extract::{ExtractedFinding, ExtractionError, FALLBACK_TITLE};
    use crate::gemini::GenerativeError;

    /// Crew that replays one agent's output and one tool call.
    struct ReplayCrew {
        agent_output: String,
        result: String,
    }

    impl ReplayCrew {
        fn new(agent_output: &str, result: &str) -> Self {
            Self {
                agent_output: agent_output.to_string(),
                result: result.to_string(),
            }
        }
    }

    impl Crew for ReplayCrew {
        fn kickoff(&mut self, observer: &mut dyn CrewObserver) -> Result<String> {
            let agent = AgentRole::DataDetective.profile();
            observer.on_agent_start(&agent);
            observer.on_tool_use(&agent, "sql_query", "SELECT 1", true);
            observer.on_agent_end(&agent, &self.agent_output);
            Ok(self.result.clone())
        }
    }

    struct FailingCrew;

    impl Crew for FailingCrew {
        fn kickoff(&mut self, _observer: &mut dyn CrewObserver) -> Result<String> {
            Err(GenerativeError::QuotaExceeded.into())
        }
    }

    fn action_types(pad: &Scratchpad) -> Vec<&str> {
        pad.action_history()
            .iter()
            .map(|a| a.action_type.as_str())
            .collect()
    }

    #[test]
    fn test_quiet_run_records_tools_and_findings() {
        let mut crew = ReplayCrew::new(
            "# Anomaly found\n",
            "Intro\n## Finding: CTR Drop\nClicks halved.\n## Cause\nPixel removed.",
        );
        let mut context = Details::new();
        context.insert("campaign_id".to_string(), json!("5"));

        let run = run_investigation(&mut crew, "Investigate CTR drop", &context, false).unwrap();
        let pad = &run.scratchpad;

        assert_eq!(action_types(pad), ["investigation_start", "sql_query", "investigation_complete"]);
        assert_eq!(pad.get_context("query"), Some(&json!("Investigate CTR drop")));
        assert_eq!(pad.get_context("campaign_id"), Some(&json!("5")));

        let start = &pad.action_history()[0];
        assert_eq!(start.description, "Starting investigation: Investigate CTR drop");
        assert_eq!(start.details["context"], json!({"campaign_id": "5"}));

        let tool = &pad.action_history()[1];
        assert_eq!(tool.details["agent"], "Data Detective");
        assert_eq!(tool.details["input"], "SELECT 1");
        assert_eq!(tool.details["success"], true);

        let titles: Vec<_> = pad.all_findings().iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, ["Finding: CTR Drop", "Cause"]);
        assert!(pad.all_findings().iter().all(|f| f.importance == "high"));
    }

    #[test]
    fn test_verbose_run_records_lifecycle_and_heading_findings() {
        let output = format!("## Anomaly in clicks\n{}", "x".repeat(150));
        let mut crew = ReplayCrew::new(&output, "plain answer");

        let run = run_investigation(&mut crew, "q", &Details::new(), true).unwrap();
        let pad = &run.scratchpad;

        assert_eq!(
            action_types(pad),
            ["investigation_start", "agent_start", "sql_query", "agent_end", "investigation_complete"]
        );
        let preview = pad.action_history()[3].details["result_preview"].as_str().unwrap();
        assert_eq!(preview.chars().count(), AGENT_PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));

        let findings = pad.all_findings();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].title, "Anomaly in clicks");
        assert_eq!(findings[0].description, HEADING_PLACEHOLDER);
        assert_eq!(findings[0].level(), ImportanceLevel::Medium);
        assert_eq!(findings[1].title, FALLBACK_TITLE);
        assert_eq!(findings[1].description, "plain answer");
    }

    #[test]
    fn test_verbose_heading_scan_needs_finding_mention() {
        let mut crew = ReplayCrew::new("## Overview\nall fine", "done");
        let run = run_investigation(&mut crew, "q", &Details::new(), true).unwrap();
        assert_eq!(run.scratchpad.all_findings().len(), 1);
        assert_eq!(run.result, "done");
    }

    #[test]
    fn test_custom_extractor_error_falls_back() {
        struct Broken;
        impl FindingExtractor for Broken {
            fn extract(&self, _text: &str) -> std::result::Result<Vec<ExtractedFinding>, ExtractionError> {
                Err(ExtractionError::Malformed("bad".to_string()))
            }
        }

        let mut crew = ReplayCrew::new("", "## Finding: X\nbody");
        let run = run_investigation_with(&mut crew, &Broken, "q", &Details::new(), false).unwrap();
        assert_eq!(run.scratchpad.all_findings()[0].title, FALLBACK_TITLE);
    }

    #[test]
    fn test_crew_failure_propagates() {
        assert!(matches!(
            run_investigation(&mut FailingCrew, "q", &Details::new(), false),
            Err(Error::Generative(GenerativeError::QuotaExceeded))
        ));
    }

    #[test]
    fn test_preview_is_char_safe() {
        assert_eq!(preview("héllo", 2), "hé...");
        assert_eq!(preview("héllo", 5), "héllo");
        assert_eq!(preview("", 3), "");
    }
}
