//! A two-agent crew that runs its agents one after the other.
//!
//! 1. The SQL expert sees the schema summary and answers with fenced SQL,
//!    which is executed through [`SqlTool`].
//! 2. The data detective sees the schema, the expert's report with query
//!    results, and a preliminary anomaly analysis, and writes the final answer.

use super::roles::{AgentRole, agent_prompt, data_extraction_task, investigation_task};
use super::{Crew, CrewObserver};
use crate::Result;
use crate::config::resolver::DEFAULT_MAX_QUERIES;
use crate::db::Database;
use crate::gemini::TextGenerator;
use crate::models::Details;
use crate::tools::sql::format_outcome;
use crate::tools::{SchemaTool, SqlTool, SummarizerTool};
use serde_json::{Value, json};

pub struct SequentialCrew<'a, G> {
    db: &'a Database,
    generator: G,
    query: String,
    context: Details,
    max_queries: usize,
}

impl<'a, G: TextGenerator> SequentialCrew<'a, G> {
    pub fn new(db: &'a Database, generator: G, query: impl Into<String>, context: Details) -> Self {
        Self {
            db,
            generator,
            query: query.into(),
            context,
            max_queries: DEFAULT_MAX_QUERIES,
        }
    }

    /// Cap on SQL statements executed from the expert's answer.
    pub fn with_max_queries(mut self, max_queries: usize) -> Self {
        self.max_queries = max_queries;
        self
    }

    fn context_text(&self) -> Option<String> {
        if self.context.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .context
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("{}: {}", key, s),
                other => format!("{}: {}", key, other),
            })
            .collect();
        Some(lines.join("\n"))
    }
}

impl<G: TextGenerator> Crew for SequentialCrew<'_, G> {
    fn kickoff(&mut self, observer: &mut dyn CrewObserver) -> Result<String> {
        let sql_tool = SqlTool::new(self.db)?;
        let schema_tool = SchemaTool::new(self.db)?;

        let expert = AgentRole::SqlExpert.profile();
        observer.on_agent_start(&expert);

        let schema = schema_tool.schema_summary();
        observer.on_tool_use(
            &expert,
            "schema_summary",
            "",
            !schema.starts_with("Error generating schema summary"),
        );

        let prompt = agent_prompt(
            AgentRole::SqlExpert,
            &data_extraction_task(&self.query),
            &[("DATABASE SCHEMA", &schema)],
        );
        let answer = self.generator.generate(&prompt)?;

        let mut query_report = String::new();
        let mut rows = Vec::new();
        for (i, sql) in sql_blocks(&answer).into_iter().take(self.max_queries).enumerate() {
            let outcome = sql_tool.run(&sql, None);
            observer.on_tool_use(&expert, "sql_query", &sql, outcome.success);
            if !outcome.success {
                tracing::warn!(
                    error = outcome.error.as_deref().unwrap_or_default(),
                    "SQL expert query failed"
                );
            }

            query_report.push_str(&format!(
                "### Query {}\n\n```sql\n{}\n```\n\n{}\n\n",
                i + 1,
                sql,
                format_outcome(&outcome)
            ));
            if outcome.success && outcome.row_count > 0 {
                rows.push(json!({ "query": sql, "rows": outcome.data }));
            }
        }

        let expert_output = if query_report.is_empty() {
            answer
        } else {
            format!("{}\n\n## Query Results\n\n{}", answer.trim_end(), query_report.trim_end())
        };
        observer.on_agent_end(&expert, &expert_output);

        let detective = AgentRole::DataDetective.profile();
        observer.on_agent_start(&detective);

        let analysis = if rows.is_empty() {
            None
        } else {
            let summarizer = SummarizerTool::new(&self.generator);
            let text = summarizer.investigate_anomaly(
                &Value::Array(rows),
                &self.query,
                self.context_text().as_deref(),
            );
            let ok = !text.starts_with("Error generating summary");
            observer.on_tool_use(&detective, "investigate_anomaly", &self.query, ok);
            Some(text)
        };

        let mut material = vec![
            ("DATABASE SCHEMA", schema.as_str()),
            ("SQL EXPERT REPORT", expert_output.as_str()),
        ];
        if let Some(analysis) = &analysis {
            material.push(("PRELIMINARY ANALYSIS", analysis.as_str()));
        }

        let prompt = agent_prompt(
            AgentRole::DataDetective,
            &investigation_task(&self.query, &self.context),
            &material,
        );
        let result = self.generator.generate(&prompt)?;
        observer.on_agent_end(&detective, &result);

        Ok(result)
    }
}

/// Bodies of ```sql fenced blocks, in order, skipping empty ones.
pub fn sql_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        match current.as_mut() {
            None => {
                if let Some(lang) = trimmed.strip_prefix("```") {
                    if lang.trim().eq_ignore_ascii_case("sql") {
                        current = Some(Vec::new());
                    }
                }
            }
            Some(lines) => {
                if trimmed.starts_with("```") {
                    let body = lines.join("\n").trim().to_string();
                    if !body.is_empty() {
                        blocks.push(body);
                    }
                    current = None;
                } else {
                    lines.push(line);
                }
            }
        }
    }
    blocks
}
