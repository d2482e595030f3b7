//! Agent roles and task prompts.

use super::AgentProfile;
use crate::models::Details;
use serde_json::Value;

/// The agents available to a crew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    /// Investigates anomalies to find root causes.
    DataDetective,
    /// Crafts SQL to extract the data.
    SqlExpert,
}

impl AgentRole {
    pub fn name(self) -> &'static str {
        match self {
            AgentRole::DataDetective => "Data Detective",
            AgentRole::SqlExpert => "SQL Expert",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AgentRole::DataDetective => {
                "Investigates anomalies in marketing data to find root causes."
            }
            AgentRole::SqlExpert => {
                "Crafts efficient SQL queries to analyze marketing campaign data."
            }
        }
    }

    pub fn goal(self) -> &'static str {
        match self {
            AgentRole::DataDetective => {
                "Determine the cause of performance anomalies in marketing campaigns."
            }
            AgentRole::SqlExpert => "Extract relevant data through optimized SQL queries.",
        }
    }

    pub fn backstory(self) -> &'static str {
        match self {
            AgentRole::DataDetective => {
                "You are a highly skilled data analyst with expertise in marketing analytics. \
                 Your specialty is identifying the root causes of anomalies in campaign performance. \
                 You're methodical, detail-oriented, and can navigate complex datasets to find \
                 hidden patterns and insights."
            }
            AgentRole::SqlExpert => {
                "You're a database expert who specializes in writing sophisticated SQL queries. \
                 You know how to design queries that join across tables efficiently and can \
                 analyze marketing performance metrics to find meaningful patterns."
            }
        }
    }

    pub fn profile(self) -> AgentProfile {
        AgentProfile {
            role: self.name().to_string(),
            goal: self.goal().to_string(),
            backstory: self.backstory().to_string(),
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A unit of work handed to one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub description: String,
    pub expected_output: String,
}

/// Output rules appended for the SQL expert so its statements can be executed.
pub const SQL_OUTPUT_RULES: &str = "\
Put every SQL statement you want executed in its own ```sql fenced code block.
The database is SQLite: use SQLite syntax and functions.
Only the first statements are executed, so list the most informative queries first.";

/// Output rules appended for the data detective so findings can be extracted.
pub const REPORT_OUTPUT_RULES: &str = "\
Write your answer in markdown. Put each conclusion under its own level-2 heading that
starts with \"Finding\", \"Anomaly\", \"Cause\" or \"Result\" (for example
\"## Finding: CTR dropped after creative change\"), followed by the supporting evidence.";

/// The main investigation task for the data detective.
///
/// Context pairs are listed in insertion order under "Additional context".
pub fn investigation_task(user_query: &str, context: &Details) -> TaskSpec {
    let mut description = format!(
        "\
Investigate the following issue: \"{user_query}\"

Follow these steps:
1. Understand the database schema and table relationships
2. Look for relevant data in the appropriate tables
3. Query for patterns and anomalies related to the issue
4. Analyze the data to find the root cause
5. Summarize your findings with supporting evidence

IMPORTANT:
- Be data-driven - support all conclusions with data
- Be thorough in your investigation
- Consider multiple possible causes
- Prioritize findings by importance and confidence
"
    );

    if !context.is_empty() {
        description.push_str("\n\nAdditional context:\n");
        for (key, value) in context {
            description.push_str(&format!("- {}: {}\n", key, plain(value)));
        }
    }

    TaskSpec {
        description,
        expected_output: "A comprehensive analysis of the issue with findings and evidence."
            .to_string(),
    }
}

/// The data-extraction task for the SQL expert.
pub fn data_extraction_task(query_description: &str) -> TaskSpec {
    TaskSpec {
        description: format!(
            "\
Extract the data needed to answer: \"{query_description}\"

Follow these steps:
1. Understand the database schema
2. Identify relevant tables and relationships
3. Write efficient SQL queries to extract the necessary data
4. Format the results in a clear, readable way
5. Provide a brief explanation of your approach

IMPORTANT:
- Use joins efficiently
- Include proper WHERE clauses to filter relevant data
- Consider using aggregations where appropriate
- Make sure to include all relevant dimensions for analysis
"
        ),
        expected_output: "SQL query results with clear formatting and explanation.".to_string(),
    }
}

/// Full prompt for `role` working on `task`.
///
/// `material` entries become titled sections placed before the task.
pub fn agent_prompt(role: AgentRole, task: &TaskSpec, material: &[(&str, &str)]) -> String {
    let mut prompt = format!(
        "You are the {}. {}\n\n{}\n\nYour goal: {}\n",
        role.name(),
        role.description(),
        role.backstory(),
        role.goal()
    );

    for (title, body) in material {
        prompt.push_str(&format!("\n{}:\n{}\n", title, body.trim_end()));
    }

    prompt.push_str(&format!("\nTASK:\n{}\n", task.description.trim_end()));
    prompt.push_str(&format!("\nEXPECTED OUTPUT:\n{}\n", task.expected_output));

    let rules = match role {
        AgentRole::SqlExpert => SQL_OUTPUT_RULES,
        AgentRole::DataDetective => REPORT_OUTPUT_RULES,
    };
    prompt.push_str(&format!("\n{}\n", rules));
    prompt
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
