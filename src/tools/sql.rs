//! SQL execution tool for agents.
//!
//! Statement failures never escape as errors: [`SqlTool::run`] returns a
//! [`QueryOutcome`] with `success == false` and callers check the flag.

use crate::db::{Database, QueryRows};
use crate::models::Details;
use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;

/// Rows shown in a result preview.
pub const PREVIEW_ROWS: usize = 10;

/// Message for statements that return no rows.
pub const NO_RESULTS_MESSAGE: &str = "Query executed successfully, but no results were returned.";

/// Summary statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStatistics {
    pub column: String,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

/// Structured result of running one statement.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QueryOutcome {
    pub success: bool,
    pub row_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Details>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub statistics: Vec<ColumnStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl QueryOutcome {
    fn failure(query: &str, error: impl ToString) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            query: Some(query.to_string()),
            ..Default::default()
        }
    }

    fn from_rows(rows: QueryRows) -> Self {
        if rows.rows.is_empty() {
            return Self {
                success: true,
                message: Some(NO_RESULTS_MESSAGE.to_string()),
                ..Default::default()
            };
        }

        Self {
            success: true,
            row_count: rows.rows.len(),
            preview: Some(markdown_table(&rows.columns, &rows.rows[..rows.rows.len().min(PREVIEW_ROWS)])),
            statistics: column_statistics(&rows),
            data: rows.records(),
            columns: rows.columns,
            ..Default::default()
        }
    }
}

/// Runs SQL against the campaign database on behalf of an agent.
pub struct SqlTool<'a> {
    db: &'a Database,
}

impl<'a> SqlTool<'a> {
    /// Create the tool, failing if the database does not answer.
    pub fn new(db: &'a Database) -> Result<Self> {
        if !db.test_connection() {
            return Err(Error::Connection {
                path: db.path().to_path_buf(),
                reason: "Failed to connect to the database. Please check your connection settings."
                    .to_string(),
            });
        }
        Ok(Self { db })
    }

    /// Execute `query` and describe the result.
    pub fn run(&self, query: &str, params: Option<&Details>) -> QueryOutcome {
        match self.db.execute(query, params) {
            Ok(rows) => QueryOutcome::from_rows(rows),
            Err(e) => {
                tracing::debug!(error = %e, "query failed");
                QueryOutcome::failure(query, e)
            }
        }
    }

    /// Execute `query` and render the outcome as markdown.
    pub fn run_and_format(&self, query: &str, params: Option<&Details>) -> String {
        format_outcome(&self.run(query, params))
    }
}

/// Markdown rendering of an outcome, as shown to agents and in reports.
pub fn format_outcome(outcome: &QueryOutcome) -> String {
    if !outcome.success {
        return format!("Query error: {}", outcome.error.as_deref().unwrap_or("unknown error"));
    }
    if outcome.row_count == 0 {
        return NO_RESULTS_MESSAGE.to_string();
    }

    let mut output = format!("Query returned {} rows\n\n", outcome.row_count);
    output.push_str(outcome.preview.as_deref().unwrap_or_default());

    if !outcome.statistics.is_empty() {
        output.push_str("\n\n**Basic Statistics:**\n");
        for s in &outcome.statistics {
            output.push_str(&format!(
                "\n- **{}**: min={:.4}, max={:.4}, mean={:.4}, median={:.4}",
                s.column, s.min, s.max, s.mean, s.median
            ));
        }
    }
    output
}

fn markdown_table(columns: &[String], rows: &[Vec<Value>]) -> String {
    let mut table = format!("| {} |\n", columns.join(" | "));
    table.push_str(&format!("|{}|\n", vec!["---"; columns.len()].join("|")));
    for row in rows {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        table.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    table.truncate(table.trim_end().len());
    table
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.replace('|', "\\|").replace('\n', " "),
        other => other.to_string(),
    }
}

/// Columns whose non-null cells are all numbers, with at least one number.
fn column_statistics(rows: &QueryRows) -> Vec<ColumnStatistics> {
    rows.columns
        .iter()
        .enumerate()
        .filter_map(|(i, column)| {
            let mut values = Vec::with_capacity(rows.rows.len());
            for row in &rows.rows {
                match row.get(i) {
                    Some(Value::Null) | None => {}
                    Some(Value::Number(n)) => values.push(n.as_f64()?),
                    Some(_) => return None,
                }
            }
            stats_for(column, values)
        })
        .collect()
}

fn stats_for(column: &str, mut values: Vec<f64>) -> Option<ColumnStatistics> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let n = values.len();
    let median = if n % 2 == 0 {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    } else {
        values[n / 2]
    };

    Some(ColumnStatistics {
        column: column.to_string(),
        min: values[0],
        max: values[n - 1],
        mean: values.iter().sum::<f64>() / n as f64,
        median,
    })
}
