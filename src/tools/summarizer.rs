//! Generative summaries of query results.
//!
//! Generation failures are folded into the returned text so an agent sees
//! them inline instead of aborting the run.

use crate::gemini::TextGenerator;
use serde_json::Value;

const DEFAULT_PROMPT: &str = "\
You are a data analyst specialized in marketing and sales data.
Analyze the following data and provide a clear, concise summary of the key insights.
Focus on identifying anomalies, trends, and potential root causes.

If there are any significant changes or anomalies, highlight those and suggest possible explanations.

Format your response as markdown with sections for:
1. Summary - A brief overview of what you found
2. Key Metrics - Important numbers and their significance
3. Anomalies - Any unusual patterns or outliers
4. Possible Causes - Plausible explanations for the findings
5. Recommendations - Suggested next steps or areas to investigate further

DATA:
{data}
";

/// Placeholder replaced by the data in every prompt.
pub const DATA_PLACEHOLDER: &str = "{data}";

pub struct SummarizerTool<G> {
    generator: G,
}

impl<G: TextGenerator> SummarizerTool<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Summarize `data` with the default analyst prompt or `custom_prompt`.
    ///
    /// Strings are inserted verbatim; any other value as pretty JSON.
    pub fn summarize(&self, data: &Value, custom_prompt: Option<&str>, context: Option<&str>) -> String {
        let data_text = match data {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };

        let mut prompt = custom_prompt.unwrap_or(DEFAULT_PROMPT).to_string();
        if let Some(context) = context.filter(|c| !c.is_empty()) {
            prompt = format!("{}\n\nADDITIONAL CONTEXT:\n{}", prompt, context);
        }
        let prompt = prompt.replace(DATA_PLACEHOLDER, &data_text);

        match self.generator.generate(&prompt) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "summary generation failed");
                format!("Error generating summary: {}", e)
            }
        }
    }

    /// Look for changes above `threshold` (a fraction) in periodic metrics.
    pub fn analyze_metrics(
        &self,
        metrics: &Value,
        time_period: &str,
        focus_area: Option<&str>,
        threshold: f64,
    ) -> String {
        let focus = focus_area
            .map(|area| format!("Focus specifically on analyzing {}.", area))
            .unwrap_or_default();
        let prompt = format!(
            "\
You are a marketing analyst specializing in campaign performance metrics.

Analyze the following {time_period} metrics data and identify:
1. Any significant changes (>{pct}% change) in key metrics
2. Trends over time
3. Correlations between different metrics
4. Possible root causes for performance changes

{focus}

Format your response as markdown with sections for:
1. Summary - A brief overview of what you found
2. Key Anomalies - Significant changes or unusual patterns
3. Trends - How metrics changed over time
4. Correlations - Relationships between different metrics
5. Root Cause Analysis - Likely explanations for the findings

DATA:
{DATA_PLACEHOLDER}
",
            pct = threshold * 100.0,
        );
        self.summarize(metrics, Some(&prompt), None)
    }

    /// Ask for a ranked root-cause analysis of one described anomaly.
    pub fn investigate_anomaly(
        &self,
        data: &Value,
        anomaly_description: &str,
        related_context: Option<&str>,
    ) -> String {
        let prompt = format!(
            "\
You are a data detective specializing in marketing and sales analytics.

ANOMALY TO INVESTIGATE:
{anomaly_description}

Analyze the provided data to determine the most likely root cause of this anomaly.
Consider different factors such as:
- Technical factors (tracking issues, data collection problems)
- Campaign changes (creative changes, targeting adjustments)
- External factors (seasonality, competition, market conditions)
- User behavior changes

Format your response as markdown with sections for:
1. Summary - What you discovered about the anomaly
2. Evidence - What data points support your findings
3. Root Cause Analysis - Most likely causes ranked by probability
4. Confidence Level - How confident you are in the assessment
5. Recommended Actions - What steps should be taken next

DATA:
{DATA_PLACEHOLDER}
"
        );
        self.summarize(data, Some(&prompt), related_context)
    }
}
