//! Numeric data analysis tool.
//!
//! Extracts numbers from free text, computes summary statistics, and
//! renders Markdown artifacts: a bar chart of the extracted values and a
//! table for structured rows. Both artifacts are plain Markdown so the
//! report synthesizer can inline them directly.

use crate::tools::registry::Tool;
use crate::types::{AnalysisOutcome, NumericProfile, NumericStatistics, Result};
use crate::utils::validators::extract_numbers;
use async_trait::async_trait;
use serde_json::{Map, Value, json};

/// Longest bar drawn in the Markdown chart.
const CHART_WIDTH: usize = 40;
/// At most this many values are charted.
const CHART_MAX_VALUES: usize = 20;

pub struct AnalysisTool;

impl AnalysisTool {
    fn profile(text: &str) -> NumericProfile {
        let numbers = extract_numbers(text);
        if numbers.is_empty() {
            return NumericProfile::default();
        }

        let count = numbers.len();
        let sum: f64 = numbers.iter().sum();
        let mean = sum / count as f64;

        let mut sorted = numbers.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };

        let std = if count > 1 {
            let variance =
                numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;
            variance.sqrt()
        } else {
            0.0
        };

        NumericProfile {
            statistics: NumericStatistics {
                count,
                sum,
                mean,
                median,
                min: sorted[0],
                max: sorted[count - 1],
                std,
            },
            count,
            numbers,
        }
    }
}

/// Render a horizontal bar chart of the values as a Markdown code block.
fn render_chart(numbers: &[f64]) -> String {
    let shown = &numbers[..numbers.len().min(CHART_MAX_VALUES)];
    let max_abs = shown
        .iter()
        .map(|x| x.abs())
        .fold(0.0f64, f64::max)
        .max(f64::MIN_POSITIVE);

    let mut lines = vec!["```".to_string()];
    for (i, value) in shown.iter().enumerate() {
        let width = ((value.abs() / max_abs) * CHART_WIDTH as f64).round() as usize;
        lines.push(format!("{:>3} | {} {}", i + 1, "█".repeat(width), value));
    }
    if numbers.len() > shown.len() {
        lines.push(format!("... {} more values", numbers.len() - shown.len()));
    }
    lines.push("```".to_string());
    lines.join("\n")
}

/// Render structured rows as a Markdown table, columns from the first row.
fn render_table(rows: &[Map<String, Value>]) -> Option<String> {
    let first = rows.first()?;
    let columns: Vec<&String> = first.keys().collect();
    if columns.is_empty() {
        return None;
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!(
        "| {} |",
        columns
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    ));
    lines.push(format!("|{}|", " --- |".repeat(columns.len())));
    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| match row.get(*col) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            })
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    Some(lines.join("\n"))
}

#[async_trait]
impl Tool for AnalysisTool {
    fn name(&self) -> &str {
        super::DATA_ANALYSIS
    }

    fn description(&self) -> &str {
        "Extract numbers from text, compute statistics, and render chart/table artifacts"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Free text to extract numeric data from"
                },
                "data": {
                    "type": "array",
                    "description": "Structured rows to render as a table",
                    "items": { "type": "object" }
                },
                "create_chart": {
                    "type": "boolean",
                    "description": "Whether to render a bar chart of extracted numbers",
                    "default": false
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let text = args.get("text").and_then(|v| v.as_str()).unwrap_or_default();
        let create_chart = args
            .get("create_chart")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let mut outcome = AnalysisOutcome::default();

        if !text.is_empty() {
            let profile = Self::profile(text);
            if create_chart && !profile.numbers.is_empty() {
                outcome.chart = Some(render_chart(&profile.numbers));
            }
            outcome.extracted_data = Some(profile);
        }

        if let Some(rows) = args.get("data").and_then(|v| v.as_array()) {
            let maps: Vec<Map<String, Value>> = rows
                .iter()
                .filter_map(|row| row.as_object().cloned())
                .collect();
            outcome.table = render_table(&maps);
        }

        serde_json::to_value(outcome).map_err(|e| crate::types::AppError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_computes_statistics() {
        let profile = AnalysisTool::profile("values: 1, 2, 3, 4");
        let stats = &profile.statistics;
        assert_eq!(stats.count, 4);
        assert_eq!(stats.sum, 10.0);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert!((stats.std - 1.118033988749895).abs() < 1e-9);
    }

    #[test]
    fn profile_of_numberless_text_is_empty() {
        let profile = AnalysisTool::profile("no digits here");
        assert_eq!(profile.count, 0);
        assert!(profile.numbers.is_empty());
    }

    #[test]
    fn single_value_has_zero_std() {
        let profile = AnalysisTool::profile("just 7");
        assert_eq!(profile.statistics.std, 0.0);
        assert_eq!(profile.statistics.median, 7.0);
    }

    #[test]
    fn chart_is_fenced_and_bounded() {
        let chart = render_chart(&[1.0, 2.0, 4.0]);
        assert!(chart.starts_with("```"));
        assert!(chart.ends_with("```"));
        // The largest value gets the full bar width.
        assert!(chart.contains(&"█".repeat(CHART_WIDTH)));
    }

    #[test]
    fn table_renders_columns_from_first_row() {
        let rows: Vec<Map<String, Value>> = vec![
            serde_json::from_value(json!({"name": "a", "count": 1})).unwrap(),
            serde_json::from_value(json!({"name": "b", "count": 2})).unwrap(),
        ];
        let table = render_table(&rows).unwrap();
        assert!(table.contains("| count | name |") || table.contains("| name | count |"));
        assert!(table.contains("| --- |"));
        assert!(table.lines().count() >= 4);
    }

    #[tokio::test]
    async fn execute_builds_chart_when_requested() {
        let tool = AnalysisTool;
        let value = tool
            .execute(json!({"text": "1 and 2 and 3", "create_chart": true}))
            .await
            .unwrap();
        let outcome: AnalysisOutcome = serde_json::from_value(value).unwrap();
        assert!(outcome.chart.is_some());
        assert_eq!(outcome.extracted_data.unwrap().count, 3);
    }

    #[tokio::test]
    async fn execute_without_inputs_is_empty() {
        let tool = AnalysisTool;
        let value = tool.execute(json!({})).await.unwrap();
        let outcome: AnalysisOutcome = serde_json::from_value(value).unwrap();
        assert!(outcome.extracted_data.is_none());
        assert!(outcome.chart.is_none());
        assert!(outcome.table.is_none());
    }
}
