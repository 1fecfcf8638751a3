//! Alpha estimation from recorded choices.

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::output::{field, heading, list_table, output, CommandOutput};
use crate::domain::models::{AlphaEstimate, ChoiceRecord, ChoiceSummary, ResponseRecord};
use crate::services::alpha_estimator::alpha_grid;
use crate::services::AlphaEstimator;

#[derive(Args, Debug)]
pub struct EstimateArgs {
    /// JSON array of choices or response records, or a JSON Lines file
    /// written by `simulate --out`
    pub file: PathBuf,

    /// Include the log-likelihood at every grid point
    #[arg(long)]
    pub curve: bool,
}

#[derive(Debug, Serialize)]
pub struct GridPoint {
    pub alpha: f64,
    pub log_likelihood: f64,
}

#[derive(Debug, Serialize)]
pub struct EstimateOutput {
    pub estimate: AlphaEstimate,
    pub profile: String,
    pub summary: Option<ChoiceSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub curve: Vec<GridPoint>,
}

impl CommandOutput for EstimateOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            heading("Risk preference estimate"),
            field("Alpha", format!("{:.2}", self.estimate.alpha)),
            field("Confidence", format!("{:.1}", self.estimate.confidence)),
            field("Choices analyzed", self.estimate.choices_analyzed),
            field("Log-likelihood", format!("{:.3}", self.estimate.log_likelihood)),
            field("Profile", &self.profile),
        ];
        if self.estimate.is_fallback() {
            lines.push("No valid choices; using the default alpha.".to_string());
        }
        if let Some(summary) = &self.summary {
            lines.push(field(
                "Risky choices",
                format!(
                    "{}/{} ({:.1}%)",
                    summary.risky_choices, summary.total_choices, summary.percent_risky
                ),
            ));
            lines.push(field("Average confidence", format!("{:.1}", summary.avg_confidence)));
        }
        if !self.curve.is_empty() {
            let mut table = list_table(&["alpha", "log-likelihood"]);
            for point in &self.curve {
                table.add_row(vec![
                    format!("{:.2}", point.alpha),
                    format!("{:.4}", point.log_likelihood),
                ]);
            }
            lines.push(String::new());
            lines.push(table.to_string());
        }
        lines.join("\n")
    }
}

/// Read choices from either accepted file layout
pub fn parse_choices(contents: &str) -> Result<Vec<ChoiceRecord>> {
    if contents.trim_start().starts_with('[') {
        if let Ok(choices) = serde_json::from_str::<Vec<ChoiceRecord>>(contents) {
            return Ok(choices);
        }
        let records: Vec<ResponseRecord> =
            serde_json::from_str(contents).context("Failed to parse choice or record array")?;
        return Ok(records.iter().filter_map(ChoiceRecord::from_record).collect());
    }

    let mut choices = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(line)
            .with_context(|| format!("Invalid JSON on line {}", index + 1))?;
        if value.get("kind").and_then(serde_json::Value::as_str) != Some("response") {
            continue;
        }
        let record: ResponseRecord = serde_json::from_value(value)
            .with_context(|| format!("Invalid response record on line {}", index + 1))?;
        choices.extend(ChoiceRecord::from_record(&record));
    }
    Ok(choices)
}

pub async fn execute(args: EstimateArgs, json_mode: bool) -> Result<()> {
    let contents = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    if contents.trim().is_empty() {
        bail!("{} is empty", args.file.display());
    }
    let choices = parse_choices(&contents)?;

    let estimator = AlphaEstimator::from_choices(choices);
    let estimate = estimator.estimate();
    let curve = if args.curve && !estimator.choices().is_empty() {
        alpha_grid()
            .map(|alpha| GridPoint {
                alpha,
                log_likelihood: estimator.log_likelihood(alpha),
            })
            .collect()
    } else {
        Vec::new()
    };

    let result = EstimateOutput {
        profile: estimate.profile().description().to_string(),
        summary: estimator.summary(),
        estimate,
        curve,
    };
    output(&result, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice_array() {
        let choices = parse_choices(
            r#"[{"risky_amount": 300, "risky_probability": 75, "safe_amount": 50, "chose_risky": true, "confidence": null}]"#,
        )
        .unwrap();
        assert_eq!(choices.len(), 1);
        assert!(choices[0].chose_risky);
    }

    #[test]
    fn test_jsonl_skips_non_response_lines() {
        let contents = "{\"kind\":\"batch\",\"receipt\":{}}\n\n{\"kind\":\"attention\"}\n";
        assert!(parse_choices(contents).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_line_reports_position() {
        let err = parse_choices("{\"kind\":\"batch\"}\nnot json").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }
}
