//! Phase 2 trial generation for a given alpha.

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{field, heading, list_table, output, CommandOutput};
use crate::domain::models::{Config, Phase2Config, Phase2TrialSpec};
use crate::services::Phase2Generator;

#[derive(Args, Debug)]
pub struct Phase2Args {
    /// Utility curvature to personalize for
    #[arg(short, long, default_value_t = 0.75)]
    pub alpha: f64,

    /// Use the full six-amount design instead of the configured amounts
    #[arg(long, conflicts_with = "conditions")]
    pub full: bool,

    /// Use only the first N configured risky amounts
    #[arg(long)]
    pub conditions: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct Phase2Output {
    pub alpha: f64,
    pub trials: Vec<Phase2TrialSpec>,
}

impl CommandOutput for Phase2Output {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "combo", "risky", "p", "ev", "ip", "safe"]);
        for trial in &self.trials {
            table.add_row(vec![
                trial.trial_id.to_string(),
                trial.combination_id.to_string(),
                trial.risky_amount.to_string(),
                format!("{}%", trial.risky_probability),
                trial.risky_ev.to_string(),
                trial.indifference_point.to_string(),
                trial.safe_amount.to_string(),
            ]);
        }
        [
            heading(&format!("Phase 2 trials ({})", self.trials.len())),
            field("Alpha", format!("{:.2}", self.alpha)),
            String::new(),
            table.to_string(),
        ]
        .join("\n")
    }
}

pub fn execute(args: Phase2Args, config: &Config, json_mode: bool) -> Result<()> {
    if !args.alpha.is_finite() || args.alpha <= 0.0 {
        bail!("alpha must be a positive number, got {}", args.alpha);
    }

    let phase2 = if args.full {
        Phase2Config::full()
    } else {
        Phase2Config {
            conditions: args.conditions.or(config.phase2.conditions),
            ..config.phase2.clone()
        }
    };

    let generator = Phase2Generator::new(args.alpha);
    let result = Phase2Output {
        alpha: generator.alpha(),
        trials: generator.generate(&phase2),
    };
    output(&result, json_mode);
    Ok(())
}
