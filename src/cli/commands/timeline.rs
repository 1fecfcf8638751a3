//! Timeline preview command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::application::ExperimentSession;
use crate::cli::output::{field, heading, list_table, output, CommandOutput};
use crate::domain::models::{Config, OptionKind, SurveyPhase, Timeline, TimelineItem};

#[derive(Args, Debug)]
pub struct TimelineArgs {
    /// Seed for the sequencer; random when omitted
    #[arg(short, long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct TimelineRow {
    pub position: usize,
    pub kind: &'static str,
    pub label: String,
    pub risk_probability: Option<u8>,
    pub risk_reward: Option<u64>,
    pub safe_reward: Option<u64>,
    pub size_condition: Option<&'static str>,
    pub risk_side: Option<&'static str>,
}

impl TimelineRow {
    fn from_item(position: usize, item: &TimelineItem) -> Self {
        match item {
            TimelineItem::Trial(spec) => Self {
                position,
                kind: "trial",
                label: spec.trial_number.to_string(),
                risk_probability: Some(spec.condition.risk_probability),
                risk_reward: Some(spec.condition.risk_reward),
                safe_reward: Some(spec.condition.safe_reward),
                size_condition: Some(spec.size_condition.as_str()),
                risk_side: Some(spec.side_of(OptionKind::Risk).as_str()),
            },
            TimelineItem::AttentionCheck(check) => Self {
                position,
                kind: "attention",
                label: format!("check {} ({})", check.check_number, check.question.kind.as_str()),
                risk_probability: None,
                risk_reward: None,
                safe_reward: None,
                size_condition: None,
                risk_side: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TimelineOutput {
    pub seed: u64,
    pub practice: Vec<TimelineRow>,
    pub phase1: Vec<TimelineRow>,
}

fn rows(timeline: &Timeline) -> Vec<TimelineRow> {
    timeline
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| TimelineRow::from_item(i + 1, item))
        .collect()
}

fn render(rows: &[TimelineRow]) -> String {
    let mut table = list_table(&["#", "item", "p", "risky", "safe", "sizes", "risk side"]);
    let dash = || "-".to_string();
    for row in rows {
        table.add_row(vec![
            row.position.to_string(),
            row.label.clone(),
            row.risk_probability.map_or_else(dash, |p| format!("{p}%")),
            row.risk_reward.map_or_else(dash, |r| r.to_string()),
            row.safe_reward.map_or_else(dash, |r| r.to_string()),
            row.size_condition.map_or_else(dash, str::to_string),
            row.risk_side.map_or_else(dash, str::to_string),
        ]);
    }
    table.to_string()
}

impl CommandOutput for TimelineOutput {
    fn to_human(&self) -> String {
        [
            field("Seed", self.seed),
            String::new(),
            heading(&format!("Practice ({} items)", self.practice.len())),
            render(&self.practice),
            String::new(),
            heading(&format!("Phase 1 ({} items)", self.phase1.len())),
            render(&self.phase1),
        ]
        .join("\n")
    }
}

pub fn execute(args: TimelineArgs, config: Config, json_mode: bool) -> Result<()> {
    let session = ExperimentSession::start(config, Some("preview".to_string()), args.seed)?;

    let result = TimelineOutput {
        seed: session.seed(),
        practice: rows(session.timeline(SurveyPhase::Practice)),
        phase1: rows(session.timeline(SurveyPhase::Phase1)),
    };
    output(&result, json_mode);
    Ok(())
}
