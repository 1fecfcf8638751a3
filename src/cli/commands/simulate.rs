//! Simulated end-to-end session.

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use crate::application::{run_session, ExperimentSession, Pacing, SimulatedParticipant, SimulationReport};
use crate::cli::output::{field, heading, output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::storage::JsonlSink;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Utility curvature of the simulated participant
    #[arg(short, long, default_value_t = 0.75)]
    pub alpha: f64,

    /// Seed for both the sequencer and the participant
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Participant identifier; a random UUID when omitted
    #[arg(short, long)]
    pub participant: Option<String>,

    /// Append committed records to this JSON Lines file
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Probability of letting a timed trial expire
    #[arg(long, default_value_t = 0.0)]
    pub lapse_rate: f64,

    /// Run trials against the wall clock instead of a virtual one
    #[arg(long)]
    pub realtime: bool,
}

impl CommandOutput for SimulationReport {
    fn to_human(&self) -> String {
        let block = |name: &str, stats: &crate::application::BlockStats| {
            field(
                name,
                format!(
                    "{} trials, {} timed out, {}/{} attention checks correct",
                    stats.trials, stats.timeouts, stats.attention_correct, stats.attention_checks
                ),
            )
        };
        [
            heading("Simulated session"),
            field("Session", &self.session_id),
            field("Participant", &self.participant_id),
            field("Seed", self.seed),
            field("True alpha", format!("{:.2}", self.true_alpha)),
            field(
                "Estimated alpha",
                format!("{:.2} (confidence {:.1})", self.estimate.alpha, self.estimate.confidence),
            ),
            block("Practice", &self.practice),
            block("Phase 1", &self.phase1),
            block("Phase 2", &self.phase2),
            field(
                "Delivered",
                format!("phase1={} phase2={}", self.phase1_delivered, self.phase2_delivered),
            ),
        ]
        .join("\n")
    }
}

fn validate(args: &SimulateArgs) -> Result<()> {
    if !args.alpha.is_finite() || args.alpha <= 0.0 {
        bail!("alpha must be a positive number, got {}", args.alpha);
    }
    if !args.lapse_rate.is_finite() || !(0.0..=1.0).contains(&args.lapse_rate) {
        bail!("lapse rate must be between 0 and 1, got {}", args.lapse_rate);
    }
    Ok(())
}

pub async fn execute(args: SimulateArgs, config: Config, json_mode: bool) -> Result<()> {
    validate(&args)?;
    let mut session = ExperimentSession::start(config, args.participant, args.seed)?;
    if let Some(path) = &args.out {
        session = session.with_sink(Arc::new(JsonlSink::open(path).await?));
    }

    let participant_seed = args.seed.unwrap_or_else(rand::random);
    let mut participant =
        SimulatedParticipant::new(args.alpha, participant_seed).with_lapse_rate(args.lapse_rate);
    let pacing = if args.realtime {
        Pacing::RealTime
    } else {
        Pacing::Virtual
    };

    let report = run_session(&mut session, &mut participant, pacing).await?;
    output(&report, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(alpha: f64, lapse_rate: f64) -> SimulateArgs {
        SimulateArgs {
            alpha,
            seed: Some(1),
            participant: None,
            out: None,
            lapse_rate,
            realtime: false,
        }
    }

    #[test]
    fn test_accepts_defaults() {
        assert!(validate(&args(0.75, 0.0)).is_ok());
        assert!(validate(&args(1.2, 1.0)).is_ok());
    }

    #[test]
    fn test_rejects_bad_alpha() {
        for alpha in [f64::NAN, f64::INFINITY, 0.0, -0.5] {
            let err = validate(&args(alpha, 0.0)).unwrap_err();
            assert!(err.to_string().contains("alpha"));
        }
    }

    #[test]
    fn test_rejects_bad_lapse_rate() {
        for lapse_rate in [f64::NAN, f64::NEG_INFINITY, -0.1, 1.5] {
            let err = validate(&args(0.75, lapse_rate)).unwrap_err();
            assert!(err.to_string().contains("lapse rate"));
        }
    }

    #[tokio::test]
    async fn test_execute_rejects_nan_lapse_rate() {
        let result = execute(args(0.75, f64::NAN), Config::default(), true).await;
        assert!(result.is_err());
    }
}
