//! Runs a whole session with a simulated participant.

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::{info, instrument};

use super::experiment_session::ExperimentSession;
use super::simulated_participant::SimulatedParticipant;
use super::trial_driver::TrialDriver;
use crate::domain::models::{AlphaEstimate, TimelineItem};
use crate::services::AttentionOutcome;

/// How simulated trials consume time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Inputs carry virtual timestamps; a session runs instantly
    #[default]
    Virtual,
    /// Trials run through a [`TrialDriver`] against the wall clock
    RealTime,
}

/// Counts for one simulated block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlockStats {
    pub trials: usize,
    pub timeouts: usize,
    pub attention_checks: usize,
    pub attention_correct: usize,
}

/// Summary of a simulated session
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub session_id: String,
    pub participant_id: String,
    pub seed: u64,
    pub true_alpha: f64,
    pub estimate: AlphaEstimate,
    pub practice: BlockStats,
    pub phase1: BlockStats,
    pub phase2: BlockStats,
    pub phase1_delivered: bool,
    pub phase2_delivered: bool,
}

/// Play every block of `session` with `participant`
#[instrument(skip_all, fields(session_id = %session.session().id))]
pub async fn run_session(
    session: &mut ExperimentSession,
    participant: &mut SimulatedParticipant,
    pacing: Pacing,
) -> Result<SimulationReport> {
    let practice = run_block(session, participant, pacing).await?;
    session.finish_practice()?;

    let phase1 = run_block(session, participant, pacing).await?;
    let outcome = session.finish_phase1().await?;

    let phase2 = run_block(session, participant, pacing).await?;
    let phase2_delivery = session.finish_phase2().await?;

    let report = SimulationReport {
        session_id: session.session().id.clone(),
        participant_id: session.session().participant_id.clone(),
        seed: session.seed(),
        true_alpha: participant.alpha(),
        estimate: outcome.estimate,
        practice,
        phase1,
        phase2,
        phase1_delivered: outcome.delivery.delivered,
        phase2_delivered: phase2_delivery.delivered,
    };

    info!(
        true_alpha = report.true_alpha,
        estimated_alpha = report.estimate.alpha,
        timeouts = report.phase1.timeouts + report.phase2.timeouts,
        "simulation finished"
    );
    Ok(report)
}

async fn run_block(
    session: &mut ExperimentSession,
    participant: &mut SimulatedParticipant,
    pacing: Pacing,
) -> Result<BlockStats> {
    let mut stats = BlockStats::default();
    let (mut driver, handle) = TrialDriver::channel(16);

    while let Some(item) = session.next_item() {
        match item {
            TimelineItem::Trial(spec) => {
                let execution = session.begin_trial(spec.clone());
                let response = match pacing {
                    Pacing::Virtual => participant.respond(execution)?,
                    Pacing::RealTime => {
                        let (response, ()) =
                            tokio::join!(driver.run(execution), participant.play(&handle, &spec));
                        response?
                    }
                };
                stats.trials += 1;
                if response.timed_out {
                    stats.timeouts += 1;
                }
                session.record_response(response)?;
            }
            TimelineItem::AttentionCheck(item) => {
                let mut execution = session.begin_attention(item);
                let (answer, elapsed) = participant.answer(&execution.item().question);
                match execution.submit(&answer, elapsed) {
                    AttentionOutcome::Completed(result) => {
                        stats.attention_checks += 1;
                        if result.is_correct {
                            stats.attention_correct += 1;
                        }
                        session.record_attention(result)?;
                    }
                    AttentionOutcome::Retry | AttentionOutcome::Ignored => {
                        bail!("attention check {} was not passed", execution.item().check_number);
                    }
                }
            }
        }
    }

    Ok(stats)
}
