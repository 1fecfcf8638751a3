//! Session orchestration across the survey's phases.
//!
//! `ExperimentSession` owns the participant's [`Session`], the seeded
//! sequencer and the timelines. It hands out one timeline item at a time,
//! records what comes back, and runs the synchronous batch steps between
//! phases: commit Phase 1, estimate alpha, generate and sequence Phase 2.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AlphaEstimate, AttentionCheckItem, AttentionCheckResult, CommitReceipt, CommittedBatch,
    Config, Session, SessionPhase, SurveyPhase, Timeline, TimelineItem, TrialResponse, TrialSpec,
};
use crate::domain::ports::{Clock, ResponseSink, SystemClock};
use crate::infrastructure::config::ConfigLoader;
use crate::services::{
    AlphaEstimator, AttentionExecution, CombinationGenerator, Phase2Generator, TimelineSequencer,
    TrialExecution,
};

/// Outcome of handing a committed block to the sink
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub receipt: CommitReceipt,
    /// Whether the sink accepted the batch; the block is committed either way
    pub delivered: bool,
    pub error: Option<String>,
}

/// Result of closing Phase 1
#[derive(Debug, Clone, PartialEq)]
pub struct Phase1Outcome {
    pub delivery: Delivery,
    pub estimate: AlphaEstimate,
    pub phase2_trials: usize,
}

/// One participant's run through the survey
pub struct ExperimentSession {
    config: Config,
    session: Session,
    sequencer: TimelineSequencer,
    practice: Timeline,
    phase1: Timeline,
    phase2: Timeline,
    cursor: usize,
    clock: Arc<dyn Clock>,
    sink: Option<Arc<dyn ResponseSink>>,
}

impl ExperimentSession {
    /// Validate the configuration and build the practice and Phase 1 timelines
    pub fn start(config: Config, participant_id: Option<String>, seed: Option<u64>) -> DomainResult<Self> {
        Self::start_with_clock(config, participant_id, seed, Arc::new(SystemClock))
    }

    /// Start a session whose start and commit stamps come from `clock`
    #[instrument(skip(config, clock))]
    pub fn start_with_clock(
        config: Config,
        participant_id: Option<String>,
        seed: Option<u64>,
        clock: Arc<dyn Clock>,
    ) -> DomainResult<Self> {
        ConfigLoader::validate(&config).map_err(|e| DomainError::Config(e.to_string()))?;

        let participant_id = participant_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let session = Session::started_at(participant_id, clock.now());

        let policy = config.experiment.sampling_policy;
        let mut sequencer = match seed {
            Some(seed) => TimelineSequencer::new(seed, policy),
            None => TimelineSequencer::from_entropy(policy),
        };

        let pool = CombinationGenerator::new().phase1(&config.phase1);
        let practice = sequencer.practice_timeline(&pool, config.experiment.practice_trials)?;
        let phase1 = sequencer.main_timeline(
            &pool,
            config.experiment.main_trials,
            &config.attention_check_questions,
            config.experiment.attention_checks,
        )?;

        info!(
            session_id = %session.id,
            participant_id = %session.participant_id,
            seed = sequencer.seed(),
            practice = practice.len(),
            phase1 = phase1.len(),
            "session started"
        );

        Ok(Self {
            config,
            session,
            sequencer,
            practice,
            phase1,
            phase2: Timeline::default(),
            cursor: 0,
            clock,
            sink: None,
        })
    }

    /// Deliver committed blocks to `sink`
    pub fn with_sink(mut self, sink: Arc<dyn ResponseSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase
    }

    pub fn seed(&self) -> u64 {
        self.sequencer.seed()
    }

    /// Timeline of a block; Phase 2 is empty until Phase 1 closes
    pub fn timeline(&self, phase: SurveyPhase) -> &Timeline {
        match phase {
            SurveyPhase::Practice => &self.practice,
            SurveyPhase::Phase1 => &self.phase1,
            SurveyPhase::Phase2 => &self.phase2,
        }
    }

    fn active_timeline(&self) -> Option<&Timeline> {
        self.session.phase.accepting().map(|block| self.timeline(block))
    }

    /// Next item of the running block, `None` once the block is exhausted
    pub fn next_item(&mut self) -> Option<TimelineItem> {
        let item = self.active_timeline()?.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(item)
    }

    /// Start executing a trial of the running block
    pub fn begin_trial(&self, spec: TrialSpec) -> TrialExecution {
        let total = self
            .active_timeline()
            .map_or(0, Timeline::trial_count);
        let experiment = &self.config.experiment;
        TrialExecution::new(spec, self.trial_duration())
            .with_total(total)
            .with_layout(experiment.bar_sizes, experiment.font_sizes)
    }

    /// Start executing an attention check of the running block
    pub fn begin_attention(&self, item: AttentionCheckItem) -> AttentionExecution {
        AttentionExecution::new(item, self.config.experiment.require_correct_attention)
    }

    pub fn trial_duration(&self) -> Duration {
        Duration::from_millis(self.config.experiment.trial_duration_ms)
    }

    /// Record a finished trial, returning its sequence number
    pub fn record_response(&mut self, response: TrialResponse) -> DomainResult<u32> {
        self.session.record_response(response)
    }

    pub fn record_attention(&mut self, result: AttentionCheckResult) -> DomainResult<()> {
        self.session.record_attention(result)
    }

    /// Leave practice; practice responses are never persisted
    pub fn finish_practice(&mut self) -> DomainResult<()> {
        self.session.transition_to(SessionPhase::Phase1)?;
        self.cursor = 0;
        info!(session_id = %self.session.id, "practice finished");
        Ok(())
    }

    /// Commit Phase 1, estimate alpha, and sequence the personalized block
    #[instrument(skip(self), fields(session_id = %self.session.id))]
    pub async fn finish_phase1(&mut self) -> DomainResult<Phase1Outcome> {
        if self.session.phase != SessionPhase::Phase1 {
            return Err(DomainError::PhaseOrder {
                phase: self.session.phase.to_string(),
                reason: "phase 1 is not running".to_string(),
            });
        }

        let batch = self.session.commit(SurveyPhase::Phase1, self.clock.now())?;
        let delivery = self.deliver(batch).await;

        let estimate = AlphaEstimator::from_choices(self.session.phase1_choices()).estimate();
        let candidates = Phase2Generator::from_estimate(&estimate).generate(&self.config.phase2);
        self.phase2 = self
            .sequencer
            .phase2_timeline(&candidates, self.config.experiment.phase2_trials)?;
        let phase2_trials = self.phase2.len();

        self.session.set_estimate(estimate, candidates)?;
        self.session.transition_to(SessionPhase::Phase2)?;
        self.cursor = 0;

        info!(
            alpha = estimate.alpha,
            confidence = estimate.confidence,
            choices = estimate.choices_analyzed,
            phase2_trials,
            "phase 1 finished"
        );

        Ok(Phase1Outcome {
            delivery,
            estimate,
            phase2_trials,
        })
    }

    /// Commit Phase 2 and close the session
    #[instrument(skip(self), fields(session_id = %self.session.id))]
    pub async fn finish_phase2(&mut self) -> DomainResult<Delivery> {
        self.session.transition_to(SessionPhase::Finished)?;
        let batch = self.session.commit(SurveyPhase::Phase2, self.clock.now())?;
        let delivery = self.deliver(batch).await;
        info!(records = delivery.receipt.records, "session finished");
        Ok(delivery)
    }

    async fn deliver(&self, batch: CommittedBatch) -> Delivery {
        let CommittedBatch {
            receipt,
            records,
            attention_results,
        } = batch;

        let Some(sink) = &self.sink else {
            return Delivery {
                receipt,
                delivered: false,
                error: None,
            };
        };

        let mut result = sink.write_batch(&receipt, &records).await;
        if result.is_ok() && !attention_results.is_empty() {
            result = sink.write_attention(&receipt, &attention_results).await;
        }

        match result {
            Ok(()) => Delivery {
                receipt,
                delivered: true,
                error: None,
            },
            Err(e) => {
                warn!(phase = receipt.phase.as_str(), error = %e, "sink rejected committed batch");
                Delivery {
                    receipt,
                    delivered: false,
                    error: Some(format!("{e:#}")),
                }
            }
        }
    }
}
