//! Domain model for a participant session.
//!
//! A session exclusively owns everything produced for one participant: the
//! per-phase response logs, attention-check results, the alpha estimate and
//! the generated Phase 2 set. Logs are append-only until committed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::attention::AttentionCheckResult;
use super::estimate::{AlphaEstimate, ChoiceRecord};
use super::phase2::Phase2TrialSpec;
use super::response::{ResponseRecord, SurveyPhase, TrialResponse};
use crate::domain::errors::{DomainError, DomainResult};

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Untimed practice trials
    Practice,
    /// Timed main trials with attention checks
    Phase1,
    /// Alpha estimated, Phase 2 set generated
    Estimated,
    /// Personalized trials
    Phase2,
    /// No further responses accepted
    Finished,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Phase1 => "phase1",
            Self::Estimated => "estimated",
            Self::Phase2 => "phase2",
            Self::Finished => "finished",
        }
    }

    /// Phases reachable from this one
    pub fn valid_transitions(&self) -> &'static [SessionPhase] {
        match self {
            Self::Practice => &[Self::Phase1],
            Self::Phase1 => &[Self::Estimated],
            Self::Estimated => &[Self::Phase2],
            Self::Phase2 => &[Self::Finished],
            Self::Finished => &[],
        }
    }

    pub fn can_transition_to(&self, next: SessionPhase) -> bool {
        self.valid_transitions().contains(&next)
    }

    /// Survey block whose responses this phase accepts.
    pub fn accepting(&self) -> Option<SurveyPhase> {
        match self {
            Self::Practice => Some(SurveyPhase::Practice),
            Self::Phase1 => Some(SurveyPhase::Phase1),
            Self::Phase2 => Some(SurveyPhase::Phase2),
            Self::Estimated | Self::Finished => None,
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proof that a block was committed to the session's own log.
///
/// Issued before any transport is attempted, so a failing sink never
/// un-commits a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub session_id: String,
    pub phase: SurveyPhase,
    pub records: usize,
    pub attention_results: usize,
    pub committed_at: DateTime<Utc>,
}

/// A committed block, ready to hand to a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedBatch {
    pub receipt: CommitReceipt,
    pub records: Vec<ResponseRecord>,
    pub attention_results: Vec<AttentionCheckResult>,
}

/// One participant's survey session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// `ses_YYYYMMDDTHHMMSS`
    pub id: String,

    pub participant_id: String,

    pub started_at: DateTime<Utc>,

    pub phase: SessionPhase,

    practice_log: Vec<TrialResponse>,
    phase1_log: Vec<TrialResponse>,
    phase2_log: Vec<TrialResponse>,
    attention_results: Vec<AttentionCheckResult>,

    pub estimate: Option<AlphaEstimate>,

    phase2_trials: Vec<Phase2TrialSpec>,

    commits: Vec<CommitReceipt>,
}

impl Session {
    /// Creates a new session starting now
    pub fn new(participant_id: impl Into<String>) -> Self {
        Self::started_at(participant_id, Utc::now())
    }

    /// Creates a session with an explicit start time
    pub fn started_at(participant_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: format!("ses_{}", started_at.format("%Y%m%dT%H%M%S")),
            participant_id: participant_id.into(),
            started_at,
            phase: SessionPhase::Practice,
            practice_log: Vec::new(),
            phase1_log: Vec::new(),
            phase2_log: Vec::new(),
            attention_results: Vec::new(),
            estimate: None,
            phase2_trials: Vec::new(),
            commits: Vec::new(),
        }
    }

    /// Move to the next phase
    pub fn transition_to(&mut self, next: SessionPhase) -> DomainResult<()> {
        if !self.phase.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        self.phase = next;
        Ok(())
    }

    /// Append a finished trial to the log of the current phase.
    ///
    /// Returns the 1-based sequence number within that log.
    pub fn record_response(&mut self, response: TrialResponse) -> DomainResult<u32> {
        let block = self.accepting_block("record a trial response")?;
        if response.trial.is_practice != (block == SurveyPhase::Practice) {
            return Err(self.phase_error(format!(
                "trial {} does not belong to the {} block",
                response.trial.trial_number,
                block.as_str()
            )));
        }

        let log = match block {
            SurveyPhase::Practice => &mut self.practice_log,
            SurveyPhase::Phase1 => &mut self.phase1_log,
            SurveyPhase::Phase2 => &mut self.phase2_log,
        };
        log.push(response);
        Ok(log.len() as u32)
    }

    /// Append an attention-check result; only Phase 1 carries checks
    pub fn record_attention(&mut self, result: AttentionCheckResult) -> DomainResult<()> {
        let block = self.accepting_block("record an attention check")?;
        if block != SurveyPhase::Phase1 {
            return Err(self.phase_error("attention checks only run during phase 1".to_string()));
        }
        self.attention_results.push(result);
        Ok(())
    }

    /// Store the estimate and the personalized set, moving to `Estimated`
    pub fn set_estimate(
        &mut self,
        estimate: AlphaEstimate,
        phase2_trials: Vec<Phase2TrialSpec>,
    ) -> DomainResult<()> {
        self.transition_to(SessionPhase::Estimated)?;
        self.estimate = Some(estimate);
        self.phase2_trials = phase2_trials;
        Ok(())
    }

    /// Commit a block at `committed_at`. Each block commits at most once;
    /// practice never does.
    pub fn commit(
        &mut self,
        phase: SurveyPhase,
        committed_at: DateTime<Utc>,
    ) -> DomainResult<CommittedBatch> {
        if phase == SurveyPhase::Practice {
            return Err(self.phase_error("practice responses are not persisted".to_string()));
        }
        if self.is_committed(phase) {
            return Err(self.phase_error(format!("{} is already committed", phase.as_str())));
        }
        let reached = match phase {
            SurveyPhase::Phase1 => self.phase != SessionPhase::Practice,
            _ => matches!(self.phase, SessionPhase::Phase2 | SessionPhase::Finished),
        };
        if !reached {
            return Err(self.phase_error(format!("{} has not started", phase.as_str())));
        }

        let records = self.records(phase);
        let attention_results = if phase == SurveyPhase::Phase1 {
            self.attention_results.clone()
        } else {
            Vec::new()
        };
        let receipt = CommitReceipt {
            session_id: self.id.clone(),
            phase,
            records: records.len(),
            attention_results: attention_results.len(),
            committed_at,
        };
        self.commits.push(receipt.clone());

        Ok(CommittedBatch {
            receipt,
            records,
            attention_results,
        })
    }

    /// Whether `phase` has been committed
    pub fn is_committed(&self, phase: SurveyPhase) -> bool {
        self.commits.iter().any(|c| c.phase == phase)
    }

    /// Receipts of every commit, oldest first
    pub fn commits(&self) -> &[CommitReceipt] {
        &self.commits
    }

    /// Responses recorded for `phase`, in presentation order
    pub fn log(&self, phase: SurveyPhase) -> &[TrialResponse] {
        match phase {
            SurveyPhase::Practice => &self.practice_log,
            SurveyPhase::Phase1 => &self.phase1_log,
            SurveyPhase::Phase2 => &self.phase2_log,
        }
    }

    /// Attention-check results of Phase 1
    pub fn attention_results(&self) -> &[AttentionCheckResult] {
        &self.attention_results
    }

    /// Personalized Phase 2 set, empty before estimation
    pub fn phase2_trials(&self) -> &[Phase2TrialSpec] {
        &self.phase2_trials
    }

    /// Export rows for one block, numbered in log order
    pub fn records(&self, phase: SurveyPhase) -> Vec<ResponseRecord> {
        self.log(phase)
            .iter()
            .enumerate()
            .map(|(i, response)| {
                ResponseRecord::from_response(
                    &self.id,
                    &self.participant_id,
                    phase,
                    i as u32 + 1,
                    response,
                )
            })
            .collect()
    }

    /// Phase 1 choices usable for estimation
    pub fn phase1_choices(&self) -> Vec<ChoiceRecord> {
        self.phase1_log
            .iter()
            .filter_map(ChoiceRecord::from_response)
            .collect()
    }

    fn accepting_block(&self, action: &str) -> DomainResult<SurveyPhase> {
        let block = self
            .phase
            .accepting()
            .ok_or_else(|| self.phase_error(format!("cannot {action}")))?;
        if self.is_committed(block) {
            return Err(self.phase_error(format!("{} is already committed", block.as_str())));
        }
        Ok(block)
    }

    fn phase_error(&self, reason: String) -> DomainError {
        DomainError::PhaseOrder {
            phase: self.phase.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::response::Choice;
    use crate::domain::models::trial::{SizeCondition, TrialCondition, TrialNumber, TrialSpec};
    use chrono::TimeZone;

    fn response(is_practice: bool, choice: Choice) -> TrialResponse {
        TrialResponse {
            choice,
            confidence: Some(60),
            page_entry_time: 0.0,
            bar_choice_time: Some(1.0),
            submit_time: 2.0,
            timed_out: false,
            trial: TrialSpec {
                trial_number: if is_practice {
                    TrialNumber::Practice(1)
                } else {
                    TrialNumber::Main(1)
                },
                condition: TrialCondition::new(50, 200, 100),
                size_condition: SizeCondition::BothLarge,
                risk_on_left: true,
                is_practice,
                phase2: None,
            },
        }
    }

    #[test]
    fn test_session_id_format() {
        let start = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let session = Session::started_at("P01", start);
        assert_eq!(session.id, "ses_20240309T140507");
        assert_eq!(session.phase, SessionPhase::Practice);
    }

    #[test]
    fn test_phase_transitions() {
        let mut session = Session::new("P01");
        assert!(session.transition_to(SessionPhase::Phase2).is_err());
        session.transition_to(SessionPhase::Phase1).unwrap();
        session
            .set_estimate(AlphaEstimate::fallback(), Vec::new())
            .unwrap();
        session.transition_to(SessionPhase::Phase2).unwrap();
        session.transition_to(SessionPhase::Finished).unwrap();
        assert!(SessionPhase::Finished.valid_transitions().is_empty());
    }

    #[test]
    fn test_practice_responses_stay_out_of_phase1_log() {
        let mut session = Session::new("P01");
        assert_eq!(session.record_response(response(true, Choice::Risk)).unwrap(), 1);
        assert!(session.record_response(response(false, Choice::Risk)).is_err());

        session.transition_to(SessionPhase::Phase1).unwrap();
        assert!(session.record_response(response(true, Choice::Risk)).is_err());
        session.record_response(response(false, Choice::Safe)).unwrap();
        session.record_response(response(false, Choice::Timeout)).unwrap();

        assert_eq!(session.log(SurveyPhase::Practice).len(), 1);
        assert_eq!(session.log(SurveyPhase::Phase1).len(), 2);
        assert_eq!(session.phase1_choices().len(), 1);
    }

    #[test]
    fn test_commit_is_once_and_closes_log() {
        let mut session = Session::new("P01");
        assert!(session.commit(SurveyPhase::Phase1, Utc::now()).is_err());
        assert!(session.commit(SurveyPhase::Practice, Utc::now()).is_err());

        session.transition_to(SessionPhase::Phase1).unwrap();
        session.record_response(response(false, Choice::Risk)).unwrap();

        let batch = session.commit(SurveyPhase::Phase1, Utc::now()).unwrap();
        assert_eq!(batch.receipt.records, 1);
        assert_eq!(batch.records[0].sequence, 1);
        assert!(session.is_committed(SurveyPhase::Phase1));

        assert!(session.commit(SurveyPhase::Phase1, Utc::now()).is_err());
        assert!(session.record_response(response(false, Choice::Risk)).is_err());
        assert_eq!(session.commits().len(), 1);
    }
}
