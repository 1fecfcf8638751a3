//! Trial responses and their exported record form.

use serde::{Deserialize, Serialize};

use super::trial::{EvComparison, OptionKind, ScreenSide, SizeCondition, TrialNumber, TrialSpec};

/// Recorded outcome of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Risk,
    Safe,
    /// No option was selected before the deadline
    Timeout,
}

impl Choice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Risk => "risk",
            Self::Safe => "safe",
            Self::Timeout => "timeout",
        }
    }

    /// `Some(true)` for a risky choice, `None` for a timeout.
    pub fn chose_risky(&self) -> Option<bool> {
        match self {
            Self::Risk => Some(true),
            Self::Safe => Some(false),
            Self::Timeout => None,
        }
    }
}

impl From<OptionKind> for Choice {
    fn from(option: OptionKind) -> Self {
        match option {
            OptionKind::Risk => Self::Risk,
            OptionKind::Safe => Self::Safe,
        }
    }
}

/// Survey block a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyPhase {
    Practice,
    Phase1,
    Phase2,
}

impl SurveyPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Phase1 => "phase1",
            Self::Phase2 => "phase2",
        }
    }
}

/// What the participant did on one trial. Times are seconds since the trial started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResponse {
    pub choice: Choice,
    /// `None` when the confidence slider was never touched
    pub confidence: Option<u8>,
    pub page_entry_time: f64,
    pub bar_choice_time: Option<f64>,
    pub submit_time: f64,
    /// The deadline ended the trial
    pub timed_out: bool,
    pub trial: TrialSpec,
}

impl TrialResponse {
    /// Seconds between choosing a bar and submitting.
    pub fn confidence_choice_time(&self) -> Option<f64> {
        self.bar_choice_time.map(|bar| self.submit_time - bar)
    }
}

/// Flat, serialization-ready row for the persistence layer.
///
/// Every field is always present; a timeout carries the `timeout` choice and
/// untouched confidence serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub session_id: String,
    pub participant_id: String,
    pub phase: SurveyPhase,
    /// 1-based position in the phase's response log
    pub sequence: u32,
    pub trial_number: TrialNumber,
    pub size_condition: SizeCondition,
    pub choice: Choice,
    pub confidence: Option<u8>,
    pub risk_probability: u8,
    pub risk_reward: u64,
    pub safe_probability: u8,
    pub safe_reward: u64,
    pub risk_position: ScreenSide,
    pub safe_position: ScreenSide,
    pub ev: EvComparison,
    pub page_entry_time: f64,
    pub bar_choice_time: Option<f64>,
    pub confidence_choice_time: Option<f64>,
    pub page_submit_time: f64,
    pub timed_out: bool,
    pub trial_id: Option<u32>,
    pub combination_id: Option<u32>,
    pub indifference_point: Option<u64>,
    pub estimated_alpha: Option<f64>,
}

impl ResponseRecord {
    /// Flatten a finished trial into an export row
    pub fn from_response(
        session_id: &str,
        participant_id: &str,
        phase: SurveyPhase,
        sequence: u32,
        response: &TrialResponse,
    ) -> Self {
        let trial = &response.trial;
        let link = trial.phase2;
        Self {
            session_id: session_id.to_string(),
            participant_id: participant_id.to_string(),
            phase,
            sequence,
            trial_number: trial.trial_number,
            size_condition: trial.size_condition,
            choice: response.choice,
            confidence: response.confidence,
            risk_probability: trial.condition.risk_probability,
            risk_reward: trial.condition.risk_reward,
            safe_probability: 100,
            safe_reward: trial.condition.safe_reward,
            risk_position: trial.side_of(OptionKind::Risk),
            safe_position: trial.side_of(OptionKind::Safe),
            ev: trial.condition.ev_comparison(),
            page_entry_time: response.page_entry_time,
            bar_choice_time: response.bar_choice_time,
            confidence_choice_time: response.confidence_choice_time(),
            page_submit_time: response.submit_time,
            timed_out: response.timed_out,
            trial_id: link.map(|l| l.trial_id),
            combination_id: link.map(|l| l.combination_id),
            indifference_point: link.map(|l| l.indifference_point),
            estimated_alpha: link.map(|l| l.estimated_alpha),
        }
    }
}
