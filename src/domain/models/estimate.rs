//! Risk-preference estimation results.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::response::{ResponseRecord, SurveyPhase, TrialResponse};

/// Confidence assumed for choices where the slider was never touched.
const UNTOUCHED_CONFIDENCE: f64 = 50.0;

/// A single valid Phase 1 choice as seen by the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    pub risky_amount: f64,
    pub risky_probability: f64,
    pub safe_amount: f64,
    pub chose_risky: bool,
    pub confidence: Option<u8>,
}

impl ChoiceRecord {
    /// Build a record from a response. Timeouts and practice trials yield `None`.
    pub fn from_response(response: &TrialResponse) -> Option<Self> {
        if response.trial.is_practice {
            return None;
        }
        let chose_risky = response.choice.chose_risky()?;
        let condition = response.trial.condition;
        Some(Self {
            risky_amount: condition.risk_reward as f64,
            risky_probability: f64::from(condition.risk_probability),
            safe_amount: condition.safe_reward as f64,
            chose_risky,
            confidence: response.confidence,
        })
    }

    /// Rebuild a choice from an exported Phase 1 record.
    pub fn from_record(record: &ResponseRecord) -> Option<Self> {
        if record.phase != SurveyPhase::Phase1 {
            return None;
        }
        Some(Self {
            risky_amount: record.risk_reward as f64,
            risky_probability: f64::from(record.risk_probability),
            safe_amount: record.safe_reward as f64,
            chose_risky: record.choice.chose_risky()?,
            confidence: record.confidence,
        })
    }
}

/// Maximum-likelihood estimate of a participant's utility curvature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlphaEstimate {
    /// Curvature of `u(x) = x^alpha`, within `[0.1, 1.5]`
    pub alpha: f64,
    /// Peakedness of the likelihood around `alpha`, within `[0, 100]`
    pub confidence: f64,
    pub choices_analyzed: usize,
    pub log_likelihood: f64,
}

impl AlphaEstimate {
    pub const DEFAULT_ALPHA: f64 = 0.75;

    /// Estimate used when no valid choice is available.
    pub fn fallback() -> Self {
        Self {
            alpha: Self::DEFAULT_ALPHA,
            confidence: 0.0,
            choices_analyzed: 0,
            log_likelihood: 0.0,
        }
    }

    /// True when no choices backed the estimate
    pub fn is_fallback(&self) -> bool {
        self.choices_analyzed == 0
    }

    /// Verbal risk profile for this alpha
    pub fn profile(&self) -> RiskProfile {
        RiskProfile::from_alpha(self.alpha)
    }
}

/// Coarse reading of an alpha value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskProfile {
    StronglyAverse,
    ModeratelyAverse,
    MildlyAverse,
    Neutral,
    Seeking,
}

impl RiskProfile {
    /// Classify an alpha
    pub fn from_alpha(alpha: f64) -> Self {
        if alpha < 0.5 {
            Self::StronglyAverse
        } else if alpha < 0.75 {
            Self::ModeratelyAverse
        } else if alpha < 1.0 {
            Self::MildlyAverse
        } else if alpha < 1.2 {
            Self::Neutral
        } else {
            Self::Seeking
        }
    }

    /// Participant-facing description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::StronglyAverse => "You tend to be quite risk-averse in your choices.",
            Self::ModeratelyAverse => "You show moderate risk aversion in your choices.",
            Self::MildlyAverse => "You show mild risk aversion in your choices.",
            Self::Neutral => "You tend to be relatively risk-neutral in your choices.",
            Self::Seeking => "You tend to be risk-seeking in your choices.",
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Descriptive statistics of the choices fed to the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChoiceSummary {
    pub total_choices: usize,
    pub risky_choices: usize,
    pub safe_choices: usize,
    pub percent_risky: f64,
    pub avg_confidence: f64,
}

impl ChoiceSummary {
    /// Summarize choices, `None` when there are none.
    pub fn from_choices(choices: &[ChoiceRecord]) -> Option<Self> {
        if choices.is_empty() {
            return None;
        }
        let total = choices.len();
        let risky = choices.iter().filter(|c| c.chose_risky).count();
        let confidence_sum: f64 = choices
            .iter()
            .map(|c| c.confidence.map_or(UNTOUCHED_CONFIDENCE, f64::from))
            .sum();
        Some(Self {
            total_choices: total,
            risky_choices: risky,
            safe_choices: total - risky,
            percent_risky: risky as f64 / total as f64 * 100.0,
            avg_confidence: confidence_sum / total as f64,
        })
    }
}
