//! Synthetic participant for dry runs.
//!
//! Chooses with the same softmax expected-utility rule the estimator fits,
//! so a simulated session should recover roughly the alpha it was given.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::time::sleep;

use super::trial_driver::TrialHandle;
use crate::domain::models::{AttentionQuestion, OptionKind, TrialResponse, TrialSpec};
use crate::services::alpha_estimator::{risky_utility, utility};
use crate::services::{InputOutcome, TrialExecution, TrialInput};

/// One planned trial: what to pick and when
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedChoice {
    pub option: OptionKind,
    pub confidence: u8,
    pub choice_delay: Duration,
    pub confidence_delay: Duration,
    pub advance_delay: Duration,
}

/// Softmax chooser with a fixed utility curvature
#[derive(Debug, Clone)]
pub struct SimulatedParticipant {
    alpha: f64,
    /// Probability of idling through a timed trial
    lapse_rate: f64,
    rng: StdRng,
}

impl SimulatedParticipant {
    /// Participant with no lapses, seeded for reproducible choices
    pub fn new(alpha: f64, seed: u64) -> Self {
        Self {
            alpha,
            lapse_rate: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Set the lapse probability, clamped to `[0, 1]`; NaN disables lapses
    pub fn with_lapse_rate(mut self, lapse_rate: f64) -> Self {
        self.lapse_rate = if lapse_rate.is_nan() {
            0.0
        } else {
            lapse_rate.clamp(0.0, 1.0)
        };
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Decide a trial; `None` means letting it time out
    pub fn plan(&mut self, spec: &TrialSpec) -> Option<PlannedChoice> {
        if !spec.is_practice && self.rng.random_bool(self.lapse_rate) {
            return None;
        }

        let condition = spec.condition;
        let risky = risky_utility(
            condition.risk_reward as f64,
            f64::from(condition.risk_probability),
            self.alpha,
        );
        let safe = utility(condition.safe_reward as f64, self.alpha);
        let p_risky = 1.0 / (1.0 + (safe - risky).exp());
        let option = if self.rng.random::<f64>() < p_risky {
            OptionKind::Risk
        } else {
            OptionKind::Safe
        };

        // Sharper preferences come with higher confidence
        let certainty = (p_risky - 0.5).abs() * 2.0;
        let confidence = (50.0 + certainty * 50.0).round() as u8;

        Some(PlannedChoice {
            option,
            confidence,
            choice_delay: Duration::from_millis(self.rng.random_range(600..2500)),
            confidence_delay: Duration::from_millis(self.rng.random_range(300..1200)),
            advance_delay: Duration::from_millis(self.rng.random_range(200..600)),
        })
    }

    /// Play a trial through a driver handle
    pub async fn play(&mut self, handle: &TrialHandle, spec: &TrialSpec) {
        let Some(plan) = self.plan(spec) else {
            return;
        };
        sleep(plan.choice_delay).await;
        if !handle.send(TrialInput::SelectOption(plan.option)).await {
            return;
        }
        sleep(plan.confidence_delay).await;
        if !handle.send(TrialInput::Confidence(plan.confidence)).await {
            return;
        }
        sleep(plan.advance_delay).await;
        handle.send(TrialInput::Advance).await;
    }

    /// Play a trial on a virtual clock, without waiting in real time
    pub fn respond(&mut self, mut execution: TrialExecution) -> Result<TrialResponse> {
        let trial = execution.spec().trial_number;
        let deadline = execution.deadline();

        if let Some(plan) = self.plan(execution.spec()) {
            let steps = [
                (TrialInput::SelectOption(plan.option), plan.choice_delay),
                (TrialInput::Confidence(plan.confidence), plan.confidence_delay),
                (TrialInput::Advance, plan.advance_delay),
            ];
            let mut elapsed = Duration::ZERO;
            for (input, delay) in steps {
                elapsed += delay;
                if let InputOutcome::Completed(response) = execution.handle(input, elapsed) {
                    return Ok(response);
                }
            }
        }

        let deadline = deadline.with_context(|| format!("untimed trial {trial} was never finished"))?;
        execution
            .tick(deadline)
            .with_context(|| format!("trial {trial} did not expire at its deadline"))
    }

    /// Answer an attention question, always correctly
    pub fn answer(&mut self, question: &AttentionQuestion) -> (String, Duration) {
        (
            question.correct_answer.clone(),
            Duration::from_millis(self.rng.random_range(1500..6000)),
        )
    }
}
