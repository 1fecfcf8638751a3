//! Personalized Phase 2 trial generation.
//!
//! For every (risky amount, probability) condition the participant's
//! indifference point is derived from their alpha, and seven safe amounts are
//! laid out symmetrically around it.

use tracing::{info, instrument};

use super::alpha_estimator::{risky_utility, ALPHA_MAX, ALPHA_MIN};
use super::combination_generator::CombinationGenerator;
use crate::domain::models::{AlphaEstimate, Phase2Config, Phase2TrialSpec};

/// Safe amounts per condition
pub const BRACKET_SIZE: usize = 7;

/// Offsets of the safe amounts, in bracket widths
const BRACKET_OFFSETS: [i64; BRACKET_SIZE] = [-3, -2, -1, 0, 1, 2, 3];

/// Bracket width as a fraction of the indifference point
pub fn bracket_fraction(risky_amount: u64) -> f64 {
    match risky_amount {
        0..=199 => 0.15,
        200..=999 => 0.12,
        1_000..=99_999 => 0.10,
        _ => 0.08,
    }
}

/// Rounded expected value of the risky option
pub fn risky_ev(risky_amount: u64, probability: u8) -> u64 {
    (f64::from(probability) / 100.0 * risky_amount as f64).round() as u64
}

/// Generator bound to one participant's alpha
#[derive(Debug, Clone, Copy)]
pub struct Phase2Generator {
    alpha: f64,
}

impl Phase2Generator {
    /// Alpha is clamped to the estimation grid
    pub fn new(alpha: f64) -> Self {
        let alpha = if alpha.is_finite() {
            alpha.clamp(ALPHA_MIN, ALPHA_MAX)
        } else {
            AlphaEstimate::DEFAULT_ALPHA
        };
        Self { alpha }
    }

    /// Generator for the alpha of a Phase 1 estimate
    pub fn from_estimate(estimate: &AlphaEstimate) -> Self {
        Self::new(estimate.alpha)
    }

    /// Alpha after clamping
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Certainty equivalent: the sure amount with the lottery's expected utility
    pub fn find_indifference_point(&self, risky_amount: u64, probability: u8) -> u64 {
        let eu = risky_utility(risky_amount as f64, f64::from(probability), self.alpha);
        eu.powf(1.0 / self.alpha).round() as u64
    }

    /// Step between neighbouring safe amounts, rounded up
    pub fn bracket_width(indifference_point: u64, risky_amount: u64) -> u64 {
        (indifference_point as f64 * bracket_fraction(risky_amount)).ceil() as u64
    }

    /// Seven safe amounts around the indifference point, never below 1
    pub fn bracket(indifference_point: u64, risky_amount: u64) -> [u64; BRACKET_SIZE] {
        let width = Self::bracket_width(indifference_point, risky_amount) as i64;
        let center = indifference_point as i64;
        BRACKET_OFFSETS.map(|offset| (center + offset * width).max(1) as u64)
    }

    /// The seven candidates of one condition, ids starting at `first_trial_id`
    pub fn generate_for_condition(
        &self,
        risky_amount: u64,
        probability: u8,
        first_trial_id: u32,
        combination_id: u32,
    ) -> Vec<Phase2TrialSpec> {
        let indifference_point = self.find_indifference_point(risky_amount, probability);
        let ev = risky_ev(risky_amount, probability);

        Self::bracket(indifference_point, risky_amount)
            .into_iter()
            .zip(first_trial_id..)
            .map(|(safe_amount, trial_id)| Phase2TrialSpec {
                trial_id,
                combination_id,
                risky_amount,
                risky_probability: probability,
                risky_ev: ev,
                indifference_point,
                safe_amount,
                estimated_alpha: self.alpha,
            })
            .collect()
    }

    /// Candidates for every configured condition, amount outer, probability inner
    #[instrument(skip(self, config), fields(alpha = self.alpha))]
    pub fn generate(&self, config: &Phase2Config) -> Vec<Phase2TrialSpec> {
        let conditions = CombinationGenerator::new().phase2_conditions(config);
        let mut trials = Vec::with_capacity(conditions.len() * BRACKET_SIZE);
        for (combination_id, (amount, probability)) in (1..).zip(conditions) {
            let first_trial_id = trials.len() as u32 + 1;
            trials.extend(self.generate_for_condition(
                amount,
                probability,
                first_trial_id,
                combination_id,
            ));
        }
        info!(trials = trials.len(), "generated phase 2 candidates");
        trials
    }

    /// Six amounts by three probabilities (126 candidates)
    pub fn generate_full(&self) -> Vec<Phase2TrialSpec> {
        self.generate(&Phase2Config::full())
    }

    /// The first `conditions` amounts of the short design
    pub fn generate_subset(&self, conditions: usize) -> Vec<Phase2TrialSpec> {
        self.generate(&Phase2Config {
            conditions: Some(conditions),
            ..Phase2Config::default()
        })
    }
}
