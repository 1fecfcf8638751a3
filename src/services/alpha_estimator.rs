//! Maximum-likelihood estimation of utility curvature.
//!
//! Choices are modelled with expected utility `u(x) = x^alpha` and a logistic
//! (softmax) choice rule on the utility difference. The estimate is the grid
//! point with the highest total log-likelihood.

use tracing::{info, instrument, warn};

use crate::domain::models::{AlphaEstimate, ChoiceRecord, ChoiceSummary, TrialResponse};

/// Smallest alpha on the grid
pub const ALPHA_MIN: f64 = 0.1;
/// Largest alpha on the grid
pub const ALPHA_MAX: f64 = 1.5;
/// Grid spacing, in hundredths
const ALPHA_STEP_HUNDREDTHS: u32 = 5;
/// Softmax temperature
const TEMPERATURE: f64 = 1.0;
/// Keeps `ln` finite for saturated probabilities
const LOG_EPSILON: f64 = 1e-10;
/// Distance to the neighbours compared against the peak
const NEIGHBOUR_OFFSET: f64 = 0.1;

/// Utility of a sure amount
pub fn utility(amount: f64, alpha: f64) -> f64 {
    amount.powf(alpha)
}

/// Expected utility of winning `amount` with `probability` percent
pub fn risky_utility(amount: f64, probability: f64, alpha: f64) -> f64 {
    probability / 100.0 * utility(amount, alpha)
}

/// Probability of choosing the risky option under the softmax rule
pub fn p_choose_risky(choice: &ChoiceRecord, alpha: f64) -> f64 {
    let risky = risky_utility(choice.risky_amount, choice.risky_probability, alpha);
    let safe = utility(choice.safe_amount, alpha);
    1.0 / (1.0 + (-(risky - safe) / TEMPERATURE).exp())
}

/// Alpha values searched, ascending: 0.10, 0.15, ..., 1.50
pub fn alpha_grid() -> impl Iterator<Item = f64> {
    let min = (ALPHA_MIN * 100.0).round() as u32;
    let max = (ALPHA_MAX * 100.0).round() as u32;
    (min..=max)
        .step_by(ALPHA_STEP_HUNDREDTHS as usize)
        .map(|hundredths| f64::from(hundredths) / 100.0)
}

/// Accumulates Phase 1 choices and estimates alpha from them
#[derive(Debug, Clone, Default)]
pub struct AlphaEstimator {
    choices: Vec<ChoiceRecord>,
}

impl AlphaEstimator {
    /// Empty estimator
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimator seeded with already-recorded choices
    pub fn from_choices(choices: Vec<ChoiceRecord>) -> Self {
        Self { choices }
    }

    /// Add a response; timeouts and practice trials are skipped.
    ///
    /// Returns whether the response was kept.
    pub fn add_response(&mut self, response: &TrialResponse) -> bool {
        match ChoiceRecord::from_response(response) {
            Some(choice) => {
                self.choices.push(choice);
                true
            }
            None => false,
        }
    }

    /// Record one binary choice
    pub fn add_choice(&mut self, choice: ChoiceRecord) {
        self.choices.push(choice);
    }

    /// Choices recorded so far, in order
    pub fn choices(&self) -> &[ChoiceRecord] {
        &self.choices
    }

    /// Forget every recorded choice
    pub fn reset(&mut self) {
        self.choices.clear();
    }

    /// Total log-likelihood of the recorded choices at `alpha`
    pub fn log_likelihood(&self, alpha: f64) -> f64 {
        self.choices
            .iter()
            .map(|choice| {
                let p = p_choose_risky(choice, alpha);
                if choice.chose_risky {
                    (p + LOG_EPSILON).ln()
                } else {
                    (1.0 - p + LOG_EPSILON).ln()
                }
            })
            .sum()
    }

    /// Grid-search estimate. Ties resolve to the smallest alpha.
    #[instrument(skip(self), fields(choices = self.choices.len()))]
    pub fn estimate(&self) -> AlphaEstimate {
        if self.choices.is_empty() {
            warn!("no valid choices, using default alpha");
            return AlphaEstimate::fallback();
        }

        let mut best_alpha = AlphaEstimate::DEFAULT_ALPHA;
        let mut best_ll = f64::NEG_INFINITY;
        for alpha in alpha_grid() {
            let ll = self.log_likelihood(alpha);
            if ll > best_ll {
                best_ll = ll;
                best_alpha = alpha;
            }
        }

        let confidence = self.estimation_confidence(best_alpha, best_ll);
        info!(
            alpha = best_alpha,
            confidence,
            log_likelihood = best_ll,
            "estimated alpha"
        );

        AlphaEstimate {
            alpha: best_alpha,
            confidence,
            choices_analyzed: self.choices.len(),
            log_likelihood: best_ll,
        }
    }

    /// Peakedness of the likelihood at `alpha`, scaled to `[0, 100]`
    fn estimation_confidence(&self, alpha: f64, best_ll: f64) -> f64 {
        let lower = self.log_likelihood((alpha - NEIGHBOUR_OFFSET).max(ALPHA_MIN));
        let upper = self.log_likelihood((alpha + NEIGHBOUR_OFFSET).min(ALPHA_MAX));
        ((best_ll - lower.max(upper)) * 10.0).clamp(0.0, 100.0)
    }

    /// Descriptive counts of the recorded choices, `None` when empty
    pub fn summary(&self) -> Option<ChoiceSummary> {
        ChoiceSummary::from_choices(&self.choices)
    }
}
