//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

use risk_survey::domain::models::{
    ChoiceRecord, Config, Phase1Config, SizeCondition, TrialCondition, TrialNumber, TrialSpec,
};
use risk_survey::services::CombinationGenerator;

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// The 27 default Phase 1 conditions
#[allow(dead_code)]
pub fn phase1_pool() -> Vec<TrialCondition> {
    CombinationGenerator::new().phase1(&Phase1Config::default())
}

/// What a risk-neutral participant picks; `None` when both options have the same EV
#[allow(dead_code)]
pub fn ev_maximizer_choice(condition: &TrialCondition) -> Option<ChoiceRecord> {
    let risky_ev = condition.risky_expected_value();
    let safe = condition.safe_reward as f64;
    if (risky_ev - safe).abs() < 1e-9 {
        return None;
    }
    Some(ChoiceRecord {
        risky_amount: condition.risk_reward as f64,
        risky_probability: f64::from(condition.risk_probability),
        safe_amount: safe,
        chose_risky: risky_ev > safe,
        confidence: Some(80),
    })
}

/// A timed main trial
#[allow(dead_code)]
pub fn main_trial(number: u32, condition: TrialCondition) -> TrialSpec {
    TrialSpec {
        trial_number: TrialNumber::Main(number),
        condition,
        size_condition: SizeCondition::BothLarge,
        risk_on_left: true,
        is_practice: false,
        phase2: None,
    }
}

/// An untimed practice trial
#[allow(dead_code)]
pub fn practice_trial(number: u32, condition: TrialCondition) -> TrialSpec {
    TrialSpec {
        trial_number: TrialNumber::Practice(number),
        is_practice: true,
        ..main_trial(number, condition)
    }
}

/// Full Phase 1 block with all three attention checks
#[allow(dead_code)]
pub fn full_config() -> Config {
    let mut config = Config::default();
    config.experiment.practice_trials = 3;
    config.experiment.main_trials = 27;
    config.experiment.attention_checks = 3;
    config
}
