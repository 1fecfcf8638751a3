use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::attention::{default_question_bank, AttentionQuestion};
use super::trial::BarSize;

/// Main configuration structure for the survey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Block sizes, timing and presentation
    #[serde(default, alias = "experimentConfig")]
    pub experiment: ExperimentConfig,

    /// Phase 1 choice space
    #[serde(default)]
    pub phase1: Phase1Config,

    /// Phase 2 conditions
    #[serde(default)]
    pub phase2: Phase2Config,

    /// Attention-check question bank
    #[serde(default = "default_question_bank", alias = "attentionCheckQuestions")]
    pub attention_check_questions: Vec<AttentionQuestion>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            experiment: ExperimentConfig::default(),
            phase1: Phase1Config::default(),
            phase2: Phase2Config::default(),
            attention_check_questions: default_question_bank(),
            logging: LoggingConfig::default(),
        }
    }
}

/// What to do when more trials are requested than unique conditions exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SamplingPolicy {
    /// Exhaust a shuffled copy of the pool, then start a freshly shuffled copy
    #[default]
    Replenish,
    /// Draw every trial independently and uniformly from the pool
    WithReplacement,
    /// Refuse; requesting more than the pool holds is an error
    Strict,
}

/// Experiment block configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExperimentConfig {
    /// Untimed practice trials before Phase 1
    #[serde(default = "default_practice_trials", alias = "practiceTrials")]
    pub practice_trials: usize,

    /// Timed Phase 1 trials
    #[serde(default = "default_main_trials", alias = "mainTrials")]
    pub main_trials: usize,

    /// Attention checks interleaved into Phase 1
    #[serde(default = "default_attention_checks", alias = "attentionChecks")]
    pub attention_checks: usize,

    /// Per-trial deadline in milliseconds
    #[serde(default = "default_trial_duration_ms", alias = "trialDuration")]
    pub trial_duration_ms: u64,

    /// Personalized Phase 2 trials
    #[serde(default = "default_phase2_trials", alias = "phase2Trials")]
    pub phase2_trials: usize,

    /// Bar dimensions in pixels
    #[serde(default, alias = "barSizes")]
    pub bar_sizes: BarSizes,

    /// Font sizes in pixels: `large` inside the bars, `small` for the labels
    #[serde(default, alias = "fontSizes")]
    pub font_sizes: FontSizes,

    /// Attention checks block until answered correctly
    #[serde(default = "default_true", alias = "requireCorrectAttention")]
    pub require_correct_attention: bool,

    /// Policy for requests larger than the condition pool
    #[serde(default, alias = "samplingPolicy")]
    pub sampling_policy: SamplingPolicy,
}

const fn default_practice_trials() -> usize {
    1
}

const fn default_main_trials() -> usize {
    4
}

const fn default_attention_checks() -> usize {
    2
}

const fn default_trial_duration_ms() -> u64 {
    8000
}

const fn default_phase2_trials() -> usize {
    63
}

const fn default_true() -> bool {
    true
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            practice_trials: default_practice_trials(),
            main_trials: default_main_trials(),
            attention_checks: default_attention_checks(),
            trial_duration_ms: default_trial_duration_ms(),
            phase2_trials: default_phase2_trials(),
            bar_sizes: BarSizes::default(),
            font_sizes: FontSizes::default(),
            require_correct_attention: true,
            sampling_policy: SamplingPolicy::default(),
        }
    }
}

/// Width and height of one bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarDimensions {
    pub width: u32,
    pub height: u32,
}

/// Large and small bar dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarSizes {
    pub large: BarDimensions,
    pub small: BarDimensions,
}

impl Default for BarSizes {
    fn default() -> Self {
        Self {
            large: BarDimensions {
                width: 120,
                height: 300,
            },
            small: BarDimensions {
                width: 80,
                height: 200,
            },
        }
    }
}

impl BarSizes {
    /// Pixel dimensions of a bar drawn at `size`
    pub fn dimensions(&self, size: BarSize) -> BarDimensions {
        match size {
            BarSize::Large => self.large,
            BarSize::Small => self.small,
        }
    }
}

/// Large and small label font sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSizes {
    pub large: u32,
    pub small: u32,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            large: 16,
            small: 12,
        }
    }
}

/// Phase 1 choice space, crossed by the combination generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Phase1Config {
    #[serde(default = "default_risk_probabilities")]
    pub risk_probabilities: Vec<u8>,

    #[serde(default = "default_risky_rewards")]
    pub risky_rewards: Vec<u64>,

    #[serde(default = "default_safe_rewards")]
    pub safe_rewards: Vec<u64>,
}

fn default_risk_probabilities() -> Vec<u8> {
    vec![25, 50, 75]
}

fn default_risky_rewards() -> Vec<u64> {
    vec![100, 200, 300]
}

fn default_safe_rewards() -> Vec<u64> {
    vec![50, 100, 150]
}

impl Default for Phase1Config {
    fn default() -> Self {
        Self {
            risk_probabilities: default_risk_probabilities(),
            risky_rewards: default_risky_rewards(),
            safe_rewards: default_safe_rewards(),
        }
    }
}

/// Phase 2 risky amounts and probabilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Phase2Config {
    #[serde(default = "default_phase2_amounts")]
    pub risky_amounts: Vec<u64>,

    #[serde(default = "default_risk_probabilities")]
    pub probabilities: Vec<u8>,

    /// Use only the first N risky amounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<usize>,
}

fn default_phase2_amounts() -> Vec<u64> {
    vec![120, 300, 2_000_000]
}

impl Default for Phase2Config {
    fn default() -> Self {
        Self {
            risky_amounts: default_phase2_amounts(),
            probabilities: default_risk_probabilities(),
            conditions: None,
        }
    }
}

impl Phase2Config {
    /// The full six-amount design (126 candidates).
    pub fn full() -> Self {
        Self {
            risky_amounts: vec![120, 180, 300, 1_600_000, 2_000_000, 7_200_000],
            ..Self::default()
        }
    }

    /// Risky amounts after applying the `conditions` cap.
    pub fn active_amounts(&self) -> &[u64] {
        let take = self
            .conditions
            .map_or(self.risky_amounts.len(), |n| n.min(self.risky_amounts.len()));
        &self.risky_amounts[..take]
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Log file rotation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// Directory for JSON log files; console only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    #[serde(default)]
    pub rotation: RotationPolicy,
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: RotationPolicy::default(),
        }
    }
}
