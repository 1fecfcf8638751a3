use anyhow::{bail, Context, Result};
use figment::providers::{Env, Format, Json, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;
use crate::services::phase2_generator::BRACKET_SIZE;

/// Configuration error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid trial_duration_ms: {0}. Must be positive")]
    InvalidTrialDuration(u64),

    #[error("{0} cannot be empty")]
    EmptySet(&'static str),

    #[error("Invalid probability: {0}. Must be between 1 and 99")]
    InvalidProbability(u8),

    #[error("Invalid reward in {0}: rewards must be positive")]
    InvalidReward(&'static str),

    #[error("Requested {requested} attention checks but the question bank holds {available}")]
    TooManyAttentionChecks { requested: usize, available: usize },

    #[error("Requested {checks} attention checks for only {trials} main trials")]
    AttentionChecksExceedTrials { checks: usize, trials: usize },

    #[error("Invalid attention question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Strict sampling: {block} requests {requested} trials from {available} unique conditions")]
    StrictSamplingInsufficient {
        block: &'static str,
        requested: usize,
        available: usize,
    },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .risk-survey/config.yaml (project config)
    /// 3. .risk-survey/local.yaml (local overrides, optional)
    /// 4. Environment variables (RISK_SURVEY_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".risk-survey/config.yaml"))
            .merge(Yaml::file(".risk-survey/local.yaml"))
            .merge(Env::prefixed("RISK_SURVEY_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// `.json` files are read as JSON, anything else as YAML. Both the
    /// snake_case layout and the camelCase `experimentConfig` /
    /// `attentionCheckQuestions` layout are accepted; missing fields take
    /// their serde defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("Config file not found: {}", path.display());
        }

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let figment = if is_json {
            Figment::new().merge(Json::file(path))
        } else {
            Figment::new().merge(Yaml::file(path))
        };

        let config: Config = figment
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let experiment = &config.experiment;

        if experiment.trial_duration_ms == 0 {
            return Err(ConfigError::InvalidTrialDuration(experiment.trial_duration_ms));
        }

        for (name, size) in [
            ("bar_sizes.large", experiment.bar_sizes.large),
            ("bar_sizes.small", experiment.bar_sizes.small),
        ] {
            if size.width == 0 || size.height == 0 {
                return Err(ConfigError::ValidationFailed(format!(
                    "{name} dimensions must be positive"
                )));
            }
        }
        if experiment.font_sizes.large == 0 || experiment.font_sizes.small == 0 {
            return Err(ConfigError::ValidationFailed(
                "font sizes must be positive".to_string(),
            ));
        }

        // Phase 1 choice space
        let phase1 = &config.phase1;
        if phase1.risk_probabilities.is_empty() {
            return Err(ConfigError::EmptySet("phase1.risk_probabilities"));
        }
        if phase1.risky_rewards.is_empty() {
            return Err(ConfigError::EmptySet("phase1.risky_rewards"));
        }
        if phase1.safe_rewards.is_empty() {
            return Err(ConfigError::EmptySet("phase1.safe_rewards"));
        }
        Self::validate_probabilities(&phase1.risk_probabilities)?;
        if phase1.risky_rewards.contains(&0) {
            return Err(ConfigError::InvalidReward("phase1.risky_rewards"));
        }
        if phase1.safe_rewards.contains(&0) {
            return Err(ConfigError::InvalidReward("phase1.safe_rewards"));
        }

        // Phase 2 conditions
        let phase2 = &config.phase2;
        if phase2.active_amounts().is_empty() {
            return Err(ConfigError::EmptySet("phase2.risky_amounts"));
        }
        if phase2.probabilities.is_empty() {
            return Err(ConfigError::EmptySet("phase2.probabilities"));
        }
        Self::validate_probabilities(&phase2.probabilities)?;
        if phase2.risky_amounts.contains(&0) {
            return Err(ConfigError::InvalidReward("phase2.risky_amounts"));
        }

        // Attention checks
        let bank = &config.attention_check_questions;
        if experiment.attention_checks > bank.len() {
            return Err(ConfigError::TooManyAttentionChecks {
                requested: experiment.attention_checks,
                available: bank.len(),
            });
        }
        // A block of only attention checks is allowed
        if experiment.main_trials > 0 && experiment.attention_checks > experiment.main_trials {
            return Err(ConfigError::AttentionChecksExceedTrials {
                checks: experiment.attention_checks,
                trials: experiment.main_trials,
            });
        }
        for question in bank {
            question.validate().map_err(ConfigError::InvalidQuestion)?;
        }

        // Strict sampling never repeats a condition
        if experiment.sampling_policy == crate::domain::models::SamplingPolicy::Strict {
            let phase1_pool = phase1.risk_probabilities.len()
                * phase1.risky_rewards.len()
                * phase1.safe_rewards.len();
            for (block, requested) in [
                ("practice", experiment.practice_trials),
                ("phase1", experiment.main_trials),
            ] {
                if requested > phase1_pool {
                    return Err(ConfigError::StrictSamplingInsufficient {
                        block,
                        requested,
                        available: phase1_pool,
                    });
                }
            }

            let phase2_pool =
                phase2.active_amounts().len() * phase2.probabilities.len() * BRACKET_SIZE;
            if experiment.phase2_trials > phase2_pool {
                return Err(ConfigError::StrictSamplingInsufficient {
                    block: "phase2",
                    requested: experiment.phase2_trials,
                    available: phase2_pool,
                });
            }
        }

        // Validate logging config
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        Ok(())
    }

    fn validate_probabilities(probabilities: &[u8]) -> Result<(), ConfigError> {
        match probabilities.iter().find(|p| !(1..=99).contains(*p)) {
            Some(&p) => Err(ConfigError::InvalidProbability(p)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::{LogFormat, SamplingPolicy};
    use crate::domain::models::AttentionQuestion;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.experiment.practice_trials, 1);
        assert_eq!(config.experiment.main_trials, 4);
        assert_eq!(config.experiment.attention_checks, 2);
        assert_eq!(config.experiment.trial_duration_ms, 8000);
        assert_eq!(config.experiment.phase2_trials, 63);
        assert_eq!(config.attention_check_questions.len(), 3);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
experiment:
  main_trials: 20
  attention_checks: 3
  trial_duration_ms: 6000
  sampling_policy: strict
phase2:
  conditions: 2
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.experiment.main_trials, 20);
        assert_eq!(config.experiment.attention_checks, 3);
        assert_eq!(config.experiment.trial_duration_ms, 6000);
        assert_eq!(config.experiment.practice_trials, 1);
        assert_eq!(config.experiment.sampling_policy, SamplingPolicy::Strict);
        assert_eq!(config.phase2.active_amounts(), &[120, 300]);
        assert_eq!(config.logging.format, LogFormat::Json);

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::StrictSamplingInsufficient { block: "phase2", requested: 63, available: 42 })
        ));
    }

    #[test]
    fn test_validate_zero_duration() {
        let mut config = Config::default();
        config.experiment.trial_duration_ms = 0;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTrialDuration(0))
        );
    }

    #[test]
    fn test_validate_empty_phase1_set() {
        let mut config = Config::default();
        config.phase1.safe_rewards.clear();
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptySet("phase1.safe_rewards"))
        );
    }

    #[test]
    fn test_validate_probability_range() {
        let mut config = Config::default();
        config.phase1.risk_probabilities = vec![25, 100];
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidProbability(100))
        );

        let mut config = Config::default();
        config.phase2.probabilities = vec![0];
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidProbability(0))
        );
    }

    #[test]
    fn test_validate_zero_reward() {
        let mut config = Config::default();
        config.phase1.risky_rewards.push(0);
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidReward("phase1.risky_rewards"))
        );
    }

    #[test]
    fn test_validate_attention_bank_size() {
        let mut config = Config::default();
        config.experiment.main_trials = 10;
        config.experiment.attention_checks = 4;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::TooManyAttentionChecks {
                requested: 4,
                available: 3
            })
        );
    }

    #[test]
    fn test_validate_more_checks_than_trials() {
        let mut config = Config::default();
        config.experiment.main_trials = 1;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::AttentionChecksExceedTrials {
                checks: 2,
                trials: 1
            })
        );

        config.experiment.main_trials = 0;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_malformed_question() {
        let mut config = Config::default();
        config.attention_check_questions.push(AttentionQuestion::multi_choice(
            "Pick green",
            &["Red", "Blue"],
            "Green",
        ));
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidQuestion(_))
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_strict_phase1() {
        let mut config = Config::default();
        config.experiment.sampling_policy = SamplingPolicy::Strict;
        config.experiment.main_trials = 28;
        config.experiment.phase2_trials = 10;
        assert_eq!(
            ConfigLoader::validate(&config),
            Err(ConfigError::StrictSamplingInsufficient {
                block: "phase1",
                requested: 28,
                available: 27
            })
        );
    }

    #[test]
    fn test_invalid_log_format_rejected_on_load() {
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "logging:\n  format: xml").unwrap();
        file.flush().unwrap();

        assert!(ConfigLoader::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_load_original_json_layout() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "experimentConfig": {{
                    "practiceTrials": 3,
                    "mainTrials": 27,
                    "attentionChecks": 3,
                    "trialDuration": 8000,
                    "phase2Trials": 63
                }},
                "attentionCheckQuestions": [
                    {{"type": "multi-choice", "prompt": "Select Blue", "options": ["Red", "Blue"], "correct_answer": "Blue"}},
                    {{"type": "text", "prompt": "Type apple", "correct_answer": "apple"}},
                    {{"type": "likert", "prompt": "Select Agree", "labels": ["Disagree", "Agree"], "correct_answer": "Agree"}}
                ]
            }}"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = ConfigLoader::load_from_file(file.path()).expect("original layout should load");
        assert_eq!(config.experiment.practice_trials, 3);
        assert_eq!(config.experiment.main_trials, 27);
        assert_eq!(config.attention_check_questions[2].choices().len(), 2);
    }

    #[test]
    fn test_missing_file() {
        assert!(ConfigLoader::load_from_file("/nonexistent/risk-survey.yaml").is_err());
    }

    #[test]
    fn test_hierarchical_merging() {
        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "experiment:\n  main_trials: 12\n  trial_duration_ms: 5000\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "experiment:\n  main_trials: 20\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.experiment.main_trials, 20, "Override should win");
        assert_eq!(
            config.experiment.trial_duration_ms, 5000,
            "Base value should persist when not overridden"
        );
        assert_eq!(
            config.logging.level, "debug",
            "Override should win for nested fields"
        );
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.attention_check_questions.len(), 3);
    }
}
