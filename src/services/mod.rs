pub mod alpha_estimator;
pub mod attention_execution;
pub mod combination_generator;
pub mod phase2_generator;
pub mod timeline_sequencer;
pub mod trial_execution;

pub use alpha_estimator::AlphaEstimator;
pub use attention_execution::{AttentionExecution, AttentionOutcome};
pub use combination_generator::CombinationGenerator;
pub use phase2_generator::Phase2Generator;
pub use timeline_sequencer::TimelineSequencer;
pub use trial_execution::{InputOutcome, TrialExecution, TrialInput, TrialState, TrialView};
