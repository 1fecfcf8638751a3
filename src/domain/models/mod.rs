pub mod attention;
pub mod config;
pub mod estimate;
pub mod phase2;
pub mod response;
pub mod session;
pub mod trial;

pub use attention::{default_question_bank, AttentionCheckResult, AttentionQuestion, QuestionKind};
pub use config::{
    BarDimensions, BarSizes, Config, ExperimentConfig, FontSizes, LogFormat, LoggingConfig,
    Phase1Config, Phase2Config, RotationPolicy, SamplingPolicy,
};
pub use estimate::{AlphaEstimate, ChoiceRecord, ChoiceSummary, RiskProfile};
pub use phase2::Phase2TrialSpec;
pub use response::{Choice, ResponseRecord, SurveyPhase, TrialResponse};
pub use session::{CommitReceipt, CommittedBatch, Session, SessionPhase};
pub use trial::{
    AttentionCheckItem, BarSize, EvComparison, OptionKind, Phase2Link, ScreenSide, SizeCondition,
    Timeline, TimelineItem, TrialCondition, TrialNumber, TrialSpec,
};
