//! risk-survey - two-phase adaptive risk-preference survey
//!
//! Participants choose between a lottery ("p% chance of R") and a sure
//! amount. Phase 1 presents a fixed grid of such choices; a power-utility
//! model `u(x) = x^alpha` is then fitted to those choices by maximum
//! likelihood, and Phase 2 presents trials whose sure amounts bracket the
//! participant's predicted indifference points.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors, and the clock and sink ports
//! - **Service Layer** (`services`): combination generation, sequencing, trial
//!   state machines, alpha estimation, Phase 2 generation
//! - **Application Layer** (`application`): session orchestration, the async
//!   trial driver, and simulated participants
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, sinks
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```no_run
//! use risk_survey::{run_session, Config, ExperimentSession, Pacing, SimulatedParticipant};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let mut session = ExperimentSession::start(Config::default(), None, Some(7))?;
//! let mut participant = SimulatedParticipant::new(0.6, 7);
//! let report = run_session(&mut session, &mut participant, Pacing::Virtual).await?;
//! println!("estimated alpha {:.2}", report.estimate.alpha);
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{
    run_session, ExperimentSession, Pacing, SimulatedParticipant, SimulationReport, TrialDriver,
    TrialHandle,
};
pub use domain::models::{
    AlphaEstimate, ChoiceRecord, Config, ResponseRecord, Session, SessionPhase, SurveyPhase,
    Timeline, TimelineItem, TrialResponse, TrialSpec,
};
pub use domain::ports::{Clock, ResponseSink};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{AlphaEstimator, CombinationGenerator, Phase2Generator, TimelineSequencer};
