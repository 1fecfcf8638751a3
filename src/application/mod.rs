//! Application layer: session orchestration and the async trial driver

pub mod experiment_session;
pub mod simulated_participant;
pub mod simulation;
pub mod trial_driver;

pub use experiment_session::{Delivery, ExperimentSession, Phase1Outcome};
pub use simulated_participant::{PlannedChoice, SimulatedParticipant};
pub use simulation::{run_session, BlockStats, Pacing, SimulationReport};
pub use trial_driver::{TrialDriver, TrialHandle};
