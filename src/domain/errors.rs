//! Domain errors for the risk survey.

use thiserror::Error;

/// Domain-level errors that can occur while running a survey session.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Requested {requested} trials but only {available} unique conditions exist")]
    SamplingInsufficient { requested: usize, available: usize },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Attention question bank is empty")]
    EmptyQuestionBank,

    #[error("Operation not allowed in phase {phase}: {reason}")]
    PhaseOrder { phase: String, reason: String },
}

pub type DomainResult<T> = Result<T, DomainError>;
