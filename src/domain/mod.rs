//! Domain layer for the risk survey
//!
//! Trial, response, estimate and session models, the error type, and the
//! ports infrastructure adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
