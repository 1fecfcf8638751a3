//! Infrastructure layer module
//!
//! Adapters around the survey core:
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)
//! - Response sinks implementing the domain's `ResponseSink` port

pub mod config;
pub mod logging;
pub mod storage;
