//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - Pretty or JSON console output on stderr
//! - Optional JSON log file with rotation via tracing-appender

pub mod logger;

pub use logger::{parse_log_level, LoggerImpl};
