//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML or JSON file loading
//! - Environment variable overrides
//! - Configuration validation

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
