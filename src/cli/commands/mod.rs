//! CLI command implementations.

pub mod estimate;
pub mod phase2;
pub mod simulate;
pub mod timeline;
