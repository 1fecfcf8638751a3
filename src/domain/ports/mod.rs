//! Port trait definitions (Hexagonal Architecture)
//!
//! - ResponseSink: persistence/transport of committed response batches
//! - Clock: wall-clock source for session identity

pub mod clock;
pub mod response_sink;

pub use clock::{Clock, FixedClock, SystemClock};
pub use response_sink::ResponseSink;
