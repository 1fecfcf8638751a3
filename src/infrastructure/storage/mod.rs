//! Response sink adapters

pub mod jsonl_sink;
pub mod memory_sink;

pub use jsonl_sink::JsonlSink;
pub use memory_sink::MemorySink;
