//! Response sink port (trait) for the persistence/transport layer.
//!
//! The core commits a block to the session before handing it to a sink, so
//! implementations only move data; they never decide what was committed.

use crate::domain::models::{AttentionCheckResult, CommitReceipt, ResponseRecord};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Deliver the ordered records of one committed block
    ///
    /// # Errors
    /// Returns error if the transport fails. The block stays committed.
    async fn write_batch(&self, receipt: &CommitReceipt, records: &[ResponseRecord]) -> Result<()>;

    /// Deliver attention-check results committed with Phase 1
    async fn write_attention(
        &self,
        receipt: &CommitReceipt,
        results: &[AttentionCheckResult],
    ) -> Result<()>;
}
