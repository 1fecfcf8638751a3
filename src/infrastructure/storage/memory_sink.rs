//! In-memory response sink for tests and dry runs

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::domain::models::{AttentionCheckResult, CommitReceipt, ResponseRecord, SurveyPhase};
use crate::domain::ports::ResponseSink;

/// Keeps every delivered batch in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: RwLock<Vec<(CommitReceipt, Vec<ResponseRecord>)>>,
    attention: RwLock<Vec<AttentionCheckResult>>,
    fail: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects every delivery
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.set_failing(true);
        sink
    }

    /// Make later writes fail or succeed
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Receipts of every accepted batch
    pub async fn receipts(&self) -> Vec<CommitReceipt> {
        self.batches
            .read()
            .await
            .iter()
            .map(|(receipt, _)| receipt.clone())
            .collect()
    }

    /// Records delivered for one phase, in delivery order
    pub async fn records(&self, phase: SurveyPhase) -> Vec<ResponseRecord> {
        self.batches
            .read()
            .await
            .iter()
            .filter(|(receipt, _)| receipt.phase == phase)
            .flat_map(|(_, records)| records.iter().cloned())
            .collect()
    }

    pub async fn attention(&self) -> Vec<AttentionCheckResult> {
        self.attention.read().await.clone()
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("memory sink configured to fail");
        }
        Ok(())
    }
}

#[async_trait]
impl ResponseSink for MemorySink {
    async fn write_batch(&self, receipt: &CommitReceipt, records: &[ResponseRecord]) -> Result<()> {
        self.check()?;
        self.batches
            .write()
            .await
            .push((receipt.clone(), records.to_vec()));
        Ok(())
    }

    async fn write_attention(
        &self,
        _receipt: &CommitReceipt,
        results: &[AttentionCheckResult],
    ) -> Result<()> {
        self.check()?;
        self.attention.write().await.extend_from_slice(results);
        Ok(())
    }
}
