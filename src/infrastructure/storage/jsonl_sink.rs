//! Append-only JSON Lines sink
//!
//! Each committed block becomes one `batch` line followed by one line per
//! record, written with a single append so a block is never interleaved
//! with another.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::models::{AttentionCheckResult, CommitReceipt, ResponseRecord};
use crate::domain::ports::ResponseSink;

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Line<'a> {
    Batch {
        receipt: &'a CommitReceipt,
    },
    Response {
        #[serde(flatten)]
        record: &'a ResponseRecord,
    },
    Attention {
        session_id: &'a str,
        #[serde(flatten)]
        result: &'a AttentionCheckResult,
    },
}

/// Writes committed blocks to a `.jsonl` file
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlSink {
    /// Open `path` for appending, creating parent directories if needed
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .context("failed to create output directory")?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("failed to open {}", path.display()))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, lines: &[Line<'_>]) -> Result<()> {
        let mut buf = Vec::new();
        for line in lines {
            serde_json::to_writer(&mut buf, line).context("failed to serialize record")?;
            buf.push(b'\n');
        }

        let mut file = self.file.lock().await;
        file.write_all(&buf)
            .await
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        file.flush().await.context("failed to flush output")?;
        Ok(())
    }
}

#[async_trait]
impl ResponseSink for JsonlSink {
    async fn write_batch(&self, receipt: &CommitReceipt, records: &[ResponseRecord]) -> Result<()> {
        let lines: Vec<Line<'_>> = std::iter::once(Line::Batch { receipt })
            .chain(records.iter().map(|record| Line::Response { record }))
            .collect();
        self.append(&lines).await?;
        debug!(
            phase = receipt.phase.as_str(),
            records = records.len(),
            path = %self.path.display(),
            "batch written"
        );
        Ok(())
    }

    async fn write_attention(
        &self,
        receipt: &CommitReceipt,
        results: &[AttentionCheckResult],
    ) -> Result<()> {
        let lines: Vec<Line<'_>> = results
            .iter()
            .map(|result| Line::Attention {
                session_id: &receipt.session_id,
                result,
            })
            .collect();
        self.append(&lines).await
    }
}
