//! Async driver running one trial against a live countdown.
//!
//! The renderer talks to the driver through a [`TrialHandle`]: inputs go in
//! over an mpsc channel, snapshots come out over a watch channel. The driver
//! races those inputs against the trial deadline with `tokio::select!`; the
//! first completion wins and ends the run, so a late input and the expiry can
//! never both produce a response.

use anyhow::{bail, Result};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, instrument};

use crate::domain::models::TrialResponse;
use crate::services::{InputOutcome, TrialExecution, TrialInput, TrialView};

/// Renderer refresh period for the countdown
const VIEW_REFRESH: Duration = Duration::from_secs(1);

/// Renderer side of a driver
#[derive(Debug, Clone)]
pub struct TrialHandle {
    input_tx: mpsc::Sender<TrialInput>,
    view_rx: watch::Receiver<Option<TrialView>>,
}

impl TrialHandle {
    /// Send an input. Returns false once the driver is gone.
    pub async fn send(&self, input: TrialInput) -> bool {
        self.input_tx.send(input).await.is_ok()
    }

    /// Latest snapshot of the running trial
    pub fn view(&self) -> Option<TrialView> {
        self.view_rx.borrow().clone()
    }

    /// Wait for the next snapshot
    pub async fn changed(&mut self) -> Option<TrialView> {
        self.view_rx.changed().await.ok()?;
        self.view()
    }
}

/// Runs trials one at a time
#[derive(Debug)]
pub struct TrialDriver {
    input_rx: mpsc::Receiver<TrialInput>,
    view_tx: watch::Sender<Option<TrialView>>,
}

impl TrialDriver {
    /// Create a driver and the handle a renderer uses to talk to it
    pub fn channel(buffer: usize) -> (Self, TrialHandle) {
        let (input_tx, input_rx) = mpsc::channel(buffer);
        let (view_tx, view_rx) = watch::channel(None);
        (
            Self { input_rx, view_tx },
            TrialHandle { input_tx, view_rx },
        )
    }

    /// Drive a trial until it completes or times out.
    ///
    /// Inputs left over from a previous trial are discarded first.
    #[instrument(skip(self, execution), fields(trial = %execution.spec().trial_number))]
    pub async fn run(&mut self, mut execution: TrialExecution) -> Result<TrialResponse> {
        while self.input_rx.try_recv().is_ok() {}

        let start = Instant::now();
        let deadline = execution.deadline().map(|d| start + d);
        let mut refresh = interval_at(start + VIEW_REFRESH, VIEW_REFRESH);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.publish(&execution, start);

        loop {
            tokio::select! {
                input = self.input_rx.recv() => {
                    let Some(input) = input else {
                        return self.drain_to_deadline(execution, start).await;
                    };
                    match execution.handle(input, start.elapsed()) {
                        InputOutcome::Completed(response) => {
                            self.publish(&execution, start);
                            return Ok(response);
                        }
                        InputOutcome::Applied => self.publish(&execution, start),
                        InputOutcome::Ignored => {}
                    }
                }
                () = wait_for(deadline) => {
                    if let Some(response) = execution.tick(start.elapsed()) {
                        debug!("deadline reached");
                        self.publish(&execution, start);
                        return Ok(response);
                    }
                }
                _ = refresh.tick() => self.publish(&execution, start),
            }
        }
    }

    /// The renderer hung up; only the deadline can still end the trial
    async fn drain_to_deadline(
        &self,
        mut execution: TrialExecution,
        start: Instant,
    ) -> Result<TrialResponse> {
        let Some(deadline) = execution.deadline() else {
            bail!(
                "input closed before untimed trial {} finished",
                execution.spec().trial_number
            );
        };
        sleep_until(start + deadline).await;
        match execution.tick(start.elapsed()) {
            Some(response) => Ok(response),
            None => bail!("trial {} did not expire", execution.spec().trial_number),
        }
    }

    fn publish(&self, execution: &TrialExecution, start: Instant) {
        self.view_tx.send_replace(Some(execution.view(start.elapsed())));
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
